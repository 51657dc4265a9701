//! SeaORM entities, one table per store.
//!
//! Nested lists live in `jsonb` columns and are decoded leniently: a row
//! whose JSON does not match the current entry shape reads as an empty list.

pub mod admin_user;
pub mod candidate;
pub mod employer;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::prelude::Json;
use serde::{de::DeserializeOwned, Serialize};

use domain::{Account, Profile};

pub(crate) fn to_json<T: Serialize>(items: &[T]) -> Json {
    serde_json::to_value(items).unwrap_or_else(|_| Json::Array(Vec::new()))
}

pub(crate) fn from_json<T: DeserializeOwned>(value: Json) -> Vec<T> {
    serde_json::from_value(value).unwrap_or_default()
}

/// Account and profile columns, as stored by every table.
pub(crate) struct CommonColumns {
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub phone: String,
    pub gender: String,
    pub date_of_birth: Option<NaiveDate>,
    pub summary: String,
    pub blocked: bool,
    pub deleted: bool,
    pub email_verified: bool,
    pub verification_status: String,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
}

impl CommonColumns {
    pub fn from_parts(account: &Account, profile: &Profile) -> Self {
        Self {
            email: account.email.clone(),
            password_hash: account.password_hash.clone(),
            role: account.role.clone(),
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            gender: profile.gender.clone(),
            date_of_birth: profile.date_of_birth,
            summary: profile.summary.clone(),
            blocked: account.blocked,
            deleted: account.deleted,
            email_verified: account.email_verified,
            verification_status: account.verification_status.clone(),
            verification_token: account.verification_token.clone(),
            verification_token_expires_at: account.verification_token_expires_at,
        }
    }

    pub fn into_parts(self) -> (Account, Profile) {
        (
            Account {
                email: self.email,
                password_hash: self.password_hash,
                role: self.role,
                blocked: self.blocked,
                deleted: self.deleted,
                email_verified: self.email_verified,
                verification_status: self.verification_status,
                verification_token: self.verification_token,
                verification_token_expires_at: self.verification_token_expires_at,
            },
            Profile {
                name: self.name,
                phone: self.phone,
                gender: self.gender,
                date_of_birth: self.date_of_birth,
                summary: self.summary,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Education;

    #[test]
    fn test_from_json_degrades_to_empty() {
        let entries: Vec<Education> = from_json(serde_json::json!({"not": "a list"}));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_skills_column_round_trip() {
        let skills = vec!["SQL".to_string(), "Rust".to_string()];
        let decoded: Vec<String> = from_json(to_json(&skills));
        assert_eq!(decoded, skills);
    }
}
