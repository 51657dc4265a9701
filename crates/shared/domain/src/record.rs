//! The three record schemas and the `UserRecord` sum type.
//!
//! Each logical user lives in exactly one store. The variant of
//! `UserRecord` is that store; only a migration changes it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::kind::StoreKind;

/// Review state of an uploaded document or certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approve,
    Reject,
}

impl ReviewStatus {
    /// Lenient parse used by the normalizer; unknown values fall back to Pending.
    pub fn parse_or_pending(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    /// Strict parse used by review operations.
    pub fn parse(value: &str) -> DomainResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReviewStatus::Pending),
            "approve" | "approved" => Ok(ReviewStatus::Approve),
            "reject" | "rejected" => Ok(ReviewStatus::Reject),
            _ => Err(DomainError::UnknownReviewStatus(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "Pending",
            ReviewStatus::Approve => "Approve",
            ReviewStatus::Reject => "Reject",
        }
    }
}

/// Identity, credential and lifecycle fields shared by every store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub blocked: bool,
    pub deleted: bool,
    pub email_verified: bool,
    pub verification_status: String,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub verification_token_expires_at: Option<DateTime<Utc>>,
}

/// Profile fields shared by every store. Empty string means "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub phone: String,
    pub gender: String,
    pub date_of_birth: Option<NaiveDate>,
    pub summary: String,
}

/// Identity document and profile image slots of candidates and employers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Documents {
    pub identity_document: Option<String>,
    pub identity_document_status: ReviewStatus,
    pub profile_image: Option<String>,
}

/// One education entry. `id` is a stable key, independent of position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: Uuid,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub years: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyExperience {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub years: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub account: Account,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(flatten)]
    pub documents: Documents,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrating_from: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub account: Account,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(flatten)]
    pub documents: Documents,
    pub skills: Vec<String>,
    pub company_experience: Vec<CompanyExperience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrating_from: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub account: Account,
    #[serde(flatten)]
    pub profile: Profile,
    pub profile_image: Option<String>,
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrating_from: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user record in whichever store currently holds it.
///
/// Serializes with a `kind` tag; credential and token fields are never
/// serialized, so this doubles as the client-facing record view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum UserRecord {
    Candidate(CandidateRecord),
    Employer(EmployerRecord),
    Admin(AdminUserRecord),
}

impl UserRecord {
    pub fn kind(&self) -> StoreKind {
        match self {
            UserRecord::Candidate(_) => StoreKind::Candidate,
            UserRecord::Employer(_) => StoreKind::Employer,
            UserRecord::Admin(_) => StoreKind::Admin,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            UserRecord::Candidate(r) => r.id,
            UserRecord::Employer(r) => r.id,
            UserRecord::Admin(r) => r.id,
        }
    }

    pub fn account(&self) -> &Account {
        match self {
            UserRecord::Candidate(r) => &r.account,
            UserRecord::Employer(r) => &r.account,
            UserRecord::Admin(r) => &r.account,
        }
    }

    pub fn account_mut(&mut self) -> &mut Account {
        match self {
            UserRecord::Candidate(r) => &mut r.account,
            UserRecord::Employer(r) => &mut r.account,
            UserRecord::Admin(r) => &mut r.account,
        }
    }

    pub fn profile(&self) -> &Profile {
        match self {
            UserRecord::Candidate(r) => &r.profile,
            UserRecord::Employer(r) => &r.profile,
            UserRecord::Admin(r) => &r.profile,
        }
    }

    /// Document slots; `None` for admin records.
    pub fn documents(&self) -> Option<&Documents> {
        match self {
            UserRecord::Candidate(r) => Some(&r.documents),
            UserRecord::Employer(r) => Some(&r.documents),
            UserRecord::Admin(_) => None,
        }
    }

    pub fn documents_mut(&mut self) -> DomainResult<&mut Documents> {
        match self {
            UserRecord::Candidate(r) => Ok(&mut r.documents),
            UserRecord::Employer(r) => Ok(&mut r.documents),
            UserRecord::Admin(_) => Err(DomainError::NotApplicable {
                kind: StoreKind::Admin,
                field: "identity document",
            }),
        }
    }

    pub fn profile_image(&self) -> Option<&str> {
        match self {
            UserRecord::Candidate(r) => r.documents.profile_image.as_deref(),
            UserRecord::Employer(r) => r.documents.profile_image.as_deref(),
            UserRecord::Admin(r) => r.profile_image.as_deref(),
        }
    }

    pub fn migrating_from(&self) -> Option<Uuid> {
        match self {
            UserRecord::Candidate(r) => r.migrating_from,
            UserRecord::Employer(r) => r.migrating_from,
            UserRecord::Admin(r) => r.migrating_from,
        }
    }

    pub fn set_migrating_from(&mut self, source: Option<Uuid>) {
        match self {
            UserRecord::Candidate(r) => r.migrating_from = source,
            UserRecord::Employer(r) => r.migrating_from = source,
            UserRecord::Admin(r) => r.migrating_from = source,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            UserRecord::Candidate(r) => r.created_at,
            UserRecord::Employer(r) => r.created_at,
            UserRecord::Admin(r) => r.created_at,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            UserRecord::Candidate(r) => r.updated_at,
            UserRecord::Employer(r) => r.updated_at,
            UserRecord::Admin(r) => r.updated_at,
        }
    }

    /// Bump `updated_at` after a mutation.
    pub fn touch(&mut self) {
        let now = Utc::now();
        match self {
            UserRecord::Candidate(r) => r.updated_at = now,
            UserRecord::Employer(r) => r.updated_at = now,
            UserRecord::Admin(r) => r.updated_at = now,
        }
    }

    /// Set a review status on a candidate's education entry, by entry id.
    pub fn review_education(&mut self, entry_id: Uuid, status: ReviewStatus) -> DomainResult<()> {
        let kind = self.kind();
        let UserRecord::Candidate(candidate) = self else {
            return Err(DomainError::NotApplicable {
                kind,
                field: "education",
            });
        };

        let entry = candidate
            .education
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| DomainError::validation(format!("No education entry {}", entry_id)))?;
        entry.status = status;
        Ok(())
    }
}

impl From<CandidateRecord> for UserRecord {
    fn from(record: CandidateRecord) -> Self {
        UserRecord::Candidate(record)
    }
}

impl From<EmployerRecord> for UserRecord {
    fn from(record: EmployerRecord) -> Self {
        UserRecord::Employer(record)
    }
}

impl From<AdminUserRecord> for UserRecord {
    fn from(record: AdminUserRecord) -> Self {
        UserRecord::Admin(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            email: "a@x.com".to_string(),
            password_hash: "secret-hash".to_string(),
            role: "CANDIDATE".to_string(),
            blocked: false,
            deleted: false,
            email_verified: true,
            verification_status: "verified".to_string(),
            verification_token: Some("token".to_string()),
            verification_token_expires_at: None,
        }
    }

    fn candidate() -> CandidateRecord {
        CandidateRecord {
            id: Uuid::new_v4(),
            account: account(),
            profile: Profile::default(),
            documents: Documents::default(),
            education: vec![Education {
                id: Uuid::new_v4(),
                degree: "BSc".to_string(),
                institution: "MIT".to_string(),
                year: "2020".to_string(),
                certificate: None,
                status: ReviewStatus::Pending,
            }],
            experience: vec![],
            migrating_from: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_serialized_view_hides_credentials() {
        let json = serde_json::to_value(UserRecord::from(candidate())).unwrap();
        assert_eq!(json["kind"], "CANDIDATE");
        assert_eq!(json["email"], "a@x.com");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("verificationToken").is_none());
    }

    #[test]
    fn test_review_education_by_entry_id() {
        let record = candidate();
        let entry_id = record.education[0].id;
        let mut record = UserRecord::from(record);

        record.review_education(entry_id, ReviewStatus::Approve).unwrap();

        let UserRecord::Candidate(candidate) = record else {
            panic!("kind changed");
        };
        assert_eq!(candidate.education[0].status, ReviewStatus::Approve);
    }

    #[test]
    fn test_review_education_unknown_entry() {
        let mut record = UserRecord::from(candidate());
        let result = record.review_education(Uuid::new_v4(), ReviewStatus::Reject);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_review_status_parse() {
        assert_eq!(ReviewStatus::parse("approved").unwrap(), ReviewStatus::Approve);
        assert_eq!(ReviewStatus::parse_or_pending("bogus"), ReviewStatus::Pending);
        assert!(ReviewStatus::parse("bogus").is_err());
    }
}
