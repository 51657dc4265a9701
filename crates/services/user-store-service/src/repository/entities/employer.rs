//! `employers` table.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use domain::{Documents, EmployerRecord, ReviewStatus};

use super::{from_json, to_json, CommonColumns};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "employers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub phone: String,
    pub gender: String,
    pub date_of_birth: Option<Date>,
    #[sea_orm(column_type = "Text")]
    pub summary: String,
    pub blocked: bool,
    pub deleted: bool,
    pub email_verified: bool,
    pub verification_status: String,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTimeUtc>,
    pub identity_document: Option<String>,
    pub identity_document_status: String,
    pub profile_image: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub skills: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub company_experience: Json,
    pub migrating_from: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EmployerRecord {
    fn from(model: Model) -> Self {
        let (account, profile) = CommonColumns {
            email: model.email,
            password_hash: model.password_hash,
            role: model.role,
            name: model.name,
            phone: model.phone,
            gender: model.gender,
            date_of_birth: model.date_of_birth,
            summary: model.summary,
            blocked: model.blocked,
            deleted: model.deleted,
            email_verified: model.email_verified,
            verification_status: model.verification_status,
            verification_token: model.verification_token,
            verification_token_expires_at: model.verification_token_expires_at,
        }
        .into_parts();

        EmployerRecord {
            id: model.id,
            account,
            profile,
            documents: Documents {
                identity_document: model.identity_document,
                identity_document_status: ReviewStatus::parse_or_pending(
                    &model.identity_document_status,
                ),
                profile_image: model.profile_image,
            },
            skills: from_json(model.skills),
            company_experience: from_json(model.company_experience),
            migrating_from: model.migrating_from,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Every column set from `record`, keyed by `id`.
pub fn active_model(record: &EmployerRecord, id: Uuid) -> ActiveModel {
    let common = CommonColumns::from_parts(&record.account, &record.profile);
    ActiveModel {
        id: Set(id),
        email: Set(common.email),
        password_hash: Set(common.password_hash),
        role: Set(common.role),
        name: Set(common.name),
        phone: Set(common.phone),
        gender: Set(common.gender),
        date_of_birth: Set(common.date_of_birth),
        summary: Set(common.summary),
        blocked: Set(common.blocked),
        deleted: Set(common.deleted),
        email_verified: Set(common.email_verified),
        verification_status: Set(common.verification_status),
        verification_token: Set(common.verification_token),
        verification_token_expires_at: Set(common.verification_token_expires_at),
        identity_document: Set(record.documents.identity_document.clone()),
        identity_document_status: Set(record.documents.identity_document_status.as_str().to_string()),
        profile_image: Set(record.documents.profile_image.clone()),
        skills: Set(to_json(&record.skills)),
        company_experience: Set(to_json(&record.company_experience)),
        migrating_from: Set(record.migrating_from),
        created_at: Set(record.created_at),
        updated_at: Set(record.updated_at),
    }
}
