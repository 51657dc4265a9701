//! SeaORM store adapters.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{StoreKind, UserRecord};

use super::entities::{admin_user, candidate, employer};
use super::record_repository::RecordRepository;

fn wrong_kind(expected: StoreKind, actual: StoreKind) -> AppError {
    AppError::internal(format!("{} store was handed a {} record", expected, actual))
}

/// An update that touched no row means the record is gone.
fn update_error(err: DbErr) -> AppError {
    match err {
        DbErr::RecordNotUpdated => AppError::NotFound,
        other => AppError::from(other),
    }
}

// =============================================================================
// Candidates
// =============================================================================

pub struct CandidateStore {
    db: DatabaseConnection,
}

impl CandidateStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordRepository for CandidateStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let model = candidate::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(|m| UserRecord::Candidate(m.into())))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let model = candidate::Entity::find()
            .filter(candidate::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(|m| UserRecord::Candidate(m.into())))
    }

    async fn insert(&self, record: UserRecord) -> AppResult<UserRecord> {
        let kind = record.kind();
        let UserRecord::Candidate(record) = record else {
            return Err(wrong_kind(StoreKind::Candidate, kind));
        };
        let model = candidate::active_model(&record, Uuid::new_v4())
            .insert(&self.db)
            .await?;
        Ok(UserRecord::Candidate(model.into()))
    }

    async fn update(&self, record: UserRecord) -> AppResult<UserRecord> {
        let kind = record.kind();
        let UserRecord::Candidate(record) = record else {
            return Err(wrong_kind(StoreKind::Candidate, kind));
        };
        let model = candidate::active_model(&record, record.id)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(UserRecord::Candidate(model.into()))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = candidate::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        let models = candidate::Entity::find()
            .order_by_asc(candidate::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| UserRecord::Candidate(m.into()))
            .collect())
    }

    async fn list_migrating(&self) -> AppResult<Vec<UserRecord>> {
        let models = candidate::Entity::find()
            .filter(candidate::Column::MigratingFrom.is_not_null())
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| UserRecord::Candidate(m.into()))
            .collect())
    }
}

// =============================================================================
// Employers
// =============================================================================

pub struct EmployerStore {
    db: DatabaseConnection,
}

impl EmployerStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordRepository for EmployerStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let model = employer::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(|m| UserRecord::Employer(m.into())))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let model = employer::Entity::find()
            .filter(employer::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(|m| UserRecord::Employer(m.into())))
    }

    async fn insert(&self, record: UserRecord) -> AppResult<UserRecord> {
        let kind = record.kind();
        let UserRecord::Employer(record) = record else {
            return Err(wrong_kind(StoreKind::Employer, kind));
        };
        let model = employer::active_model(&record, Uuid::new_v4())
            .insert(&self.db)
            .await?;
        Ok(UserRecord::Employer(model.into()))
    }

    async fn update(&self, record: UserRecord) -> AppResult<UserRecord> {
        let kind = record.kind();
        let UserRecord::Employer(record) = record else {
            return Err(wrong_kind(StoreKind::Employer, kind));
        };
        let model = employer::active_model(&record, record.id)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(UserRecord::Employer(model.into()))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = employer::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        let models = employer::Entity::find()
            .order_by_asc(employer::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| UserRecord::Employer(m.into()))
            .collect())
    }

    async fn list_migrating(&self) -> AppResult<Vec<UserRecord>> {
        let models = employer::Entity::find()
            .filter(employer::Column::MigratingFrom.is_not_null())
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| UserRecord::Employer(m.into()))
            .collect())
    }
}

// =============================================================================
// Admin users
// =============================================================================

pub struct AdminUserStore {
    db: DatabaseConnection,
}

impl AdminUserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordRepository for AdminUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let model = admin_user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(|m| UserRecord::Admin(m.into())))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let model = admin_user::Entity::find()
            .filter(admin_user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(|m| UserRecord::Admin(m.into())))
    }

    async fn insert(&self, record: UserRecord) -> AppResult<UserRecord> {
        let kind = record.kind();
        let UserRecord::Admin(record) = record else {
            return Err(wrong_kind(StoreKind::Admin, kind));
        };
        let model = admin_user::active_model(&record, Uuid::new_v4())
            .insert(&self.db)
            .await?;
        Ok(UserRecord::Admin(model.into()))
    }

    async fn update(&self, record: UserRecord) -> AppResult<UserRecord> {
        let kind = record.kind();
        let UserRecord::Admin(record) = record else {
            return Err(wrong_kind(StoreKind::Admin, kind));
        };
        let model = admin_user::active_model(&record, record.id)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(UserRecord::Admin(model.into()))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = admin_user::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self) -> AppResult<Vec<UserRecord>> {
        let models = admin_user::Entity::find()
            .order_by_asc(admin_user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| UserRecord::Admin(m.into()))
            .collect())
    }

    async fn list_migrating(&self) -> AppResult<Vec<UserRecord>> {
        let models = admin_user::Entity::find()
            .filter(admin_user::Column::MigratingFrom.is_not_null())
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| UserRecord::Admin(m.into()))
            .collect())
    }
}
