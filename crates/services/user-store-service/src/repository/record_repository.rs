//! Store adapter contract and the per-kind store registry.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::AppResult;
use domain::{StoreKind, UserRecord};

use super::stores::{AdminUserStore, CandidateStore, EmployerStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// One store holding records of a single kind.
///
/// Adapters only ever see records of their own kind; handing one a record
/// of another kind is an internal error.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Insert as a brand-new record. The store assigns the id; the id
    /// carried by `record` is ignored.
    async fn insert(&self, record: UserRecord) -> AppResult<UserRecord>;

    /// Overwrite an existing record by id. `NotFound` if it is gone.
    async fn update(&self, record: UserRecord) -> AppResult<UserRecord>;

    /// Hard delete. `Ok(false)` when no row was removed.
    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool>;

    async fn list(&self) -> AppResult<Vec<UserRecord>>;

    /// Records still carrying a migration marker.
    async fn list_migrating(&self) -> AppResult<Vec<UserRecord>>;
}

/// Access to the three stores by kind.
pub trait RecordStores: Send + Sync {
    fn store(&self, kind: StoreKind) -> Arc<dyn RecordRepository>;
}

/// Database-backed store registry.
pub struct Persistence {
    candidates: Arc<dyn RecordRepository>,
    employers: Arc<dyn RecordRepository>,
    admins: Arc<dyn RecordRepository>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            candidates: Arc::new(CandidateStore::new(db.clone())),
            employers: Arc::new(EmployerStore::new(db.clone())),
            admins: Arc::new(AdminUserStore::new(db)),
        }
    }
}

impl RecordStores for Persistence {
    fn store(&self, kind: StoreKind) -> Arc<dyn RecordRepository> {
        match kind {
            StoreKind::Candidate => self.candidates.clone(),
            StoreKind::Employer => self.employers.clone(),
            StoreKind::Admin => self.admins.clone(),
        }
    }
}
