//! Identity directory: typed reads scoped to one store, plus probing.

use std::sync::Arc;

use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{StoreKind, UserRecord};

use crate::repository::{RecordRepository, RecordStores};

#[derive(Clone)]
pub struct IdentityDirectory {
    stores: Arc<dyn RecordStores>,
}

impl IdentityDirectory {
    pub fn new(stores: Arc<dyn RecordStores>) -> Self {
        Self { stores }
    }

    pub fn store(&self, kind: StoreKind) -> Arc<dyn RecordRepository> {
        self.stores.store(kind)
    }

    /// Read `id` from the store of `kind`.
    pub async fn fetch(&self, kind: StoreKind, id: Uuid) -> AppResult<UserRecord> {
        self.store(kind)
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Find `id` when its kind is unknown: candidate, then employer, then admin.
    pub async fn probe(&self, id: Uuid) -> AppResult<UserRecord> {
        for kind in StoreKind::PROBE_ORDER {
            if let Some(record) = self.store(kind).find_by_id(id).await? {
                return Ok(record);
            }
        }
        Err(AppError::NotFound)
    }

    /// The record owning `email` in any store, skipping `except`.
    pub async fn email_owner(&self, email: &str, except: Option<Uuid>) -> AppResult<Option<UserRecord>> {
        for kind in StoreKind::PROBE_ORDER {
            if let Some(record) = self.store(kind).find_by_email(email).await? {
                if Some(record.id()) != except {
                    return Ok(Some(record));
                }
            }
        }
        Ok(None)
    }

    /// Fail with `Conflict` if another identity already uses `email`.
    pub async fn ensure_email_available(&self, email: &str, except: Option<Uuid>) -> AppResult<()> {
        match self.email_owner(email, except).await? {
            Some(_) => Err(AppError::conflict(format!("Email {} is already in use", email))),
            None => Ok(()),
        }
    }
}
