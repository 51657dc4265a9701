//! Store-scoped record operations.
//!
//! Updates that change a record's store kind are handed to the migration
//! engine; everything else is an in-place write to the current store.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{
    is_known_role, FieldPatch, RawUpdate, ReviewStatus, StoreKind, UploadedFiles, UserRecord,
    DEFAULT_CANDIDATE_ROLE, FIELD_EMAIL, FIELD_PASSWORD,
};

use super::builder::RecordParts;
use super::directory::IdentityDirectory;
use super::locks::IdentityLocks;
use super::migration::{MigrateResult, MigrationEngine};
use crate::repository::RecordStores;

pub struct RecordService {
    directory: IdentityDirectory,
    engine: MigrationEngine,
    locks: IdentityLocks,
}

impl RecordService {
    pub fn new(stores: Arc<dyn RecordStores>) -> Self {
        let directory = IdentityDirectory::new(stores);
        let locks = IdentityLocks::new();
        let engine = MigrationEngine::new(directory.clone(), locks.clone());
        Self {
            directory,
            engine,
            locks,
        }
    }

    pub fn engine(&self) -> &MigrationEngine {
        &self.engine
    }

    /// Identities with a write in flight
    pub fn locked_identities(&self) -> usize {
        self.locks.active()
    }

    /// Create a record in the store its role selects.
    ///
    /// Email and password are required and the email must not be used by
    /// any identity in any store.
    pub async fn create(&self, fields: RawUpdate, uploads: UploadedFiles) -> AppResult<UserRecord> {
        let role = fields
            .role()
            .unwrap_or_else(|| DEFAULT_CANDIDATE_ROLE.to_string());
        let kind = classify_logged(&role);

        if !matches!(fields.text(FIELD_EMAIL), FieldPatch::Set(_)) {
            return Err(AppError::validation("Email is required"));
        }
        if !matches!(fields.text(FIELD_PASSWORD), FieldPatch::Set(_)) {
            return Err(AppError::validation("Password is required"));
        }

        let mut parts = RecordParts::blank(&role);
        parts.apply_scalars(&fields)?;
        parts.replace_nested(&fields);

        self.directory
            .ensure_email_available(&parts.account.email, None)
            .await?;

        let draft = parts.into_record(kind, Uuid::nil(), &uploads);
        let record = self.directory.store(kind).insert(draft).await?;

        info!("Created {} {}", kind, record.id());
        Ok(record)
    }

    /// Look up `id` in whichever store holds it.
    pub async fn get(&self, id: Uuid) -> AppResult<UserRecord> {
        self.directory.probe(id).await
    }

    pub async fn get_in(&self, kind: StoreKind, id: Uuid) -> AppResult<UserRecord> {
        self.directory.fetch(kind, id).await
    }

    pub async fn list(&self, kind: StoreKind) -> AppResult<Vec<UserRecord>> {
        self.directory.store(kind).list().await
    }

    /// Apply an update to the record `id` of `kind`.
    ///
    /// A role of another kind migrates the record and the result carries
    /// its new id; anything else updates in place.
    pub async fn update(
        &self,
        kind: StoreKind,
        id: Uuid,
        fields: RawUpdate,
        uploads: UploadedFiles,
    ) -> AppResult<MigrateResult> {
        let _guard = self.locks.acquire(id).await;
        let current = self.directory.fetch(kind, id).await?;

        if let Some(role) = fields.role() {
            let target = classify_logged(&role);
            if target != kind {
                return self
                    .engine
                    .transition(current, target, &role, &fields, &uploads)
                    .await;
            }
        }

        let mut parts = RecordParts::from_record(&current);
        parts.apply_scalars(&fields)?;
        parts.merge_nested(&fields);

        if parts.account.email != current.account().email {
            self.directory
                .ensure_email_available(&parts.account.email, Some(id))
                .await?;
        }

        let record = parts.into_record(kind, id, &uploads);
        let record = self.directory.store(kind).update(record).await?;
        Ok(MigrateResult::unchanged(record))
    }

    /// Flag the record as deleted without removing it.
    pub async fn soft_delete(&self, kind: StoreKind, id: Uuid) -> AppResult<UserRecord> {
        let _guard = self.locks.acquire(id).await;
        let mut record = self.directory.fetch(kind, id).await?;

        record.account_mut().deleted = true;
        record.touch();
        let record = self.directory.store(kind).update(record).await?;

        info!("Soft-deleted {} {}", kind, id);
        Ok(record)
    }

    pub async fn review_identity_document(
        &self,
        kind: StoreKind,
        id: Uuid,
        status: &str,
    ) -> AppResult<UserRecord> {
        let status = ReviewStatus::parse(status)?;
        let _guard = self.locks.acquire(id).await;
        let mut record = self.directory.fetch(kind, id).await?;

        let documents = record.documents_mut()?;
        if documents.identity_document.is_none() {
            return Err(AppError::validation("No identity document to review"));
        }
        documents.identity_document_status = status;
        record.touch();

        self.directory.store(kind).update(record).await
    }

    /// Review one education entry of a candidate, addressed by entry id.
    pub async fn review_education(
        &self,
        id: Uuid,
        entry_id: Uuid,
        status: &str,
    ) -> AppResult<UserRecord> {
        let status = ReviewStatus::parse(status)?;
        let _guard = self.locks.acquire(id).await;
        let mut record = self.directory.fetch(StoreKind::Candidate, id).await?;

        record.review_education(entry_id, status)?;
        record.touch();

        self.directory.store(StoreKind::Candidate).update(record).await
    }
}

fn classify_logged(role: &str) -> StoreKind {
    if !is_known_role(role) {
        warn!("Unrecognized role {:?}, treating as candidate", role);
    }
    StoreKind::classify(role)
}
