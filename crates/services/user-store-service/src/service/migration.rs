//! Migration engine: moves an identity between stores when its role
//! changes kind.
//!
//! The sequence is fetch, build, write destination (marked with its
//! source id), delete source, clear marker. A crash or failed delete after
//! the write leaves a duplicate rather than losing data; the marker lets
//! `reconcile` finish the job later.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{canonical_role, RawUpdate, StoreKind, UploadedFiles, UserRecord};

use super::builder::RecordParts;
use super::directory::IdentityDirectory;
use super::locks::IdentityLocks;

/// A request to move `id` into the store matching `new_role`.
#[derive(Debug, Clone)]
pub struct MigrateRequest {
    pub id: Uuid,
    pub current_kind: StoreKind,
    pub new_role: String,
    pub fields: RawUpdate,
    pub uploaded_files: UploadedFiles,
}

/// Outcome of an update that may or may not have changed store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateResult {
    pub migrated: bool,
    /// Target kind if migrated, else the current kind
    pub kind: StoreKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_id: Option<Uuid>,
    pub record: UserRecord,
}

impl MigrateResult {
    pub fn unchanged(record: UserRecord) -> Self {
        Self {
            migrated: false,
            kind: record.kind(),
            new_id: None,
            record,
        }
    }
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Marked records old enough to act on
    pub scanned: usize,
    pub sources_retired: usize,
    pub markers_cleared: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct MigrationEngine {
    directory: IdentityDirectory,
    locks: IdentityLocks,
}

impl MigrationEngine {
    pub fn new(directory: IdentityDirectory, locks: IdentityLocks) -> Self {
        Self { directory, locks }
    }

    /// The store `new_role` requires, if it differs from `current`.
    pub fn target_kind(current: StoreKind, new_role: &str) -> Option<StoreKind> {
        let target = StoreKind::classify(new_role);
        (target != current).then_some(target)
    }

    /// Migrate when the role implies another store; otherwise return the
    /// current record untouched.
    pub async fn migrate(&self, request: MigrateRequest) -> AppResult<MigrateResult> {
        let _guard = self.locks.acquire(request.id).await;

        let current = self
            .directory
            .fetch(request.current_kind, request.id)
            .await?;

        match Self::target_kind(request.current_kind, &request.new_role) {
            Some(target) => {
                self.transition(
                    current,
                    target,
                    &request.new_role,
                    &request.fields,
                    &request.uploaded_files,
                )
                .await
            }
            None => Ok(MigrateResult::unchanged(current)),
        }
    }

    /// Move `current` into the `target` store. The caller holds the lock
    /// for `current`'s id.
    pub(crate) async fn transition(
        &self,
        current: UserRecord,
        target: StoreKind,
        new_role: &str,
        fields: &RawUpdate,
        uploads: &UploadedFiles,
    ) -> AppResult<MigrateResult> {
        let source_kind = current.kind();
        let source_id = current.id();

        let mut parts = RecordParts::from_record(&current);
        parts.apply_scalars(fields)?;
        parts.account.role = canonical_role(new_role);
        parts.replace_nested(fields);
        parts.migrating_from = Some(source_id);
        let draft = parts.into_record(target, Uuid::nil(), uploads);

        self.directory
            .ensure_email_available(&draft.account().email, Some(source_id))
            .await?;

        let mut inserted = self.directory.store(target).insert(draft).await?;
        let new_id = inserted.id();

        match self.directory.store(source_kind).delete_by_id(source_id).await {
            Ok(true) => {}
            Ok(false) => {
                // Someone else retired the source first; undo our copy.
                warn!(
                    "Source {} {} vanished during migration, removing {} {}",
                    source_kind, source_id, target, new_id
                );
                if let Err(e) = self.directory.store(target).delete_by_id(new_id).await {
                    error!(
                        "Failed to remove duplicate {} {} after concurrent migration: {}",
                        target, new_id, e
                    );
                }
                return Err(AppError::conflict(format!(
                    "Record {} was changed by a concurrent request",
                    source_id
                )));
            }
            Err(e) => {
                error!(
                    "Partial migration {} {} -> {} {}: source delete failed: {}",
                    source_kind, source_id, target, new_id, e
                );
                return Err(AppError::PartialMigration {
                    source_kind,
                    source_id,
                    target_kind: target,
                    new_id,
                });
            }
        }

        inserted.set_migrating_from(None);
        let record = match self.directory.store(target).update(inserted.clone()).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Migrated {} {} but could not clear its marker: {}",
                    target, new_id, e
                );
                inserted.set_migrating_from(Some(source_id));
                inserted
            }
        };

        info!(
            "Migrated {} {} to {} {}",
            source_kind, source_id, target, new_id
        );

        Ok(MigrateResult {
            migrated: true,
            kind: target,
            new_id: Some(new_id),
            record,
        })
    }

    /// Finish migrations whose marker is older than `grace`.
    ///
    /// A surviving source is deleted, then the marker is cleared. Failures
    /// are logged and counted; the pass carries on with the next record.
    pub async fn reconcile(&self, grace: Duration) -> AppResult<ReconcileReport> {
        let cutoff = Utc::now() - grace;
        let mut report = ReconcileReport::default();

        for kind in StoreKind::PROBE_ORDER {
            let marked = self.directory.store(kind).list_migrating().await?;
            for record in marked {
                let Some(source_id) = record.migrating_from() else {
                    continue;
                };
                if record.updated_at() > cutoff {
                    continue;
                }

                report.scanned += 1;
                warn!(
                    "Stale migration marker on {} {} (source {})",
                    kind,
                    record.id(),
                    source_id
                );

                match self.settle(kind, record.id(), source_id).await {
                    Ok(Some(retired)) => {
                        if retired {
                            report.sources_retired += 1;
                        }
                        report.markers_cleared += 1;
                    }
                    Ok(None) => debug!("Marker on {} {} already settled", kind, record.id()),
                    Err(e) => {
                        error!("Failed to reconcile marker from {}: {}", source_id, e);
                        report.failed += 1;
                    }
                }
            }
        }

        info!(
            "Reconciliation done: {} scanned, {} sources retired, {} markers cleared, {} failed",
            report.scanned, report.sources_retired, report.markers_cleared, report.failed
        );
        Ok(report)
    }

    /// Delete the marked source wherever it still lives, then clear the marker.
    ///
    /// Holds the source lock, then the destination lock. The destination is
    /// read again under the lock so the marker is cleared on the stored
    /// copy, never on the snapshot the scan listed. `None` means another
    /// writer settled or removed the record first.
    async fn settle(
        &self,
        kind: StoreKind,
        id: Uuid,
        source_id: Uuid,
    ) -> AppResult<Option<bool>> {
        let _source = self.locks.acquire(source_id).await;
        let _destination = self.locks.acquire(id).await;

        let store = self.directory.store(kind);
        let marked = |record: &UserRecord| record.migrating_from() == Some(source_id);
        match store.find_by_id(id).await? {
            Some(record) if marked(&record) => {}
            _ => return Ok(None),
        }

        let mut retired = false;
        for other in StoreKind::PROBE_ORDER {
            if other == kind {
                continue;
            }
            if self.directory.store(other).delete_by_id(source_id).await? {
                info!("Retired leftover source {} {}", other, source_id);
                retired = true;
            }
        }

        let Some(mut record) = store.find_by_id(id).await? else {
            return Ok(None);
        };
        if !marked(&record) {
            return Ok(Some(retired));
        }
        record.set_migrating_from(None);
        store.update(record).await?;
        Ok(Some(retired))
    }
}
