//! Upload store: writes file parts to disk once and hands back
//! root-relative references.
//!
//! File parts are buffered as [`PendingUpload`]s while the request is
//! parsed and only written once the caller has been authorized.

use std::path::PathBuf;

use axum::body::Bytes;
use tracing::warn;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{FileRef, UploadedFiles, UPLOAD_SLOTS};

const MAX_FILE_NAME_LEN: usize = 100;

/// A file part read from the request but not yet on disk.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub slot: String,
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` under `<root>/<slot>/<uuid>-<name>`.
    pub async fn save(&self, slot: &str, file_name: Option<&str>, bytes: &[u8]) -> AppResult<FileRef> {
        if !UPLOAD_SLOTS.contains(&slot) {
            return Err(AppError::bad_request(format!("Unknown upload slot {}", slot)));
        }

        let dir = self.root.join(slot);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create {}: {}", dir.display(), e)))?;

        let path = dir.join(format!(
            "{}-{}",
            Uuid::new_v4(),
            sanitize_file_name(file_name.unwrap_or_default())
        ));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::internal(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(FileRef::under_root(&self.root, &path)?)
    }

    /// Write every pending upload, or none of them.
    ///
    /// Slots are checked before anything touches the disk. If a later write
    /// fails, files written earlier in the batch are removed again.
    pub async fn save_all(&self, pending: Vec<PendingUpload>) -> AppResult<UploadedFiles> {
        if let Some(upload) = pending
            .iter()
            .find(|upload| !UPLOAD_SLOTS.contains(&upload.slot.as_str()))
        {
            return Err(AppError::bad_request(format!(
                "Unknown upload slot {}",
                upload.slot
            )));
        }

        let mut files = UploadedFiles::new();
        for upload in pending {
            match self
                .save(&upload.slot, upload.file_name.as_deref(), &upload.bytes)
                .await
            {
                Ok(file) => files.push(upload.slot, file),
                Err(e) => {
                    self.discard(&files).await;
                    return Err(e);
                }
            }
        }
        Ok(files)
    }

    /// Remove files that no stored record will reference.
    pub async fn discard(&self, files: &UploadedFiles) {
        for file in files.iter() {
            let path = self.root.join(file.as_str());
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove unused upload {}: {}", path.display(), e);
            }
        }
    }
}

/// Keep a safe, short version of a client-supplied file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my cv (final).pdf"), "my_cv__final_.pdf");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[tokio::test]
    async fn test_save_returns_relative_reference() {
        let root = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&root);

        let file = store
            .save("certificates", Some("bsc.pdf"), b"%PDF")
            .await
            .unwrap();

        assert!(file.as_str().starts_with("certificates/"));
        assert!(file.as_str().ends_with("-bsc.pdf"));
        assert_eq!(std::fs::read(root.join(file.as_str())).unwrap(), b"%PDF");

        std::fs::remove_dir_all(&root).ok();
    }

    fn pending(slot: &str, name: &str) -> PendingUpload {
        PendingUpload {
            slot: slot.to_string(),
            file_name: Some(name.to_string()),
            bytes: Bytes::from_static(b"%PDF"),
        }
    }

    #[tokio::test]
    async fn test_save_all_writes_nothing_for_unknown_slot() {
        let root = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&root);

        let result = store
            .save_all(vec![
                pending("certificates", "bsc.pdf"),
                pending("avatar", "me.png"),
            ])
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_discard_removes_saved_files() {
        let root = std::env::temp_dir().join(format!("uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&root);

        let files = store
            .save_all(vec![
                pending("certificates", "bsc.pdf"),
                pending("identityDocument", "passport.pdf"),
            ])
            .await
            .unwrap();
        assert_eq!(files.iter().count(), 2);
        assert!(files.iter().all(|f| root.join(f.as_str()).exists()));

        store.discard(&files).await;
        assert!(files.iter().all(|f| !root.join(f.as_str()).exists()));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_unknown_slot_is_rejected() {
        let store = UploadStore::new(std::env::temp_dir());
        let result = store.save("avatar", Some("x.png"), b"").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
