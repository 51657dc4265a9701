//! File asset resolution.
//!
//! Bytes are written by the upload middleware before any of this runs;
//! here we only decide which relative path each asset slot keeps.

use std::collections::HashMap;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::constants::{SLOT_CERTIFICATES, SLOT_IDENTITY_DOCUMENT, SLOT_PROFILE_IMAGE};
use crate::error::{DomainError, DomainResult};
use crate::kind::StoreKind;

/// A stored file, addressed relative to the upload root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    relative_path: String,
}

impl FileRef {
    /// Wrap a root-relative path. Absolute paths and `..` are rejected.
    pub fn new(relative_path: impl Into<String>) -> DomainResult<Self> {
        let relative_path = relative_path.into();
        let path = Path::new(&relative_path);

        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative_path.trim().is_empty() || escapes {
            return Err(DomainError::InvalidFileRef(relative_path));
        }

        Ok(Self {
            relative_path: relative_path.replace('\\', "/"),
        })
    }

    /// Derive the relative reference of a file written under `root`.
    pub fn under_root(root: &Path, path: &Path) -> DomainResult<Self> {
        let relative = path
            .strip_prefix(root)
            .map_err(|_| DomainError::InvalidFileRef(path.display().to_string()))?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.relative_path
    }
}

/// Files attached to one request, grouped by form slot in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFiles {
    slots: HashMap<String, Vec<FileRef>>,
}

impl UploadedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slot: impl Into<String>, file: FileRef) {
        self.slots.entry(slot.into()).or_default().push(file);
    }

    pub fn files(&self, slot: &str) -> &[FileRef] {
        self.slots.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The newest upload for a single-valued slot.
    pub fn latest(&self, slot: &str) -> Option<&FileRef> {
        self.files(slot).last()
    }

    /// Every file across all slots.
    pub fn iter(&self) -> impl Iterator<Item = &FileRef> {
        self.slots.values().flatten()
    }
}

/// Which asset slots a store's schema has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSchema {
    pub identity_document: bool,
    pub profile_image: bool,
    pub certificates: bool,
}

impl SlotSchema {
    pub fn for_kind(kind: StoreKind) -> Self {
        match kind {
            StoreKind::Candidate => Self {
                identity_document: true,
                profile_image: true,
                certificates: true,
            },
            StoreKind::Employer => Self {
                identity_document: true,
                profile_image: true,
                certificates: false,
            },
            StoreKind::Admin => Self {
                identity_document: false,
                profile_image: true,
                certificates: false,
            },
        }
    }
}

/// Paths already held before this request, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingAssets {
    pub identity_document: Option<String>,
    pub profile_image: Option<String>,
    /// One entry per education entry, in entry order.
    pub certificates: Vec<Option<String>>,
}

/// Resolved paths to persist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPaths {
    pub identity_document: Option<String>,
    pub profile_image: Option<String>,
    pub certificates: Vec<Option<String>>,
    /// Whether the identity document was replaced by a new upload
    pub identity_document_replaced: bool,
}

/// Resolve every slot of `schema`: a new upload wins, an existing path is
/// carried over untouched, otherwise the slot is empty.
///
/// Certificate uploads are consumed left to right by entries that do not
/// already reference a file.
pub fn resolve_assets(
    existing: &ExistingAssets,
    uploads: &UploadedFiles,
    schema: SlotSchema,
) -> AssetPaths {
    let identity_upload = uploads.latest(SLOT_IDENTITY_DOCUMENT);
    let identity_document = if schema.identity_document {
        identity_upload
            .map(|file| file.as_str().to_string())
            .or_else(|| existing.identity_document.clone())
    } else {
        None
    };

    let profile_image = if schema.profile_image {
        uploads
            .latest(SLOT_PROFILE_IMAGE)
            .map(|file| file.as_str().to_string())
            .or_else(|| existing.profile_image.clone())
    } else {
        None
    };

    let certificates = if schema.certificates {
        let mut pending = uploads.files(SLOT_CERTIFICATES).iter();
        existing
            .certificates
            .iter()
            .map(|current| match current {
                Some(path) => Some(path.clone()),
                None => pending.next().map(|file| file.as_str().to_string()),
            })
            .collect()
    } else {
        Vec::new()
    };

    AssetPaths {
        identity_document,
        profile_image,
        certificates,
        identity_document_replaced: schema.identity_document && identity_upload.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> FileRef {
        FileRef::new(path).unwrap()
    }

    #[test]
    fn test_file_ref_rejects_escaping_paths() {
        assert!(FileRef::new("/etc/passwd").is_err());
        assert!(FileRef::new("../secret").is_err());
        assert!(FileRef::new("").is_err());
        assert_eq!(file("certificates/a.pdf").as_str(), "certificates/a.pdf");
    }

    #[test]
    fn test_file_ref_under_root() {
        let root = Path::new("/srv/uploads");
        let stored = FileRef::under_root(root, Path::new("/srv/uploads/profileImage/x.png")).unwrap();
        assert_eq!(stored.as_str(), "profileImage/x.png");

        assert!(FileRef::under_root(root, Path::new("/tmp/x.png")).is_err());
    }

    #[test]
    fn test_upload_wins_over_existing() {
        let existing = ExistingAssets {
            identity_document: Some("identityDocument/old.pdf".to_string()),
            ..Default::default()
        };
        let mut uploads = UploadedFiles::new();
        uploads.push(SLOT_IDENTITY_DOCUMENT, file("identityDocument/new.pdf"));

        let paths = resolve_assets(&existing, &uploads, SlotSchema::for_kind(StoreKind::Employer));

        assert_eq!(paths.identity_document.as_deref(), Some("identityDocument/new.pdf"));
        assert!(paths.identity_document_replaced);
    }

    #[test]
    fn test_existing_path_carried_over() {
        let existing = ExistingAssets {
            identity_document: Some("identityDocument/old.pdf".to_string()),
            profile_image: Some("profileImage/me.png".to_string()),
            certificates: vec![Some("certificates/bsc.pdf".to_string())],
        };

        let paths = resolve_assets(
            &existing,
            &UploadedFiles::new(),
            SlotSchema::for_kind(StoreKind::Candidate),
        );

        assert_eq!(paths.identity_document, existing.identity_document);
        assert_eq!(paths.profile_image, existing.profile_image);
        assert_eq!(paths.certificates, existing.certificates);
        assert!(!paths.identity_document_replaced);
    }

    #[test]
    fn test_certificates_fill_empty_entries_left_to_right() {
        let existing = ExistingAssets {
            certificates: vec![None, Some("certificates/kept.pdf".to_string()), None, None],
            ..Default::default()
        };
        let mut uploads = UploadedFiles::new();
        uploads.push(SLOT_CERTIFICATES, file("certificates/first.pdf"));
        uploads.push(SLOT_CERTIFICATES, file("certificates/second.pdf"));

        let paths = resolve_assets(&existing, &uploads, SlotSchema::for_kind(StoreKind::Candidate));

        assert_eq!(
            paths.certificates,
            vec![
                Some("certificates/first.pdf".to_string()),
                Some("certificates/kept.pdf".to_string()),
                Some("certificates/second.pdf".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn test_slots_outside_schema_are_dropped() {
        let existing = ExistingAssets {
            identity_document: Some("identityDocument/old.pdf".to_string()),
            profile_image: Some("profileImage/me.png".to_string()),
            certificates: vec![Some("certificates/bsc.pdf".to_string())],
        };

        let paths = resolve_assets(&existing, &UploadedFiles::new(), SlotSchema::for_kind(StoreKind::Admin));

        assert_eq!(paths.identity_document, None);
        assert_eq!(paths.profile_image.as_deref(), Some("profileImage/me.png"));
        assert!(paths.certificates.is_empty());
    }
}
