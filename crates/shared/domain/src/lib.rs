//! Domain layer for the user record stores.
//!
//! Pure logic only: the role router, record schemas, the field normalizer
//! and the file asset resolver. Nothing here touches a database or HTTP.

pub mod assets;
pub mod constants;
pub mod error;
pub mod kind;
pub mod normalize;
pub mod password;
pub mod record;

pub use assets::{resolve_assets, AssetPaths, ExistingAssets, FileRef, SlotSchema, UploadedFiles};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use kind::StoreKind;
pub use normalize::{normalize, FieldPatch, NestedEntry, NormalizedFields, RawUpdate};
pub use password::Password;
pub use record::{
    Account, AdminUserRecord, CandidateRecord, CompanyExperience, Documents, Education,
    EmployerRecord, Experience, Profile, ReviewStatus, UserRecord,
};
