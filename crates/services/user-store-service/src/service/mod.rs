//! Service layer - business logic over the record stores.

mod builder;
mod directory;
mod locks;
mod migration;
mod record_service;

pub use directory::IdentityDirectory;
pub use locks::{IdentityGuard, IdentityLocks};
pub use migration::{MigrateRequest, MigrateResult, MigrationEngine, ReconcileReport};
pub use record_service::RecordService;
