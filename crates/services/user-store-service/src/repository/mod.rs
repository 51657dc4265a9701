//! Repository layer: one store adapter per record kind.

pub mod entities;
mod record_repository;
mod stores;

pub use record_repository::{Persistence, RecordRepository, RecordStores};
pub use stores::{AdminUserStore, CandidateStore, EmployerStore};

#[cfg(any(test, feature = "test-utils"))]
pub use record_repository::MockRecordRepository;
