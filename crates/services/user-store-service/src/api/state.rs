//! Application state shared by every handler.

use std::sync::Arc;

use crate::infra::Database;
use crate::service::RecordService;

use super::middleware::TokenVerifier;
use super::uploads::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<RecordService>,
    pub tokens: Arc<TokenVerifier>,
    pub uploads: Arc<UploadStore>,
    /// Request body limit in bytes
    pub body_limit: usize,
    /// Absent when running without a database (tests)
    pub database: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        records: Arc<RecordService>,
        tokens: Arc<TokenVerifier>,
        uploads: Arc<UploadStore>,
        body_limit: usize,
    ) -> Self {
        Self {
            records,
            tokens,
            uploads,
            body_limit,
            database: None,
        }
    }

    pub fn with_database(mut self, database: Arc<Database>) -> Self {
        self.database = Some(database);
        self
    }
}
