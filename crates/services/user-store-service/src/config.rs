//! User store service configuration.

use std::env;

use common::{
    AppError, AppResult, DatabaseConfig, JwtConfig, ReconcileConfig, ServerConfig, UploadConfig,
};

/// Minimum JWT secret length for HS256 verification
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Service configuration assembled from the shared config structs.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub jwt: JwtConfig,
    pub reconcile: ReconcileConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Fails if `JWT_SECRET` is missing in a release build or shorter than
    /// `MIN_JWT_SECRET_LENGTH`.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let server_defaults = ServerConfig::default();
        let database_defaults = DatabaseConfig::default();
        let upload_defaults = UploadConfig::default();

        let secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            }
            Err(_) => {
                return Err(AppError::internal(
                    "JWT_SECRET environment variable must be set in production",
                ))
            }
        };
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::internal(format!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(server_defaults.host),
                port: parsed("SERVER_PORT").unwrap_or(server_defaults.port),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(database_defaults.url),
                max_connections: parsed("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(database_defaults.max_connections),
                min_connections: parsed("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or(database_defaults.min_connections),
            },
            upload: UploadConfig {
                root: env::var("UPLOAD_ROOT").unwrap_or(upload_defaults.root),
                max_bytes: parsed("UPLOAD_MAX_BYTES").unwrap_or(upload_defaults.max_bytes),
            },
            jwt: JwtConfig { secret },
            reconcile: ReconcileConfig {
                grace_seconds: parsed("RECONCILE_GRACE_SECONDS")
                    .unwrap_or(ReconcileConfig::default().grace_seconds),
            },
        })
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
