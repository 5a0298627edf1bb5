//! Service-level error type.

use thiserror::Error;

/// Result type for service bootstrap operations.
pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// Errors raised while building or running the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Metadata-store initialization or query failed.
    #[error("postgres error: {0}")]
    Postgres(#[from] weave_postgres::PgError),

    /// Runtime component failed.
    #[error("runtime error: {0}")]
    Runtime(#[from] weave_runtime::RuntimeError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
