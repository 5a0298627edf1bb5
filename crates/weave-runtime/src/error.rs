//! Runtime error types.

use thiserror::Error;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during workflow and script execution.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A database config names a kind the async driver set cannot serve.
    #[error("unsupported database type '{kind}' (supported: sqlite, postgresql, mysql)")]
    UnsupportedDatabaseType {
        /// The configured kind as stored.
        kind: String,
    },

    /// Creating a connection pool for one config failed.
    #[error("failed to connect database config '{name}': {source}")]
    ConnectionFailed {
        /// Name of the offending config.
        name: String,
        /// Underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A dynamic query issued through an injected handle failed.
    #[error("query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    /// Script compilation or evaluation failed.
    #[error("script error: {0}")]
    Script(String),

    /// The named workflow does not exist or is disabled.
    #[error("workflow '{0}' not found or disabled")]
    WorkflowNotFound(String),

    /// An endpoint descriptor is unusable for its declared strategy.
    #[error("invalid endpoint configuration: {0}")]
    InvalidEndpoint(String),

    /// Metadata-store operation failed.
    #[error("metadata store error: {0}")]
    Postgres(#[from] weave_postgres::PgError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// Renders the full source chain, outermost first, one cause per line.
    ///
    /// This is the diagnostic "trace" carried in terminal run payloads and
    /// persisted execution records.
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            rendered.push_str("\ncaused by: ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        rendered
    }
}
