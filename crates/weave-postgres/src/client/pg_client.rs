//! High-level database client over a deadpool of async connections.

use std::fmt;
use std::sync::Arc;

use deadpool::managed::Pool;
use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_migrations::MigrationHarness;

use crate::{
    ConnectionPool, MIGRATIONS, PgConfig, PgError, PgResult, PooledConnection,
    TRACING_TARGET_CONNECTION,
};

/// High-level database client that manages connections and migrations.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

struct PgClientInner {
    pool: ConnectionPool,
    config: PgConfig,
}

impl PgClient {
    /// Creates a new database client with the provided configuration.
    ///
    /// This will establish a connection pool.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CONNECTION,
        fields(database_url = %config.database_url_masked())
    )]
    pub fn new(config: PgConfig) -> PgResult<Self> {
        tracing::info!(target: TRACING_TARGET_CONNECTION, "Initializing database client");

        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.postgres_url);

        let mut builder = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .runtime(deadpool::Runtime::Tokio1);

        if let Some(timeout) = config.connection_timeout() {
            builder = builder.wait_timeout(Some(timeout)).create_timeout(Some(timeout));
        }

        let pool = builder.build().map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                error = %e,
                "Failed to create connection pool"
            );
            PgError::Unexpected(format!("Failed to build connection pool: {e}"))
        })?;

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Checks out a pooled connection.
    pub async fn get_connection(&self) -> PgResult<PooledConnection> {
        self.inner.pool.get().await.map_err(PgError::from)
    }

    /// Returns the configuration this client was built from.
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }

    /// Applies all pending embedded migrations.
    ///
    /// Diesel's migration harness is synchronous, so a dedicated wrapper
    /// connection is established and driven on a blocking worker thread.
    pub async fn run_migrations(&self) -> PgResult<()> {
        use diesel::Connection;

        let database_url = self.inner.config.postgres_url.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn =
                AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)
                    .map_err(PgError::from)?;

            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(PgError::Migration)?;

            tracing::info!(
                target: TRACING_TARGET_CONNECTION,
                migrations = applied.len(),
                "Applied pending migrations"
            );

            Ok(())
        })
        .await
        .map_err(|e| PgError::Unexpected(format!("migration task panicked: {e}")))?
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("config", &self.inner.config)
            .finish()
    }
}
