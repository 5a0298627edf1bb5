//! Database configs repository for runtime-configured connections.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use diesel_async::scoped_futures::ScopedFutureExt;

use crate::model::{DatabaseConfig, NewDatabaseConfig};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for database-config operations.
pub trait DatabaseConfigRepository {
    /// Creates a new database config record.
    fn create_database_config(
        &mut self,
        new_config: NewDatabaseConfig,
    ) -> impl Future<Output = PgResult<DatabaseConfig>> + Send;

    /// Finds a config by its unique identifier.
    fn find_database_config_by_id(
        &mut self,
        config_id: i32,
    ) -> impl Future<Output = PgResult<Option<DatabaseConfig>>> + Send;

    /// Lists all enabled configs, ordered by name.
    fn list_enabled_database_configs(
        &mut self,
    ) -> impl Future<Output = PgResult<Vec<DatabaseConfig>>> + Send;

    /// Marks one config as the default, clearing the flag everywhere else.
    ///
    /// Runs in a transaction so the "at most one default" invariant holds
    /// at every observable point.
    fn set_default_database_config(
        &mut self,
        config_id: i32,
    ) -> impl Future<Output = PgResult<DatabaseConfig>> + Send;
}

impl DatabaseConfigRepository for PgConnection {
    async fn create_database_config(
        &mut self,
        new_config: NewDatabaseConfig,
    ) -> PgResult<DatabaseConfig> {
        use schema::database_configs;

        let config = diesel::insert_into(database_configs::table)
            .values(&new_config)
            .returning(DatabaseConfig::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(config)
    }

    async fn find_database_config_by_id(
        &mut self,
        config_id: i32,
    ) -> PgResult<Option<DatabaseConfig>> {
        use schema::database_configs::{self, dsl};

        let config = database_configs::table
            .filter(dsl::id.eq(config_id))
            .select(DatabaseConfig::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(config)
    }

    async fn list_enabled_database_configs(&mut self) -> PgResult<Vec<DatabaseConfig>> {
        use schema::database_configs::{self, dsl};

        let configs = database_configs::table
            .filter(dsl::enabled.eq(true))
            .order(dsl::name.asc())
            .select(DatabaseConfig::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(configs)
    }

    async fn set_default_database_config(&mut self, config_id: i32) -> PgResult<DatabaseConfig> {
        use schema::database_configs::{self, dsl};

        self.transaction(|conn| {
            async move {
                diesel::update(
                    database_configs::table
                        .filter(dsl::is_default.eq(true))
                        .filter(dsl::id.ne(config_id)),
                )
                .set(dsl::is_default.eq(false))
                .execute(conn)
                .await?;

                let config =
                    diesel::update(database_configs::table.filter(dsl::id.eq(config_id)))
                        .set(dsl::is_default.eq(true))
                        .returning(DatabaseConfig::as_returning())
                        .get_result(conn)
                        .await?;

                Ok::<_, diesel::result::Error>(config)
            }
            .scope_boxed()
        })
        .await
        .map_err(PgError::from)
    }
}
