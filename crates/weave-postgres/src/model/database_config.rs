//! Database config model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::database_configs;

/// A runtime-configured external database connection.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = database_configs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DatabaseConfig {
    /// Unique config identifier.
    pub id: i32,
    /// Config name (unique; doubles as the injected script global).
    pub name: String,
    /// Config description.
    pub description: Option<String>,
    /// Database kind (stored as text, parsed at the registry).
    pub db_type: String,
    /// Server host, for network databases.
    pub host: Option<String>,
    /// Server port, for network databases.
    pub port: Option<i32>,
    /// Database name, for network databases.
    pub database: Option<String>,
    /// Username, for network databases.
    pub username: Option<String>,
    /// Password, for network databases.
    pub password: Option<String>,
    /// File path, for sqlite.
    pub path: Option<String>,
    /// Base connection pool size.
    pub pool_size: i32,
    /// Extra connections allowed past the base size.
    pub max_overflow: i32,
    /// Seconds to wait for a pooled connection.
    pub pool_timeout: i32,
    /// Seconds before a pooled connection is recycled.
    pub pool_recycle: i32,
    /// Extra driver parameters.
    pub extra: serde_json::Value,
    /// Whether the config participates in handle injection.
    pub enabled: bool,
    /// Whether this config backs the `db` default alias (at most one).
    pub is_default: bool,
    /// Timestamp when the config was created.
    pub created_at: Timestamp,
    /// Timestamp when the config was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new database config.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = database_configs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDatabaseConfig {
    /// Config name (required, unique).
    pub name: String,
    /// Config description.
    pub description: Option<String>,
    /// Database kind.
    pub db_type: String,
    /// Server host.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<i32>,
    /// Database name.
    pub database: Option<String>,
    /// Username.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// File path, for sqlite.
    pub path: Option<String>,
    /// Base connection pool size.
    pub pool_size: Option<i32>,
    /// Extra connections allowed past the base size.
    pub max_overflow: Option<i32>,
    /// Seconds to wait for a pooled connection.
    pub pool_timeout: Option<i32>,
    /// Seconds before a pooled connection is recycled.
    pub pool_recycle: Option<i32>,
    /// Whether the config participates in handle injection.
    pub enabled: Option<bool>,
    /// Whether this config backs the `db` default alias.
    pub is_default: Option<bool>,
}
