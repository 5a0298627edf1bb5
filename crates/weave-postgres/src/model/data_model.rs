//! Data model descriptor for generic-CRUD endpoints.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::data_models;

/// A named table descriptor that generic-CRUD endpoints operate on.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = data_models)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DataModel {
    /// Unique model identifier.
    pub id: i32,
    /// Model name.
    pub name: String,
    /// Target table name in the default external database.
    pub table_name: String,
    /// Model description.
    pub description: Option<String>,
    /// Timestamp when the model was created.
    pub created_at: Timestamp,
    /// Timestamp when the model was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new data model.
#[derive(Debug, Default, Clone, Insertable)]
#[diesel(table_name = data_models)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDataModel {
    /// Model name (required).
    pub name: String,
    /// Target table name (required).
    pub table_name: String,
    /// Model description.
    pub description: Option<String>,
}
