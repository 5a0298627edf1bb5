//! String-backed enums for the metadata store.
//!
//! Logic and database kinds are persisted as plain TEXT and parsed at the
//! runtime boundary. Unknown values must surface as reportable errors (the
//! dispatcher answers `{"error": "unknown logic type: ..."}` instead of
//! failing to deserialize a row), which rules out a closed database enum.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Execution strategy selector for a declared endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogicType {
    /// Literal response template with `{{dotted.path}}` interpolation.
    Templated,
    /// Generic table CRUD against the referenced data model.
    #[strum(serialize = "generic-crud")]
    #[serde(rename = "generic-crud")]
    GenericCrud,
    /// Multi-step workflow of numbered script nodes.
    Workflow,
    /// Single inline script with a restricted environment.
    Scripted,
}

/// Supported kinds of runtime-configured external databases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DbKind {
    Sqlite,
    Postgresql,
    Mysql,
    Mssql,
}

/// Terminal status of one workflow run, as recorded in its trace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
    Running,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn logic_type_round_trips_stored_text() {
        assert_eq!(LogicType::from_str("workflow").unwrap(), LogicType::Workflow);
        assert_eq!(
            LogicType::from_str("generic-crud").unwrap(),
            LogicType::GenericCrud
        );
        assert_eq!(LogicType::GenericCrud.as_ref(), "generic-crud");
        assert!(LogicType::from_str("graphql").is_err());
    }

    #[test]
    fn db_kind_matches_config_values() {
        assert_eq!(DbKind::from_str("sqlite").unwrap(), DbKind::Sqlite);
        assert_eq!(DbKind::from_str("postgresql").unwrap(), DbKind::Postgresql);
        assert_eq!(DbKind::from_str("mssql").unwrap(), DbKind::Mssql);
        assert!(DbKind::from_str("oracle").is_err());
    }
}
