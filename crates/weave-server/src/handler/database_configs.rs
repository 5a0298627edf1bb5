//! Database-config liveness test handler.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};
use weave_postgres::query::DatabaseConfigRepository;

use crate::handler::{Error, Result};
use crate::service::ServiceState;

/// `POST /database-configs/{config_id}/test` — verify connectivity.
///
/// Opens a throwaway connection, issues a trivial liveness query and
/// disposes it unconditionally. Both outcomes answer 200 with
/// `{success, message}`.
pub(crate) async fn test_connection(
    State(state): State<ServiceState>,
    Path(config_id): Path<i32>,
) -> Result<Json<Value>> {
    let config = {
        let mut conn = state.pg_client().get_connection().await?;
        conn.find_database_config_by_id(config_id)
            .await?
            .ok_or_else(|| Error::NotFound("database config not found".into()))?
    };

    let payload = match state.registry().test(&config).await {
        Ok(()) => json!({
            "success": true,
            "message": "connection test succeeded",
        }),
        Err(error) => json!({
            "success": false,
            "message": format!("connection test failed: {error}"),
        }),
    };

    Ok(Json(payload))
}
