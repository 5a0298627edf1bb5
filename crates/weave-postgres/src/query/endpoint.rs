//! Endpoints repository for declared API routes.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{Endpoint, NewEndpoint};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for endpoint database operations.
pub trait EndpointRepository {
    /// Creates a new endpoint record.
    fn create_endpoint(
        &mut self,
        new_endpoint: NewEndpoint,
    ) -> impl Future<Output = PgResult<Endpoint>> + Send;

    /// Finds an endpoint by its unique identifier.
    fn find_endpoint_by_id(
        &mut self,
        endpoint_id: i32,
    ) -> impl Future<Output = PgResult<Option<Endpoint>>> + Send;

    /// Lists all enabled endpoints, ordered by path for stable routing.
    fn list_enabled_endpoints(&mut self) -> impl Future<Output = PgResult<Vec<Endpoint>>> + Send;
}

impl EndpointRepository for PgConnection {
    async fn create_endpoint(&mut self, new_endpoint: NewEndpoint) -> PgResult<Endpoint> {
        use schema::endpoints;

        let endpoint = diesel::insert_into(endpoints::table)
            .values(&new_endpoint)
            .returning(Endpoint::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(endpoint)
    }

    async fn find_endpoint_by_id(&mut self, endpoint_id: i32) -> PgResult<Option<Endpoint>> {
        use schema::endpoints::{self, dsl};

        let endpoint = endpoints::table
            .filter(dsl::id.eq(endpoint_id))
            .select(Endpoint::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(endpoint)
    }

    async fn list_enabled_endpoints(&mut self) -> PgResult<Vec<Endpoint>> {
        use schema::endpoints::{self, dsl};

        let endpoints = endpoints::table
            .filter(dsl::enabled.eq(true))
            .order(dsl::path.asc())
            .select(Endpoint::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(endpoints)
    }
}
