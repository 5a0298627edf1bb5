//! Data models repository for generic-CRUD descriptors.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{DataModel, NewDataModel};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for data-model operations.
pub trait DataModelRepository {
    /// Creates a new data model record.
    fn create_data_model(
        &mut self,
        new_model: NewDataModel,
    ) -> impl Future<Output = PgResult<DataModel>> + Send;

    /// Finds a data model by its unique identifier.
    fn find_data_model_by_id(
        &mut self,
        model_id: i32,
    ) -> impl Future<Output = PgResult<Option<DataModel>>> + Send;
}

impl DataModelRepository for PgConnection {
    async fn create_data_model(&mut self, new_model: NewDataModel) -> PgResult<DataModel> {
        use schema::data_models;

        let model = diesel::insert_into(data_models::table)
            .values(&new_model)
            .returning(DataModel::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(model)
    }

    async fn find_data_model_by_id(&mut self, model_id: i32) -> PgResult<Option<DataModel>> {
        use schema::data_models::{self, dsl};

        let model = data_models::table
            .filter(dsl::id.eq(model_id))
            .select(DataModel::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(model)
    }
}
