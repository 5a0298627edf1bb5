//! Application state and dependency injection.

use std::sync::Arc;

use weave_postgres::PgClient;
use weave_runtime::dispatch::Dispatcher;
use weave_runtime::engine::WorkflowEngine;
use weave_runtime::registry::ConnectionRegistry;
use weave_runtime::trace::TraceStore;

use crate::service::{Result, ServiceConfig};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    pg_client: PgClient,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
}

impl ServiceState {
    /// Initializes application state from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let pg_client = config.connect_postgres()?;
        let registry = Arc::new(ConnectionRegistry::new());
        let traces = TraceStore::new(&config.trace_dir);

        let dispatcher = Dispatcher::new(
            pg_client.clone(),
            registry.clone(),
            WorkflowEngine::with_defaults(),
            traces,
        );

        Ok(Self {
            pg_client,
            registry,
            dispatcher,
        })
    }

    /// Returns the metadata-store client.
    pub fn pg_client(&self) -> &PgClient {
        &self.pg_client
    }

    /// Returns the external-database connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns the endpoint dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+ $(,)?) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(pg_client: PgClient);
impl_di!(registry: Arc<ConnectionRegistry>);
impl_di!(dispatcher: Dispatcher);
