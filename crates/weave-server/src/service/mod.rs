//! Service state, configuration and observability bootstrap.

mod config;
mod error;
mod state;
mod tracing;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{Result, ServiceError};
pub use state::ServiceState;
pub use tracing::initialize_tracing;
