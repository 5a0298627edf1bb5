//! Database row structs for the platform metadata tables.

mod data_model;
mod database_config;
mod endpoint;
mod workflow;
mod workflow_connection;
mod workflow_node;

pub use data_model::{DataModel, NewDataModel};
pub use database_config::{DatabaseConfig, NewDatabaseConfig};
pub use endpoint::{Endpoint, NewEndpoint};
pub use workflow::{NewWorkflow, Workflow};
pub use workflow_connection::{NewWorkflowConnection, WorkflowConnection};
pub use workflow_node::{NewWorkflowNode, WorkflowNode};
