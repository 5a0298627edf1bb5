#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod dispatch;
pub mod engine;
mod error;
mod program;
pub mod registry;
pub mod sandbox;
pub mod trace;

pub use error::{RuntimeError, RuntimeResult};
pub use program::{NodeProgram, ProgramNode, node_number};

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "weave_runtime";
