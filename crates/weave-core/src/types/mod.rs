//! Common data types shared across the weave crates.

mod context;

pub use context::RequestContext;
