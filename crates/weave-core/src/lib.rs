#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
pub mod types;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
