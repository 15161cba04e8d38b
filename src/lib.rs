//! Startise Bookclub client library
//!
//! Admin session handling, the refresh-after-mutate CRUD workflow and the
//! client-side catalog filters, all talking to the remote book service.

pub mod error;
pub mod modules;

pub use error::{Error, Result};
/// Re-export commonly used types
pub use modules::*;
