//! Common utilities and types shared across failover-agent components.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
