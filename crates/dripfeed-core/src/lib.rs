//! `dripfeed-core`: configuration and the top-level error type shared by
//! every dripfeed crate.

pub mod config;
pub mod error;

pub use config::DripfeedConfig;
pub use error::{DripfeedError, Result};
