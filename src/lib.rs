pub mod schedule;
pub mod storage;
pub mod config;
pub mod error;
pub mod utils;

pub use crate::error::{Result, DateManagerError};
pub use crate::config::Config;

/// Version stamped into audit notes and update log entries
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
