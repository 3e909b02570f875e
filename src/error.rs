use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DateManagerError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("New payment date {target} must be after the exclude-after date {cutoff}")]
    OrderingViolation { target: String, cutoff: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Subscription store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure category reported to whoever invoked the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    InvalidDate,
    OrderingViolation,
    PermissionDenied,
    StoreUnavailable,
    Internal,
}

impl DateManagerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DateManagerError::InvalidDate(_) => ErrorCategory::InvalidDate,
            DateManagerError::OrderingViolation { .. } => ErrorCategory::OrderingViolation,
            DateManagerError::PermissionDenied(_) => ErrorCategory::PermissionDenied,
            DateManagerError::StoreUnavailable(_) => ErrorCategory::StoreUnavailable,
            _ => ErrorCategory::Internal,
        }
    }
}

impl From<::config::ConfigError> for DateManagerError {
    fn from(value: ::config::ConfigError) -> Self {
        DateManagerError::Config(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DateManagerError>;
