//! Error types for the model manager.
//!
//! Load failures are surfaced with their cause and commit nothing.
//! Unload failures never reach callers: the entry is dropped anyway.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors returned by fetch, acquire and explicit unload.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error(
        "Budget exceeded loading {model_id}: requires {required_mb} MB, \
         {free_mb} MB free of {total_mb} MB"
    )]
    BudgetExceeded {
        model_id: String,
        required_mb: u64,
        free_mb: u64,
        total_mb: u64,
    },

    #[error("Failed to load model {model_id}: {source}")]
    ModelLoad {
        model_id: String,
        #[source]
        source: AdapterError,
    },

    #[error("Model {model_id} is in use by {active_refs} lease(s)")]
    ModelInUse { model_id: String, active_refs: u32 },

    #[error("Timed out after {timeout_ms}ms waiting for model {model_id}")]
    Timeout { model_id: String, timeout_ms: u64 },
}

impl ManagerError {
    /// True if the same call may succeed later without caller changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. } | Self::Timeout { .. })
    }

    /// True if the caller asked for something that can never succeed.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::UnknownModel(_))
    }
}

/// Errors rejected at registration time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Model identifier cannot be empty")]
    EmptyIdentifier,

    #[error("Model {0} must declare a positive memory cost")]
    InvalidCost(String),

    #[error("Model already registered: {0}")]
    DuplicateModel(String),
}

/// Failure reported by a model adapter's load or unload operation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AdapterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exceeded_is_retryable() {
        let err = ManagerError::BudgetExceeded {
            model_id: "pose".into(),
            required_mb: 500,
            free_mb: 400,
            total_mb: 1000,
        };
        assert!(err.is_retryable());
        assert!(!err.is_caller_error());
        assert!(err.to_string().contains("requires 500 MB"));
    }

    #[test]
    fn unknown_model_is_caller_error() {
        let err = ManagerError::UnknownModel("ghost".into());
        assert!(err.is_caller_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn load_error_keeps_adapter_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "weights missing");
        let err = ManagerError::ModelLoad {
            model_id: "vehicle".into(),
            source: AdapterError::with_source("weights unavailable", io),
        };
        let adapter = err.source().expect("adapter error");
        assert_eq!(adapter.to_string(), "weights unavailable");
        assert!(adapter.source().is_some());
    }
}
