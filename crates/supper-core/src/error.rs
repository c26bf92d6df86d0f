// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Supper dinner orchestrator.

use thiserror::Error;

/// The primary error type used across all Supper collaborators and workflow operations.
#[derive(Debug, Error)]
pub enum SupperError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced channel, vote, dinner or fridge record does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Caller supplied a value the operation cannot accept. No mutation was performed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The record is in a state that forbids the requested transition.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// A versioned write kept losing to concurrent writers.
    #[error("concurrent update conflict on `{key}`")]
    Conflict { key: String },

    /// Chat transport errors (HTTP failure, API rejection, malformed payload).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM provider errors (API failure, unparseable completion).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SupperError {
    /// Shorthand for a [`SupperError::NotFound`].
    pub fn not_found(entity: &str, key: impl Into<String>) -> Self {
        SupperError::NotFound {
            entity: entity.to_string(),
            key: key.into(),
        }
    }

    /// Wraps a serde_json failure as a storage error.
    pub fn serialization(e: serde_json::Error) -> Self {
        SupperError::Storage {
            source: Box::new(e),
        }
    }

    /// True for failures of an external collaborator (chat transport, LLM, timeouts).
    ///
    /// These are always recoverable: interactive paths degrade to a fallback
    /// message and scheduled paths skip the channel until the next tick.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            SupperError::Transport { .. } | SupperError::Provider { .. } | SupperError::Timeout { .. }
        )
    }
}

/// Runs `fut` with a deadline, mapping expiry to [`SupperError::Timeout`].
pub async fn with_timeout<T, F>(duration: std::time::Duration, fut: F) -> Result<T, SupperError>
where
    F: std::future::Future<Output = Result<T, SupperError>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(SupperError::Timeout { duration }),
    }
}
