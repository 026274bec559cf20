// SPDX-License-Identifier: MIT

//! Typed error handling for turnstile-rs
//!
//! Configuration errors are fatal and surface at construction time,
//! before any turn is evaluated. Evaluation errors propagate unchanged
//! through `check()` and are never converted into a default boolean.

use thiserror::Error;

/// Top-level error type for turnstile-rs
#[derive(Debug, Error)]
pub enum GateError {
    /// Configuration errors (missing field, malformed cron/template)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requirement type not present in the registry
    #[error("Requirement type '{name}' not found")]
    UnknownRequirement { name: String },

    /// Operator type not recognised
    #[error("Operator type '{name}' not found")]
    UnknownOperator { name: String },

    /// Runtime evaluation errors (missing counter key, type mismatch,
    /// template render/coercion failure)
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Failure of an injected external capability (classifier, broker)
    #[error("Capability '{name}' failed: {message}")]
    Capability { name: String, message: String },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl GateError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation(message.into())
    }

    /// Create a capability error
    pub fn capability(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Capability {
            name: name.into(),
            message: message.into(),
        }
    }
}
