// src/infra/errors.rs — Error types for liftloop

use thiserror::Error;

/// Rejection raised while validating or applying a single plan edit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("{edit_type}: missing required field '{field}'")]
    MissingField { edit_type: String, field: String },

    #[error("{edit_type}: invalid value for '{field}': {value}")]
    InvalidField {
        edit_type: String,
        field: String,
        value: String,
    },

    #[error("location out of range: {location}")]
    OutOfBounds { location: String },

    #[error("unsupported edit type '{0}'")]
    UnsupportedType(String),

    #[error("'{0}' is a semantic edit and cannot be applied mechanically")]
    NotMechanical(String),
}

#[derive(Error, Debug)]
pub enum LiftError {
    // Provider errors (retriable)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("No model provider configured. Set {env_var} or edit config.toml.")]
    NoProvider { env_var: String },

    // Oracle errors
    #[error("{oracle} failed: {message}")]
    Oracle { oracle: String, message: String },

    #[error("Unparseable model output: {0}")]
    Parse(String),

    #[error("Edit rejected: {0}")]
    Edit(#[from] EditError),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LiftError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            LiftError::Provider {
                retriable: true,
                ..
            } | LiftError::RateLimited { .. }
        )
    }

    pub fn oracle(oracle: impl Into<String>, message: impl Into<String>) -> Self {
        LiftError::Oracle {
            oracle: oracle.into(),
            message: message.into(),
        }
    }
}
