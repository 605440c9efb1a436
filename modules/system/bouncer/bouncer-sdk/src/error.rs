//! Error types for the bouncer module.

use thiserror::Error;

use crate::models::{AuthorizationResult, ErrorResponse};

/// Errors returned by the bouncer registries and authorizers.
///
/// An ordinary deny is not an error: it is expressed as an
/// [`AuthorizationResult`] with `authorized == false`. Only
/// [`BouncerError::Unauthorized`] carries a deny, and only `authorize`
/// produces it.
#[derive(Debug, Error)]
pub enum BouncerError {
    /// An action with this name is already registered.
    #[error("action '{0}' is already defined")]
    DuplicateAction(String),

    /// A policy already declares an action with this name.
    #[error("action '{action}' is already defined on policy '{policy}'")]
    DuplicatePolicyAction { policy: String, action: String },

    /// No global action with this name is registered.
    #[error("action '{0}' is not defined")]
    ActionNotFound(String),

    /// The policy does not declare an action with this name.
    #[error("action '{action}' is not defined on policy '{policy}'")]
    PolicyActionNotFound { policy: String, action: String },

    /// No policy with this name is registered.
    #[error("policy '{0}' is not registered")]
    PolicyNotFound(String),

    /// The policy loader failed. The loader error is kept as the source.
    #[error("failed to load policy '{policy}'")]
    PolicyLoad {
        policy: String,
        #[source]
        source: anyhow::Error,
    },

    /// A handler or hook failed. The original error is carried unmodified.
    #[error(transparent)]
    Handler(anyhow::Error),

    /// The evaluated action denied access.
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),
}

impl BouncerError {
    /// Returns the deny carried by [`BouncerError::Unauthorized`], if any.
    #[must_use]
    pub fn as_authorization_error(&self) -> Option<&AuthorizationError> {
        match self {
            Self::Unauthorized(e) => Some(e),
            _ => None,
        }
    }
}

/// Raised by `authorize` when the verdict is a deny.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthorizationError {
    message: String,
    status: u16,
}

impl AuthorizationError {
    #[must_use]
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// Human-readable deny reason.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status code to respond with (403 unless the action chose otherwise).
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Builds the error from a denied verdict. Returns `None` for an allow.
    #[must_use]
    pub fn from_result(result: &AuthorizationResult) -> Option<Self> {
        result
            .error_response()
            .map(|ErrorResponse { message, status }| Self::new(message.clone(), *status))
    }
}

/// Failure to read a positional action argument.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("missing argument at position {0}")]
    Missing(usize),

    #[error("invalid argument at position {index}: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("argument is not serializable: {0}")]
    Serialize(#[source] serde_json::Error),
}
