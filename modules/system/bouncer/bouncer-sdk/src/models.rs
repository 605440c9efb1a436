//! Domain models for the bouncer module.
//!
//! An action or hook answers with an [`ActionResponse`]; the authorizer
//! normalizes it into an [`AuthorizationResult`] using [`DenyDefaults`].

use serde::{Deserialize, Serialize};

/// Deny message used when an action denies without giving a reason.
pub const DEFAULT_DENY_MESSAGE: &str =
    "E_AUTHORIZATION_FAILURE: Not authorized to perform this action";

/// Status code used when an action denies without giving one.
pub const DEFAULT_DENY_STATUS: u16 = 403;

/// Raw answer of an action handler or hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResponse {
    /// Access granted.
    Allow,
    /// Access denied with the default message and status.
    Deny,
    /// Access denied with an explicit message and, optionally, status.
    DenyWith {
        message: String,
        status: Option<u16>,
    },
}

impl From<bool> for ActionResponse {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}

/// Deny with a custom reason.
///
/// ```ignore
/// use bouncer_sdk::deny;
///
/// let forbidden = deny("Post is locked", None);
/// let not_found = deny("Post not found", 404);
/// ```
#[must_use]
pub fn deny(message: impl Into<String>, status: impl Into<Option<u16>>) -> ActionResponse {
    ActionResponse::DenyWith {
        message: message.into(),
        status: status.into(),
    }
}

/// Per-action options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionOptions {
    /// Evaluate the handler even when no user is authenticated.
    pub allow_guest: bool,
}

impl ActionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn allow_guest(mut self, allow: bool) -> Self {
        self.allow_guest = allow;
        self
    }
}

/// Message and status applied to denies that do not carry their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyDefaults {
    pub message: String,
    pub status: u16,
}

impl Default for DenyDefaults {
    fn default() -> Self {
        Self {
            message: DEFAULT_DENY_MESSAGE.to_owned(),
            status: DEFAULT_DENY_STATUS,
        }
    }
}

/// Reason attached to a denied verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
}

/// Normalized outcome of one evaluation.
///
/// `authorized` is `true` exactly when there is no error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAuthorizationResult")]
pub struct AuthorizationResult {
    authorized: bool,
    error_response: Option<ErrorResponse>,
}

/// Wire form of [`AuthorizationResult`], checked before conversion.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAuthorizationResult {
    authorized: bool,
    #[serde(default)]
    error_response: Option<ErrorResponse>,
}

impl TryFrom<RawAuthorizationResult> for AuthorizationResult {
    type Error = &'static str;

    fn try_from(raw: RawAuthorizationResult) -> Result<Self, Self::Error> {
        match (raw.authorized, raw.error_response) {
            (true, None) => Ok(Self::allowed()),
            (false, Some(e)) => Ok(Self::denied(e.message, e.status)),
            (true, Some(_)) => Err("authorized result must not carry an error response"),
            (false, None) => Err("denied result must carry an error response"),
        }
    }
}

impl AuthorizationResult {
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            authorized: true,
            error_response: None,
        }
    }

    #[must_use]
    pub fn denied(message: impl Into<String>, status: u16) -> Self {
        Self {
            authorized: false,
            error_response: Some(ErrorResponse {
                message: message.into(),
                status,
            }),
        }
    }

    /// Denied with the default message and status.
    #[must_use]
    pub fn default_denied(defaults: &DenyDefaults) -> Self {
        Self::denied(defaults.message.clone(), defaults.status)
    }

    /// Normalizes a raw response, filling in whatever the deny left out.
    #[must_use]
    pub fn from_response(response: ActionResponse, defaults: &DenyDefaults) -> Self {
        match response {
            ActionResponse::Allow => Self::allowed(),
            ActionResponse::Deny => Self::default_denied(defaults),
            ActionResponse::DenyWith { message, status } => {
                Self::denied(message, status.unwrap_or(defaults.status))
            }
        }
    }

    #[must_use]
    pub fn authorized(&self) -> bool {
        self.authorized
    }

    #[must_use]
    pub fn error_response(&self) -> Option<&ErrorResponse> {
        self.error_response.as_ref()
    }
}
