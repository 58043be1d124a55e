//! Error types for Turnstile.
//!
//! This module provides [`GuardError`], the tagged failure every guard signals
//! through. The taxonomy is closed to the eight kinds of [`ErrorKind`]:
//!
//! | `ErrorKind` | Status | Default message |
//! |---|---|---|
//! | `BadRequest` | 400 | `Bad Request` |
//! | `Unauthorized` | 401 | `Unauthorized` |
//! | `Forbidden` | 403 | `Forbidden` |
//! | `NotFound` | 404 | `Not Found` |
//! | `Conflict` | 409 | `Conflict` |
//! | `Expired` | 410 | `Expired` |
//! | `Internal` | 500 | `Internal Error` |
//! | `NotImplemented` | 501 | `Not Implemented` |
//!
//! A failure is immutable once built. The kind fixes the status unless it is
//! explicitly overridden with [`GuardError::with_status`].

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`GuardError`].
pub type GuardResult<T> = Result<T, GuardError>;

/// Message used when an internal fault is converted into a failure.
///
/// The underlying cause is logged, never exposed to the caller.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Internal Error";

/// The closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or contract-violating request (400).
    BadRequest,
    /// Missing or invalid credentials (401).
    Unauthorized,
    /// Request refused in this deployment or for this caller (403).
    Forbidden,
    /// Resource not found (404).
    NotFound,
    /// Conflicting state (409).
    Conflict,
    /// Resource no longer available (410).
    Expired,
    /// Unexpected internal fault (500).
    Internal,
    /// Operation not implemented (501).
    NotImplemented,
}

impl ErrorKind {
    /// All kinds, in status order.
    pub const ALL: [ErrorKind; 8] = [
        Self::BadRequest,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::Conflict,
        Self::Expired,
        Self::Internal,
        Self::NotImplemented,
    ];

    /// Returns the HTTP status code fixed by this kind.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Expired => StatusCode::GONE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Returns the kind's name as rendered in error bodies (`BadRequest`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequest",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "NotFound",
            Self::Conflict => "Conflict",
            Self::Expired => "Expired",
            Self::Internal => "Internal",
            Self::NotImplemented => "NotImplemented",
        }
    }

    /// Returns the human-readable message used when none is given.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::Conflict => "Conflict",
            Self::Expired => "Expired",
            Self::Internal => GENERIC_INTERNAL_MESSAGE,
            Self::NotImplemented => "Not Implemented",
        }
    }

    /// Maps a raw HTTP status onto the taxonomy.
    #[must_use]
    pub fn from_status(status: u16) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.status_code().as_u16() == status)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged failure raised by a guard.
///
/// # Example
///
/// ```
/// use turnstile_core::{ErrorKind, GuardError};
///
/// let error = GuardError::bad_request("missing request body");
/// assert_eq!(error.kind(), ErrorKind::BadRequest);
/// assert_eq!(error.status_code().as_u16(), 400);
/// assert_eq!(error.message(), "missing request body");
///
/// let error = GuardError::new(ErrorKind::Forbidden, None::<String>);
/// assert_eq!(error.message(), "Forbidden");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct GuardError {
    kind: ErrorKind,
    status: StatusCode,
    message: String,
}

impl GuardError {
    /// Creates a failure of the given kind.
    ///
    /// Without a message the kind's default message is used.
    #[must_use]
    pub fn new(kind: ErrorKind, message: Option<impl Into<String>>) -> Self {
        Self {
            kind,
            status: kind.status_code(),
            message: message.map_or_else(|| kind.default_message().to_string(), Into::into),
        }
    }

    /// Creates a failure of the given kind with its default message.
    #[must_use]
    pub fn of_kind(kind: ErrorKind) -> Self {
        Self::new(kind, None::<String>)
    }

    /// Maps a raw status and message onto the taxonomy.
    ///
    /// Statuses outside the taxonomy become `Internal` with the generic
    /// message so that nothing about the fault leaks to the caller.
    #[must_use]
    pub fn from_status(status: u16, message: Option<impl Into<String>>) -> Self {
        match ErrorKind::from_status(status) {
            Some(kind) => Self::new(kind, message),
            None => {
                tracing::warn!(status, "unrecognized failure status mapped to Internal");
                Self::internal(None::<String>)
            }
        }
    }

    /// Creates a `BadRequest` failure.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, Some(message))
    }

    /// Creates an `Unauthorized` failure with the default message.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::of_kind(ErrorKind::Unauthorized)
    }

    /// Creates a `Forbidden` failure with the default message.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::of_kind(ErrorKind::Forbidden)
    }

    /// Creates a `NotFound` failure.
    #[must_use]
    pub fn not_found(message: Option<impl Into<String>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a `Conflict` failure.
    #[must_use]
    pub fn conflict(message: Option<impl Into<String>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Creates an `Expired` failure.
    #[must_use]
    pub fn expired(message: Option<impl Into<String>>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    /// Creates an `Internal` failure.
    #[must_use]
    pub fn internal(message: Option<impl Into<String>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Creates a `NotImplemented` failure.
    #[must_use]
    pub fn not_implemented(message: Option<impl Into<String>>) -> Self {
        Self::new(ErrorKind::NotImplemented, message)
    }

    /// Overrides the status fixed by the kind.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the failure kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the HTTP status of this failure.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Converts this failure into the record a boundary renderer emits.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            name: self.kind.name().to_string(),
            status: self.status.as_u16(),
            message: self.message.clone(),
        }
    }
}

impl From<anyhow::Error> for GuardError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!(error = %error, "internal fault converted to failure");
        Self::internal(None::<String>)
    }
}

/// Serializable failure record: `{name, status, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Kind name (`BadRequest`, `Unauthorized`, ...).
    pub name: String,
    /// HTTP status.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
}
