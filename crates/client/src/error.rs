// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors surfaced by the identity client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A constructor received input it cannot interpret.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The provider answered with a non-2xx status.
    #[error("provider returned {status}: {body}")]
    Http { status: u16, body: String },

    /// A 2xx response whose body is unparsable or incomplete.
    #[error("{message}")]
    InvalidResponse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A stored token string could not be decoded.
    #[error("{message}")]
    Decode {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// No token is present in the session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl Error {
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into(), source: None }
    }

    pub(crate) fn decode_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode { message: message.into(), source: Some(Box::new(source)) }
    }

    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse { message: message.into(), source: None }
    }

    pub(crate) fn invalid_response_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidResponse { message: message.into(), source: Some(Box::new(source)) }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Http { .. } => ErrorKind::Http,
            Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Provider status for [`Error::Http`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403, which callers should treat as "re-authenticate".
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidArgument,
    Http,
    InvalidResponse,
    Decode,
    NotAuthenticated,
    Transport,
}

impl ErrorKind {
    /// Status used when the adapter layer reports this error to a browser.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::NotAuthenticated => 401,
            Self::Decode => 400,
            Self::Http | Self::InvalidResponse | Self::Transport => 502,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Http => "HTTP_ERROR",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::Decode => "DECODE_ERROR",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Transport => "TRANSPORT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
