// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the dbchat client.

use std::sync::Arc;

use thiserror::Error;

/// The primary error type used across the dbchat workspace.
#[derive(Debug, Error)]
pub enum DbChatError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The backend answered with a non-2xx status.
    #[error("api returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport failures (connection refused, DNS, TLS, body read).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend answered with a content type the client does not handle.
    #[error("unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// A response body could not be decoded into the expected shape.
    #[error("malformed response: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rejection observed by a caller that joined a deduplicated in-flight
    /// request. Every joiner of the same request sees the same underlying error.
    #[error("shared request failed: {source}")]
    Joined { source: Arc<DbChatError> },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DbChatError {
    /// Unwraps a shared error when this caller is the only one holding it,
    /// otherwise wraps it in [`DbChatError::Joined`].
    pub fn from_shared(err: Arc<DbChatError>) -> Self {
        match Arc::try_unwrap(err) {
            Ok(e) => e,
            Err(shared) => DbChatError::Joined { source: shared },
        }
    }

    /// True when the error carries an HTTP status in the 4xx range.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DbChatError::Http { status, .. } if (400..500).contains(status))
    }
}
