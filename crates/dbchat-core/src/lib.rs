// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the dbchat client workspace.
//!
//! Provides the error type and the shared domain types (chat message model,
//! answer union, query modes) used by the transport and normalizer crates.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DbChatError;
pub use types::{Answer, ChatMessage, ContentKind, QueryType, RawAnswer, Sender};
