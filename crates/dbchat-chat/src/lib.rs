// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response normalization and conversation state for dbchat.
//!
//! Every heterogeneous backend payload — plain text, nested JSON tables,
//! 2-D arrays, binary blobs — is reshaped here into the uniform
//! [`dbchat_core::ChatMessage`] model, and [`session::ChatSession`] owns the
//! resulting conversation state.

pub mod answer;
pub mod normalize;
pub mod reply;
pub mod session;

pub use answer::{classify_answer, classify_exchange, rows_to_records, NO_RESPONSE_TEXT};
pub use normalize::{
    normalize_ai_table, normalize_bookmark, normalize_group, normalize_thread, BookmarkContext,
    SQL_TRACE_PREFIX,
};
pub use reply::{compose_question, display_text, is_greeting, original_question};
pub use session::{ChatSession, SendOutcome, SEND_ERROR_TEXT};
