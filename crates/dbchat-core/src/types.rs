// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the dbchat workspace.
//!
//! The central type is [`ChatMessage`], the uniform unit every backend
//! payload shape is normalized into before display.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Display class of a message's payload.
///
/// `Tabular` and `Table` are distinct on the wire (the backend declares
/// either for row data) and are both rendered as row/column output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentKind {
    Text,
    Tabular,
    Table,
    Audio,
    Pdf,
    Xlsx,
    Docx,
    File,
}

/// Query mode sent with every ask request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Chat,
    DbQuery,
    Scrap,
}

/// Non-text payload carried by a message alongside (or instead of) its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawAnswer {
    /// Row/column data as received: first row may be a header row.
    Rows(Vec<Vec<serde_json::Value>>),
    /// Row data already keyed by column name.
    Records(Vec<serde_json::Map<String, serde_json::Value>>),
    /// Downloaded binary payload (pdf, xlsx, docx, audio).
    Blob { mime: String, data: Vec<u8> },
}

/// One backend answer, decoded into an explicit union at the transport
/// boundary so downstream code matches exhaustively instead of shape-sniffing.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Text(String),
    Rows(Vec<Vec<serde_json::Value>>),
    Records(Vec<serde_json::Map<String, serde_json::Value>>),
    Blob {
        kind: ContentKind,
        mime: String,
        data: Vec<u8>,
    },
}

/// The uniform chat message model every payload source normalizes into.
///
/// Invariants: `reply_to` only ever references a message that appears earlier
/// in the same array, and `query_id` is set only after a backend round-trip
/// has assigned one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique within a session: query id plus index within the query's group.
    pub id: String,
    pub sender: Sender,
    /// Primary displayable content; empty when the payload is `raw_answer` only.
    pub text: String,
    /// RFC 3339, stamped with the client clock at normalization time.
    pub timestamp: String,
    pub kind: ContentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_answer: Option<RawAnswer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub bookmarked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<String>,
}

impl ChatMessage {
    /// Creates a text message stamped with the current client clock.
    pub fn text(id: impl Into<String>, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sender,
            text: text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind: ContentKind::Text,
            raw_answer: None,
            query_id: None,
            reply_to: None,
            bookmarked: false,
            bookmark_id: None,
        }
    }
}
