// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response types for the ask_db backend.
//!
//! Document shapes are decoded permissively: the backend nests message
//! arrays one or two levels deep depending on the source, and bookmark
//! query lists arrive as a single string or an array of strings. Both
//! forms are modeled with untagged enums here so downstream code never
//! shape-sniffs raw JSON.

use dbchat_core::QueryType;
use serde::{Deserialize, Serialize};

// --- Request types ---

/// JSON body for the ask endpoint.
///
/// The audio variant sends the same fields as multipart form fields plus
/// an `audio` file part.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    /// Identity of the asking user.
    pub user_id: String,

    /// The question, possibly composed with reply-chain context.
    pub question: String,

    /// Dashboard context, usually empty.
    pub dashboard: String,

    /// Tile context, usually empty.
    pub tile: String,

    /// Thread to continue; empty for a new conversation.
    pub thread_id: String,

    /// Bookmark name, empty unless bookmarking flow.
    pub bookmarkname: String,

    /// Bookmark id, empty unless bookmarking flow.
    pub bookmark_id: String,

    /// Query mode.
    pub query_type: QueryType,

    /// Present only when operating inside an AI-table (folder) context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_table: Option<String>,
}

impl AskRequest {
    /// Creates a request with the bookkeeping fields empty.
    pub fn new(
        user_id: impl Into<String>,
        question: impl Into<String>,
        query_type: QueryType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            question: question.into(),
            dashboard: String::new(),
            tile: String::new(),
            thread_id: String::new(),
            bookmarkname: String::new(),
            bookmark_id: String::new(),
            query_type,
            ai_table: None,
        }
    }

    /// Continues an existing thread.
    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    /// Scopes the question to an AI table (folder) context.
    pub fn with_ai_table(mut self, ai_table: impl Into<String>) -> Self {
        self.ai_table = Some(ai_table.into());
        self
    }
}

// --- Transport payloads ---

/// Decoded body of one backend response, selected by transport content type.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpPayload {
    /// `application/json` body.
    Json(serde_json::Value),
    /// Binary body (pdf, office documents, audio).
    Blob { content_type: String, data: Vec<u8> },
}

impl HttpPayload {
    /// Returns the JSON value, or a decode error description for blobs.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            HttpPayload::Json(v) => Some(v),
            HttpPayload::Blob { .. } => None,
        }
    }
}

/// One live ask exchange: backend-assigned identifiers plus the answer body.
#[derive(Debug, Clone)]
pub struct AskExchange {
    /// Backend-assigned query id, absent for blob replies.
    pub query_id: Option<String>,
    /// Thread id, assigned by the backend on the first exchange.
    pub thread_id: Option<String>,
    /// The answer payload.
    pub body: AskBody,
}

/// Answer payload of a live exchange, prior to classification.
#[derive(Debug, Clone)]
pub enum AskBody {
    /// The JSON `answer` field; `None` when the field is absent.
    Json(Option<serde_json::Value>),
    /// A binary answer with its MIME type.
    Blob { mime: String, data: Vec<u8> },
}

// --- Document types ---

/// One raw message unit inside a query group.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUnit {
    /// Role field: `user` maps to the user sender, anything else to bot.
    #[serde(default)]
    pub role: Option<String>,

    /// Plain content, when present a string.
    #[serde(default)]
    pub content: Option<serde_json::Value>,

    /// Structured or plain results payload.
    #[serde(default)]
    pub results: Option<serde_json::Value>,

    /// Internal marker; units carrying it are dropped during normalization.
    #[serde(default)]
    pub table_used: Option<serde_json::Value>,
}

/// A message entry that is either a single unit or a nested group of units.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UnitOrGroup {
    Unit(RawUnit),
    Group(Vec<RawUnit>),
}

/// One backend-assigned exchange unit within a thread or table.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryGroup {
    pub query_id: String,
    #[serde(default)]
    pub messages: Vec<UnitOrGroup>,
}

/// A fetched thread document: ordered list of query groups.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadDoc {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub queries: Vec<QueryGroup>,
}

/// A fetched AI-table (folder) document.
#[derive(Debug, Clone, Deserialize)]
pub struct AiTableDoc {
    #[serde(default)]
    pub ai_table: String,
    #[serde(default)]
    pub queries: Vec<QueryGroup>,
}

/// Entry in the AI-table listing.
#[derive(Debug, Clone, Deserialize)]
pub struct AiTableSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Query ids referenced by a bookmark: a single id or an array of ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryIds {
    One(String),
    Many(Vec<String>),
}

impl Default for QueryIds {
    fn default() -> Self {
        QueryIds::Many(Vec::new())
    }
}

impl QueryIds {
    /// True when the bookmark references the given query id.
    pub fn contains(&self, query_id: &str) -> bool {
        match self {
            QueryIds::One(id) => id == query_id,
            QueryIds::Many(ids) => ids.iter().any(|id| id == query_id),
        }
    }

    /// Iterates over the referenced query ids.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            QueryIds::One(id) => std::slice::from_ref(id).iter(),
            QueryIds::Many(ids) => ids.iter(),
        }
        .map(String::as_str)
    }
}

/// A named, user-curated collection of query ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkDoc {
    pub bookmark_id: String,
    #[serde(default)]
    pub bookmarkname: String,
    #[serde(default)]
    pub query_ids: QueryIds,
}

/// Entry in the user history listing.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub thread_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_request_serializes_all_fields() {
        let req = AskRequest::new("u1", "Top 5 vendors", QueryType::DbQuery).with_thread("t1");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["question"], "Top 5 vendors");
        assert_eq!(json["query_type"], "DB_QUERY");
        assert_eq!(json["thread_id"], "t1");
        assert_eq!(json["dashboard"], "");
        assert_eq!(json["bookmarkname"], "");
        assert!(json.get("ai_table").is_none());
    }

    #[test]
    fn ask_request_includes_ai_table_when_set() {
        let req = AskRequest::new("u1", "q", QueryType::Chat).with_ai_table("vendors");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["ai_table"], "vendors");
    }

    #[test]
    fn thread_doc_decodes_nested_and_flat_messages() {
        let json = serde_json::json!({
            "thread_id": "t1",
            "queries": [{
                "query_id": "q1",
                "messages": [
                    {"role": "user", "content": "hello"},
                    [{"role": "assistant", "content": "hi"}, {"role": "assistant", "content": "again"}]
                ]
            }]
        });
        let doc: ThreadDoc = serde_json::from_value(json).unwrap();
        assert_eq!(doc.queries.len(), 1);
        let group = &doc.queries[0];
        assert!(matches!(group.messages[0], UnitOrGroup::Unit(_)));
        match &group.messages[1] {
            UnitOrGroup::Group(units) => assert_eq!(units.len(), 2),
            _ => panic!("expected nested group"),
        }
    }

    #[test]
    fn query_ids_decodes_both_wire_forms() {
        let single: QueryIds = serde_json::from_str("\"q1\"").unwrap();
        assert!(single.contains("q1"));
        assert!(!single.contains("q2"));

        let many: QueryIds = serde_json::from_str("[\"q1\", \"q2\"]").unwrap();
        assert!(many.contains("q2"));
        assert_eq!(many.iter().collect::<Vec<_>>(), vec!["q1", "q2"]);
    }

    #[test]
    fn bookmark_doc_defaults_missing_fields() {
        let doc: BookmarkDoc =
            serde_json::from_str(r#"{"bookmark_id": "b1"}"#).unwrap();
        assert_eq!(doc.bookmark_id, "b1");
        assert!(doc.bookmarkname.is_empty());
        assert!(!doc.query_ids.contains("q1"));
    }
}
