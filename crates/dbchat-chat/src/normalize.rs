// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of fetched documents into [`ChatMessage`] records.
//!
//! Threads, AI tables, and bookmarks all deliver the same nested query/unit
//! structure with slightly different bookmark semantics. Every unit passes
//! through the same extraction priority; internal markers (SQL trace dumps,
//! `table_used` flags) and empty units never produce a message.

use std::str::FromStr;

use dbchat_client::{AiTableDoc, BookmarkDoc, QueryGroup, RawUnit, ThreadDoc, UnitOrGroup};
use dbchat_core::{ChatMessage, ContentKind, RawAnswer, Sender};

/// Prefix marking an internal SQL trace dump; such units are dropped.
pub const SQL_TRACE_PREFIX: &str = "SQL Generated by LLM:";

/// Bookmark semantics of the document source being normalized.
#[derive(Debug, Clone, Copy)]
pub enum BookmarkContext<'a> {
    /// AI-table (folder) messages are never auto-bookmarked.
    None,
    /// Thread messages are bookmarked only when the query id appears in the
    /// known bookmark collection.
    Known(&'a [BookmarkDoc]),
    /// Bookmark-sourced messages are always bookmarked with this id.
    Forced(&'a str),
}

/// Normalizes a thread document, cross-referencing the bookmark collection.
pub fn normalize_thread(doc: &ThreadDoc, bookmarks: &[BookmarkDoc]) -> Vec<ChatMessage> {
    doc.queries
        .iter()
        .flat_map(|group| normalize_group(group, BookmarkContext::Known(bookmarks)))
        .collect()
}

/// Normalizes an AI-table (folder) document; messages default to not bookmarked.
pub fn normalize_ai_table(doc: &AiTableDoc) -> Vec<ChatMessage> {
    doc.queries
        .iter()
        .flat_map(|group| normalize_group(group, BookmarkContext::None))
        .collect()
}

/// Normalizes the query groups of a bookmark; every message carries the
/// bookmark's id and is marked bookmarked.
pub fn normalize_bookmark(bookmark: &BookmarkDoc, groups: &[QueryGroup]) -> Vec<ChatMessage> {
    groups
        .iter()
        .flat_map(|group| normalize_group(group, BookmarkContext::Forced(&bookmark.bookmark_id)))
        .collect()
}

/// Normalizes one query group: flattens nested unit arrays and converts each
/// surviving unit, indexing ids zero-based within the flattened group.
pub fn normalize_group(group: &QueryGroup, context: BookmarkContext<'_>) -> Vec<ChatMessage> {
    flatten_units(&group.messages)
        .into_iter()
        .enumerate()
        .filter_map(|(index, unit)| unit_to_message(unit, &group.query_id, index, context))
        .collect()
}

/// Flattens the one-or-two-level nesting of a message array.
fn flatten_units(messages: &[UnitOrGroup]) -> Vec<&RawUnit> {
    let mut units = Vec::new();
    for entry in messages {
        match entry {
            UnitOrGroup::Unit(unit) => units.push(unit),
            UnitOrGroup::Group(group) => units.extend(group.iter()),
        }
    }
    units
}

/// Converts one raw unit into a message, or `None` when the unit is
/// internal/system content or has nothing displayable.
fn unit_to_message(
    unit: &RawUnit,
    query_id: &str,
    index: usize,
    context: BookmarkContext<'_>,
) -> Option<ChatMessage> {
    // Internal markers never enter the message array.
    if unit.table_used.is_some() {
        return None;
    }
    if let Some(serde_json::Value::String(content)) = &unit.content {
        if content.starts_with(SQL_TRACE_PREFIX) {
            return None;
        }
    }

    let sender = match unit.role.as_deref() {
        Some("user") => Sender::User,
        _ => Sender::Bot,
    };

    let (text, kind, raw_answer) = match extract_content(unit)? {
        Extracted::Text(text) => (text, ContentKind::Text, None),
        Extracted::Table { rows, kind } => {
            (String::new(), kind, Some(RawAnswer::Rows(rows)))
        }
    };

    let mut message = ChatMessage::text(format!("{query_id}-{index}"), sender, text);
    message.kind = kind;
    message.raw_answer = raw_answer;
    message.query_id = Some(query_id.to_string());

    match context {
        BookmarkContext::None => {}
        BookmarkContext::Known(bookmarks) => {
            if let Some(bookmark) = bookmarks
                .iter()
                .find(|b| b.query_ids.contains(query_id))
            {
                message.bookmarked = true;
                message.bookmark_id = Some(bookmark.bookmark_id.clone());
            }
        }
        BookmarkContext::Forced(bookmark_id) => {
            message.bookmarked = true;
            message.bookmark_id = Some(bookmark_id.to_string());
        }
    }

    Some(message)
}

enum Extracted {
    Text(String),
    Table {
        rows: Vec<Vec<serde_json::Value>>,
        kind: ContentKind,
    },
}

/// Extraction priority, first match wins:
/// 1. a plain string `content` field;
/// 2. a plain non-empty string `results` field;
/// 3. a structured `results` object whose `data` (or doubly nested
///    `data.data`) is either text or row data.
///
/// Returns `None` when nothing displayable remains.
fn extract_content(unit: &RawUnit) -> Option<Extracted> {
    // An empty content string is treated as absent so a structured results
    // payload can still be picked up.
    if let Some(serde_json::Value::String(content)) = &unit.content {
        if !content.trim().is_empty() {
            return non_empty_text(content);
        }
    }

    match &unit.results {
        Some(serde_json::Value::String(results)) => non_empty_text(results),
        Some(serde_json::Value::Object(results)) => extract_structured(results),
        _ => None,
    }
}

fn extract_structured(
    results: &serde_json::Map<String, serde_json::Value>,
) -> Option<Extracted> {
    let declared = results.get("type").and_then(serde_json::Value::as_str);
    let data = results.get("data")?;

    if declared == Some("text") {
        if let serde_json::Value::String(text) = data {
            return non_empty_text(text);
        }
    }

    // Tolerate the doubly nested `data.data` shape.
    let payload = match data {
        serde_json::Value::Object(inner) => inner.get("data").unwrap_or(data),
        _ => data,
    };

    match payload {
        serde_json::Value::Array(rows) => {
            if rows.is_empty() {
                return None;
            }
            let rows = rows
                .iter()
                .map(|row| match row {
                    serde_json::Value::Array(cells) => cells.iter().map(coerce_cell).collect(),
                    other => vec![coerce_cell(other)],
                })
                .collect();
            let kind = declared
                .and_then(|d| ContentKind::from_str(d).ok())
                .unwrap_or(ContentKind::Tabular);
            Some(Extracted::Table { rows, kind })
        }
        serde_json::Value::String(text) => non_empty_text(text),
        _ => None,
    }
}

fn non_empty_text(text: &str) -> Option<Extracted> {
    if text.trim().is_empty() {
        None
    } else {
        Some(Extracted::Text(text.to_string()))
    }
}

/// Coerces one cell to primitive form. Numeric wrapper objects (a single
/// field holding a primitive) are converted via their string representation;
/// other composites are stringified wholesale.
fn coerce_cell(cell: &serde_json::Value) -> serde_json::Value {
    match cell {
        serde_json::Value::Object(map) => match map.values().next() {
            Some(inner) if map.len() == 1 => match inner {
                serde_json::Value::String(s) => serde_json::Value::String(s.clone()),
                serde_json::Value::Number(n) => serde_json::Value::String(n.to_string()),
                serde_json::Value::Bool(b) => serde_json::Value::String(b.to_string()),
                other => serde_json::Value::String(other.to_string()),
            },
            _ => serde_json::Value::String(cell.to_string()),
        },
        serde_json::Value::Array(_) => serde_json::Value::String(cell.to_string()),
        primitive => primitive.clone(),
    }
}
