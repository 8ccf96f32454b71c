// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of a single live ask exchange into the [`Answer`] union.
//!
//! The transport layer hands over either a JSON `answer` value or a binary
//! blob with its MIME type; this module decides text vs. tabular vs. file
//! once, at the boundary, so downstream code matches exhaustively.

use dbchat_client::AskBody;
use dbchat_core::{Answer, ContentKind};

/// Fallback text when the backend reply carries no answer at all.
pub const NO_RESPONSE_TEXT: &str = "No response received";

/// Classifies the body of one live exchange.
pub fn classify_exchange(body: &AskBody) -> Answer {
    match body {
        AskBody::Blob { mime, data } => Answer::Blob {
            kind: kind_for_mime(mime),
            mime: mime.clone(),
            data: data.clone(),
        },
        AskBody::Json(None) => Answer::Text(NO_RESPONSE_TEXT.to_string()),
        AskBody::Json(Some(answer)) => classify_answer(answer),
    }
}

/// Classifies a JSON `answer` value.
///
/// A 2-D array whose first row is all strings (a header row) passes through
/// as raw rows — no header conversion happens here; see [`rows_to_records`]
/// for the explicit conversion used elsewhere. An array of plain objects is
/// record data. Everything else is text.
pub fn classify_answer(answer: &serde_json::Value) -> Answer {
    match answer {
        serde_json::Value::Array(items) => {
            if let Some(rows) = as_header_rows(items) {
                Answer::Rows(rows)
            } else if let Some(records) = as_records(items) {
                Answer::Records(records)
            } else {
                Answer::Text(answer.to_string())
            }
        }
        serde_json::Value::String(s) => Answer::Text(s.clone()),
        serde_json::Value::Null => Answer::Text(NO_RESPONSE_TEXT.to_string()),
        other => Answer::Text(other.to_string()),
    }
}

/// Maps a binary answer MIME type to its display kind.
pub fn kind_for_mime(mime: &str) -> ContentKind {
    let mime = mime.to_ascii_lowercase();
    if mime.starts_with("audio/") {
        ContentKind::Audio
    } else if mime.starts_with("application/pdf") {
        ContentKind::Pdf
    } else if mime.starts_with("application/vnd.openxmlformats-officedocument.spreadsheetml") {
        ContentKind::Xlsx
    } else if mime.starts_with("application/vnd.openxmlformats-officedocument.wordprocessingml") {
        ContentKind::Docx
    } else {
        ContentKind::File
    }
}

/// Converts header-first rows into records keyed by the header cells.
///
/// This is the explicit conversion helper; the live-exchange classifier
/// keeps 2-D answers as raw rows.
pub fn rows_to_records(
    rows: &[Vec<serde_json::Value>],
) -> Vec<serde_json::Map<String, serde_json::Value>> {
    let Some((header, body)) = rows.split_first() else {
        return Vec::new();
    };
    let names: Vec<String> = header.iter().map(column_name).collect();
    body.iter()
        .map(|row| {
            names
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.clone(), cell.clone()))
                .collect()
        })
        .collect()
}

fn column_name(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A 2-D array qualifies as tabular when its first row is all strings.
fn as_header_rows(items: &[serde_json::Value]) -> Option<Vec<Vec<serde_json::Value>>> {
    let rows: Vec<&Vec<serde_json::Value>> = items
        .iter()
        .map(|item| match item {
            serde_json::Value::Array(cells) => Some(cells),
            _ => None,
        })
        .collect::<Option<_>>()?;

    let header = rows.first()?;
    if header.is_empty() || !header.iter().all(|c| c.is_string()) {
        return None;
    }
    Some(rows.into_iter().cloned().collect())
}

/// An array of plain objects is record data.
fn as_records(
    items: &[serde_json::Value],
) -> Option<Vec<serde_json::Map<String, serde_json::Value>>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| match item {
            serde_json::Value::Object(map) => Some(map.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn header_rows_pass_through_unconverted() {
        let answer = json!([["name", "age"], ["Alice", 30], ["Bob", 25]]);
        match classify_answer(&answer) {
            Answer::Rows(rows) => {
                assert_eq!(rows.len(), 3);
                assert_eq!(rows[0], vec![json!("name"), json!("age")]);
                assert_eq!(rows[1], vec![json!("Alice"), json!(30)]);
            }
            other => panic!("expected raw rows, got {other:?}"),
        }
    }

    #[test]
    fn rows_to_records_converts_headers_explicitly() {
        let rows = vec![
            vec![json!("name"), json!("age")],
            vec![json!("Alice"), json!(30)],
            vec![json!("Bob"), json!(25)],
        ];
        let records = rows_to_records(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], json!("Alice"));
        assert_eq!(records[0]["age"], json!(30));
        assert_eq!(records[1]["name"], json!("Bob"));
    }

    #[test]
    fn array_of_objects_classifies_as_records() {
        let answer = json!([{"vendor": "Acme", "total": 100}]);
        match classify_answer(&answer) {
            Answer::Records(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0]["vendor"], json!("Acme"));
            }
            other => panic!("expected records, got {other:?}"),
        }
    }

    #[test]
    fn array_without_header_row_is_text() {
        // First row is not all strings, so this is not tabular.
        let answer = json!([[1, 2], [3, 4]]);
        assert!(matches!(classify_answer(&answer), Answer::Text(_)));
    }

    #[test]
    fn plain_string_is_text() {
        assert_eq!(
            classify_answer(&json!("All good")),
            Answer::Text("All good".to_string())
        );
    }

    #[test]
    fn absent_answer_falls_back_to_no_response() {
        assert_eq!(
            classify_exchange(&AskBody::Json(None)),
            Answer::Text(NO_RESPONSE_TEXT.to_string())
        );
        assert_eq!(
            classify_answer(&serde_json::Value::Null),
            Answer::Text(NO_RESPONSE_TEXT.to_string())
        );
    }

    #[test]
    fn blob_mime_maps_to_kind() {
        assert_eq!(kind_for_mime("application/pdf"), ContentKind::Pdf);
        assert_eq!(kind_for_mime("audio/mpeg"), ContentKind::Audio);
        assert_eq!(
            kind_for_mime("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            ContentKind::Xlsx
        );
        assert_eq!(
            kind_for_mime("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            ContentKind::Docx
        );
        assert_eq!(kind_for_mime("application/zip"), ContentKind::File);
    }

    #[test]
    fn blob_exchange_keeps_bytes_and_mime() {
        let body = AskBody::Blob {
            mime: "audio/wav".into(),
            data: vec![1, 2, 3],
        };
        match classify_exchange(&body) {
            Answer::Blob { kind, mime, data } => {
                assert_eq!(kind, ContentKind::Audio);
                assert_eq!(mime, "audio/wav");
                assert_eq!(data, vec![1, 2, 3]);
            }
            other => panic!("expected blob, got {other:?}"),
        }
    }
}
