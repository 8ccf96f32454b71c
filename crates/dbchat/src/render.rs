// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering for chat messages.
//!
//! Text answers print their display form, tabular answers render as an
//! aligned text table, and binary answers are written to the downloads
//! directory with the saved path printed instead.

use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use dbchat_chat::display_text;
use dbchat_core::{ChatMessage, ContentKind, RawAnswer, Sender};
use tracing::warn;

/// Prints one message to stdout, saving binary payloads under `downloads`.
pub fn print_message(message: &ChatMessage, downloads: &Path) {
    let prefix = match message.sender {
        Sender::User => "you".cyan().bold(),
        Sender::Bot => "bot".green().bold(),
    };
    let marker = if message.bookmarked { " *" } else { "" };

    match &message.raw_answer {
        Some(RawAnswer::Rows(rows)) => {
            println!("{prefix}{marker}:");
            print!("{}", format_rows(rows));
        }
        Some(RawAnswer::Records(records)) => {
            println!("{prefix}{marker}:");
            print!("{}", format_records(records));
        }
        Some(RawAnswer::Blob { mime, data }) => match save_blob(downloads, message.kind, mime, data)
        {
            Ok(path) => println!("{prefix}{marker}: saved {} answer to {}", message.kind, path.display()),
            Err(e) => {
                warn!(error = %e, "failed to save binary answer");
                println!("{prefix}{marker}: received a {} answer but could not save it: {e}", message.kind);
            }
        },
        None => println!("{prefix}{marker}: {}", display_text(&message.text)),
    }
}

/// Formats header-first rows as an aligned text table.
pub fn format_rows(rows: &[Vec<serde_json::Value>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    format_cells(&cells)
}

/// Formats records as an aligned text table, deriving the header from the
/// first record's keys.
pub fn format_records(records: &[serde_json::Map<String, serde_json::Value>]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };
    let columns: Vec<&String> = first.keys().collect();

    let mut cells = Vec::with_capacity(records.len() + 1);
    cells.push(columns.iter().map(|c| (*c).clone()).collect::<Vec<_>>());
    for record in records {
        cells.push(
            columns
                .iter()
                .map(|column| {
                    record
                        .get(*column)
                        .map(cell_text)
                        .unwrap_or_default()
                })
                .collect(),
        );
    }
    format_cells(&cells)
}

fn format_cells(cells: &[Vec<String>]) -> String {
    let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in cells {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            out.push_str(cell);
            if i + 1 < row.len() {
                for _ in cell.chars().count()..widths[i] {
                    out.push(' ');
                }
            }
        }
        out.push('\n');
    }
    out
}

fn cell_text(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Writes a binary answer into the downloads directory and returns its path.
pub fn save_blob(
    downloads: &Path,
    kind: ContentKind,
    mime: &str,
    data: &[u8],
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(downloads)?;
    let filename = format!(
        "answer-{}.{}",
        uuid::Uuid::new_v4(),
        extension_for(kind, mime)
    );
    let path = downloads.join(filename);
    let mut file = std::fs::File::create(&path)?;
    file.write_all(data)?;
    Ok(path)
}

fn extension_for(kind: ContentKind, mime: &str) -> &'static str {
    match kind {
        ContentKind::Pdf => "pdf",
        ContentKind::Xlsx => "xlsx",
        ContentKind::Docx => "docx",
        ContentKind::Audio => {
            if mime.contains("wav") {
                "wav"
            } else if mime.contains("ogg") {
                "ogg"
            } else {
                "mp3"
            }
        }
        _ => "bin",
    }
}
