// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport layer for the ask_db backend.
//!
//! [`DbChatClient`] wraps every collaborator endpoint behind a typed method,
//! and [`cache::RequestCache`] collapses concurrent identical calls and
//! memoizes settled results for a short per-endpoint TTL.

pub mod cache;
pub mod client;
pub mod wire;

pub use cache::{cache_key, RequestCache};
pub use client::DbChatClient;
pub use wire::{
    AiTableDoc, AiTableSummary, AskBody, AskExchange, AskRequest, BookmarkDoc, HistoryEntry,
    HttpPayload, QueryGroup, QueryIds, RawUnit, ThreadDoc, UnitOrGroup,
};
