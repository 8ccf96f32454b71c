// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request cache and dedup layer.
//!
//! Collapses concurrent identical backend calls into one underlying request
//! and memoizes settled results for a short, per-endpoint TTL. The cache is
//! a constructor-injected service, not a module-level singleton, so tests
//! control time (tokio's paused clock) and isolate state per case.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dbchat_core::DbChatError;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tracing::trace;

use crate::wire::HttpPayload;

/// The settled outcome every joiner of a deduplicated request observes.
pub type CachedResult = Result<Arc<HttpPayload>, Arc<DbChatError>>;

type Inflight = Shared<BoxFuture<'static, CachedResult>>;

/// Builds the canonical cache key for an endpoint and payload.
///
/// The payload is serialized through `serde_json::Value`, whose object map
/// sorts keys, so deeply equal payloads with different key order produce
/// the same key. Parameterless endpoints pass `()` and get a fixed literal.
pub fn cache_key<T: Serialize>(endpoint: &str, payload: &T) -> Result<String, DbChatError> {
    let value = serde_json::to_value(payload).map_err(|e| DbChatError::Internal(format!(
        "unserializable cache payload for `{endpoint}`: {e}"
    )))?;
    Ok(format!("{endpoint}:{value}"))
}

/// Process-wide map from canonical request key to a shared in-flight future.
///
/// Entries are created on first call, shared by every concurrent identical
/// call, and evicted a fixed delay after the underlying call settles —
/// success or failure — with no refresh-on-access.
#[derive(Clone, Default)]
pub struct RequestCache {
    entries: Arc<DashMap<String, Inflight>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared future for `key`, creating it from `fetch` on a miss.
    ///
    /// The unsettled future is stored before it is first polled, so a second
    /// caller arriving while the request is in flight joins it and observes
    /// the identical resolution or rejection. Eviction is scheduled when the
    /// future settles and fires after `ttl` regardless of outcome, so failed
    /// calls do not serve stale errors to late joiners.
    pub async fn get_or_join<F>(&self, key: &str, ttl: Duration, fetch: F) -> CachedResult
    where
        F: Future<Output = Result<HttpPayload, DbChatError>> + Send + 'static,
    {
        let shared = match self.entries.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                trace!(key, "joining cached or in-flight request");
                entry.get().clone()
            }
            Entry::Vacant(slot) => {
                let entries = Arc::clone(&self.entries);
                let evict_key = key.to_string();
                let wrapped = async move {
                    let result = fetch.await.map(Arc::new).map_err(Arc::new);
                    tokio::spawn(async move {
                        tokio::time::sleep(ttl).await;
                        // Delete-if-present: an explicit invalidation may have
                        // removed the entry already.
                        entries.remove(&evict_key);
                    });
                    result
                }
                .boxed()
                .shared();
                slot.insert(wrapped.clone());
                wrapped
            }
        };

        shared.await
    }

    /// Removes every entry whose key contains the given substring.
    ///
    /// Called after mutations (bookmark create/update/delete, thread
    /// rename/delete) so the next read bypasses the cache.
    pub fn invalidate(&self, pattern: &str) {
        self.entries.retain(|key, _| !key.contains(pattern));
    }

    /// Removes all entries.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    /// Number of live entries (in-flight or awaiting eviction).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
