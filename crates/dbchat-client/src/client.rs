// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the ask_db backend.
//!
//! Provides [`DbChatClient`] which handles request construction, content-type
//! dispatch, and short-lived caching/dedup of read endpoints. Mutating
//! endpoints bypass the cache and invalidate the affected entries so the
//! next read refetches.

use std::sync::Arc;
use std::time::Duration;

use dbchat_config::DbChatConfig;
use dbchat_core::DbChatError;
use tracing::debug;

use crate::cache::{cache_key, RequestCache};
use crate::wire::{
    AiTableDoc, AiTableSummary, AskBody, AskExchange, AskRequest, BookmarkDoc, HistoryEntry,
    HttpPayload, QueryGroup, ThreadDoc,
};

// Per-endpoint cache durations. Policy constants, not computed: short for
// frequently-changing lists, longer for single-entity fetches by id.
const TTL_HISTORY: Duration = Duration::from_secs(2);
const TTL_ASK: Duration = Duration::from_secs(5);
const TTL_QUERY: Duration = Duration::from_secs(10);
const TTL_THREAD: Duration = Duration::from_secs(15);
const TTL_AI_TABLE: Duration = Duration::from_secs(15);
const TTL_DASHBOARD: Duration = Duration::from_secs(30);

/// HTTP client for backend communication.
///
/// Cheap to clone; the underlying connection pool and request cache are
/// shared between clones.
#[derive(Clone)]
pub struct DbChatClient {
    http: reqwest::Client,
    base_url: String,
    cache: RequestCache,
}

impl DbChatClient {
    /// Creates a client from configuration.
    pub fn new(config: &DbChatConfig) -> Result<Self, DbChatError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(|e| DbChatError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            cache: RequestCache::new(),
        })
    }

    /// The request cache, exposed for explicit invalidation by callers.
    pub fn cache(&self) -> &RequestCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // --- ask endpoint ---

    /// Sends one ask exchange as JSON.
    ///
    /// Identical concurrent calls (same payload, keys in any order) collapse
    /// into one underlying request; the settled result is served for a short
    /// TTL afterwards.
    pub async fn ask(&self, request: &AskRequest) -> Result<AskExchange, DbChatError> {
        let key = cache_key("ask", request)?;
        let builder = self.http.post(self.url("/ask_db")).json(request);
        let payload = self
            .cache
            .get_or_join(&key, TTL_ASK, fetch_payload(builder))
            .await
            .map_err(DbChatError::from_shared)?;
        debug!(query_type = %request.query_type, "ask exchange complete");
        Ok(exchange_from_payload(&payload))
    }

    /// Sends one ask exchange as multipart form data with an audio part.
    ///
    /// Audio sends are never deduplicated: the payload carries a recording
    /// that is unique per attempt.
    pub async fn ask_audio(
        &self,
        request: &AskRequest,
        audio: Vec<u8>,
        filename: &str,
        mime: &str,
    ) -> Result<AskExchange, DbChatError> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| DbChatError::Transport {
                message: format!("invalid audio mime type `{mime}`: {e}"),
                source: Some(Box::new(e)),
            })?;

        let mut form = reqwest::multipart::Form::new()
            .text("user_id", request.user_id.clone())
            .text("question", request.question.clone())
            .text("dashboard", request.dashboard.clone())
            .text("tile", request.tile.clone())
            .text("thread_id", request.thread_id.clone())
            .text("bookmarkname", request.bookmarkname.clone())
            .text("bookmark_id", request.bookmark_id.clone())
            .text("query_type", request.query_type.to_string())
            .part("audio", part);
        if let Some(ai_table) = &request.ai_table {
            form = form.text("ai_table", ai_table.clone());
        }

        let builder = self.http.post(self.url("/ask_db")).multipart(form);
        let payload = fetch_payload(builder).await?;
        Ok(exchange_from_payload(&payload))
    }

    // --- cached reads ---

    /// Fetches a thread document by id.
    pub async fn thread(&self, thread_id: &str) -> Result<ThreadDoc, DbChatError> {
        let key = cache_key("thread", &serde_json::json!({ "thread_id": thread_id }))?;
        let payload = self
            .cached_get(format!("/thread/{thread_id}"), key, TTL_THREAD)
            .await?;
        decode_json(&payload, "thread document")
    }

    /// Fetches an AI-table (folder) document by id.
    pub async fn ai_table(&self, table_id: &str) -> Result<AiTableDoc, DbChatError> {
        let key = cache_key("ai_table", &serde_json::json!({ "table_id": table_id }))?;
        let payload = self
            .cached_get(format!("/ai_table/{table_id}"), key, TTL_AI_TABLE)
            .await?;
        decode_json(&payload, "ai table document")
    }

    /// Fetches a single query group by backend query id.
    pub async fn query(&self, query_id: &str) -> Result<QueryGroup, DbChatError> {
        let key = cache_key("query", &serde_json::json!({ "query_id": query_id }))?;
        let payload = self
            .cached_get(format!("/query/{query_id}"), key, TTL_QUERY)
            .await?;
        decode_json(&payload, "query document")
    }

    /// Lists the user's conversation history.
    pub async fn history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, DbChatError> {
        let key = cache_key("history", &serde_json::json!({ "user_id": user_id }))?;
        let payload = self
            .cached_get(format!("/history/{user_id}"), key, TTL_HISTORY)
            .await?;
        decode_json(&payload, "history listing")
    }

    /// Lists the user's AI tables.
    pub async fn ai_tables(&self, user_id: &str) -> Result<Vec<AiTableSummary>, DbChatError> {
        let key = cache_key("ai_tables", &serde_json::json!({ "user_id": user_id }))?;
        let payload = self
            .cached_get(format!("/ai_tables/{user_id}"), key, TTL_HISTORY)
            .await?;
        decode_json(&payload, "ai table listing")
    }

    /// Lists the user's bookmarks.
    pub async fn bookmarks(&self, user_id: &str) -> Result<Vec<BookmarkDoc>, DbChatError> {
        let key = cache_key("bookmarks", &serde_json::json!({ "user_id": user_id }))?;
        let payload = self
            .cached_get(format!("/bookmarks/{user_id}"), key, TTL_HISTORY)
            .await?;
        decode_json(&payload, "bookmark listing")
    }

    /// Fetches the user's dashboard document. The shape is backend-defined
    /// and passed through opaquely.
    pub async fn dashboard(&self, user_id: &str) -> Result<serde_json::Value, DbChatError> {
        let key = cache_key("dashboard", &serde_json::json!({ "user_id": user_id }))?;
        let payload = self
            .cached_get(format!("/dashboard/{user_id}"), key, TTL_DASHBOARD)
            .await?;
        payload
            .as_json()
            .cloned()
            .ok_or_else(|| DbChatError::Decode {
                message: "dashboard: expected JSON body, got binary".into(),
                source: None,
            })
    }

    // --- mutations (uncached, invalidate affected reads) ---

    /// Creates a bookmark over a query id.
    pub async fn create_bookmark(
        &self,
        user_id: &str,
        name: &str,
        query_id: &str,
    ) -> Result<serde_json::Value, DbChatError> {
        let body = serde_json::json!({
            "user_id": user_id,
            "bookmarkname": name,
            "query_id": query_id,
        });
        let result = self
            .send_json(self.http.post(self.url("/bookmark")).json(&body))
            .await?;
        self.cache.invalidate("bookmark");
        Ok(result)
    }

    /// Adds a query id to an existing bookmark (or renames it).
    pub async fn update_bookmark(
        &self,
        bookmark_id: &str,
        name: &str,
        query_id: Option<&str>,
    ) -> Result<serde_json::Value, DbChatError> {
        let body = serde_json::json!({
            "bookmarkname": name,
            "query_id": query_id,
        });
        let result = self
            .send_json(
                self.http
                    .put(self.url(&format!("/bookmark/{bookmark_id}")))
                    .json(&body),
            )
            .await?;
        self.cache.invalidate("bookmark");
        Ok(result)
    }

    /// Deletes a bookmark.
    pub async fn delete_bookmark(&self, bookmark_id: &str) -> Result<(), DbChatError> {
        self.send_json(
            self.http
                .delete(self.url(&format!("/bookmark/{bookmark_id}"))),
        )
        .await?;
        self.cache.invalidate("bookmark");
        Ok(())
    }

    /// Deletes a thread.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<(), DbChatError> {
        self.send_json(self.http.delete(self.url(&format!("/thread/{thread_id}"))))
            .await?;
        self.cache.invalidate("thread");
        self.cache.invalidate("history");
        Ok(())
    }

    /// Renames a thread.
    pub async fn rename_thread(&self, thread_id: &str, name: &str) -> Result<(), DbChatError> {
        let body = serde_json::json!({ "name": name });
        self.send_json(
            self.http
                .post(self.url(&format!("/thread/{thread_id}/rename")))
                .json(&body),
        )
        .await?;
        self.cache.invalidate("thread");
        self.cache.invalidate("history");
        Ok(())
    }

    /// Creates the user's dashboard document.
    pub async fn create_dashboard(
        &self,
        user_id: &str,
        dashboard: &serde_json::Value,
    ) -> Result<(), DbChatError> {
        self.send_json(
            self.http
                .post(self.url(&format!("/dashboard/{user_id}")))
                .json(dashboard),
        )
        .await?;
        self.cache.invalidate("dashboard");
        Ok(())
    }

    /// Updates the user's dashboard document.
    pub async fn update_dashboard(
        &self,
        user_id: &str,
        dashboard: &serde_json::Value,
    ) -> Result<(), DbChatError> {
        self.send_json(
            self.http
                .put(self.url(&format!("/dashboard/{user_id}")))
                .json(dashboard),
        )
        .await?;
        self.cache.invalidate("dashboard");
        Ok(())
    }

    // --- plumbing ---

    async fn cached_get(
        &self,
        path: String,
        key: String,
        ttl: Duration,
    ) -> Result<Arc<HttpPayload>, DbChatError> {
        let builder = self.http.get(self.url(&path));
        self.cache
            .get_or_join(&key, ttl, fetch_payload(builder))
            .await
            .map_err(DbChatError::from_shared)
    }

    /// Sends a mutating request, tolerating empty response bodies.
    async fn send_json(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, DbChatError> {
        let response = builder.send().await.map_err(|e| DbChatError::Transport {
            message: format!("request failed: {e}"),
            source: Some(Box::new(e)),
        })?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DbChatError::Http {
                status: status.as_u16(),
                message: body,
            });
        }
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| DbChatError::Decode {
            message: format!("invalid JSON body: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

/// Issues one HTTP request and decodes the body by transport content type.
///
/// Unrecognized content types are an explicit rejection, never silently
/// swallowed.
async fn fetch_payload(builder: reqwest::RequestBuilder) -> Result<HttpPayload, DbChatError> {
    let response = builder.send().await.map_err(|e| DbChatError::Transport {
        message: format!("request failed: {e}"),
        source: Some(Box::new(e)),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DbChatError::Http {
            status: status.as_u16(),
            message: body,
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let body = response.text().await.map_err(|e| DbChatError::Transport {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        let value = serde_json::from_str(&body).map_err(|e| DbChatError::Decode {
            message: format!("invalid JSON body: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(HttpPayload::Json(value))
    } else if is_binary_answer(&content_type) {
        let data = response
            .bytes()
            .await
            .map_err(|e| DbChatError::Transport {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?
            .to_vec();
        Ok(HttpPayload::Blob { content_type, data })
    } else {
        Err(DbChatError::UnsupportedContentType { content_type })
    }
}

/// Content types the backend uses for binary answers.
fn is_binary_answer(content_type: &str) -> bool {
    content_type.starts_with("audio/")
        || content_type.starts_with("application/pdf")
        || content_type
            .starts_with("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        || content_type
            .starts_with("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
}

/// Splits one decoded payload into backend identifiers plus the answer body.
fn exchange_from_payload(payload: &HttpPayload) -> AskExchange {
    match payload {
        HttpPayload::Json(body) => AskExchange {
            query_id: string_field(body, "query_id"),
            thread_id: string_field(body, "thread_id"),
            body: AskBody::Json(body.get("answer").cloned()),
        },
        HttpPayload::Blob { content_type, data } => AskExchange {
            query_id: None,
            thread_id: None,
            body: AskBody::Blob {
                mime: content_type.clone(),
                data: data.clone(),
            },
        },
    }
}

/// Reads a string-ish identifier field, tolerating numeric ids.
fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(
    payload: &HttpPayload,
    what: &str,
) -> Result<T, DbChatError> {
    let value = payload.as_json().ok_or_else(|| DbChatError::Decode {
        message: format!("{what}: expected JSON body, got binary"),
        source: None,
    })?;
    serde_json::from_value(value.clone()).map_err(|e| DbChatError::Decode {
        message: format!("{what}: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use dbchat_core::QueryType;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(base_url: &str) -> DbChatClient {
        let mut config = DbChatConfig::default();
        config.api.base_url = base_url.to_string();
        DbChatClient::new(&config).unwrap()
    }

    fn ask_request(question: &str) -> AskRequest {
        AskRequest::new("u1", question, QueryType::DbQuery)
    }

    #[tokio::test]
    async fn ask_returns_json_exchange() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "query_id": "q1",
            "thread_id": "t1",
            "answer": [["vendor", "total"], ["Acme", 100]]
        });
        Mock::given(method("POST"))
            .and(path("/ask_db"))
            .and(body_partial_json(serde_json::json!({
                "question": "Top 5 vendors",
                "query_type": "DB_QUERY"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let exchange = client.ask(&ask_request("Top 5 vendors")).await.unwrap();
        assert_eq!(exchange.query_id.as_deref(), Some("q1"));
        assert_eq!(exchange.thread_id.as_deref(), Some("t1"));
        match exchange.body {
            AskBody::Json(Some(answer)) => assert!(answer.is_array()),
            other => panic!("expected JSON answer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_identical_asks_hit_backend_once() {
        let server = MockServer::start().await;
        let body = serde_json::json!({ "query_id": "q1", "answer": "hi" });
        Mock::given(method("POST"))
            .and(path("/ask_db"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let req_a = ask_request("same question");
        let req_b = ask_request("same question");
        let (a, b) = tokio::join!(
            client.ask(&req_a),
            client.ask(&req_b),
        );
        assert_eq!(a.unwrap().query_id.as_deref(), Some("q1"));
        assert_eq!(b.unwrap().query_id.as_deref(), Some("q1"));
    }

    #[tokio::test]
    async fn distinct_payloads_are_not_deduplicated() {
        let server = MockServer::start().await;
        let body = serde_json::json!({ "query_id": "q1", "answer": "hi" });
        Mock::given(method("POST"))
            .and(path("/ask_db"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.ask(&ask_request("first")).await.unwrap();
        client.ask(&ask_request("second")).await.unwrap();
    }

    #[tokio::test]
    async fn non_2xx_rejects_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask_db"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.ask(&ask_request("q")).await.unwrap_err();
        match err {
            DbChatError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Http error, got {other}"),
        }
    }

    #[tokio::test]
    async fn unrecognized_content_type_rejects() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask_db"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.ask(&ask_request("q")).await.unwrap_err();
        assert!(matches!(err, DbChatError::UnsupportedContentType { .. }));
    }

    #[tokio::test]
    async fn pdf_reply_is_a_blob_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask_db"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.4".to_vec()),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let exchange = client.ask(&ask_request("export")).await.unwrap();
        assert!(exchange.query_id.is_none());
        match exchange.body {
            AskBody::Blob { mime, data } => {
                assert_eq!(mime, "application/pdf");
                assert_eq!(&data[..4], b"%PDF");
            }
            other => panic!("expected blob, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn audio_ask_posts_multipart_and_decodes_reply() {
        let server = MockServer::start().await;
        let body = serde_json::json!({ "query_id": "q9", "thread_id": "t9", "answer": "heard you" });
        Mock::given(method("POST"))
            .and(path("/ask_db"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let exchange = client
            .ask_audio(&ask_request(""), vec![0u8; 16], "question.wav", "audio/wav")
            .await
            .unwrap();
        assert_eq!(exchange.query_id.as_deref(), Some("q9"));
        match exchange.body {
            AskBody::Json(Some(answer)) => assert_eq!(answer, "heard you"),
            other => panic!("expected JSON answer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn audio_ask_rejects_malformed_mime() {
        let server = MockServer::start().await;
        let client = test_client(&server.uri());
        let err = client
            .ask_audio(&ask_request(""), vec![], "a.wav", "not a mime")
            .await
            .unwrap_err();
        assert!(matches!(err, DbChatError::Transport { .. }));
    }

    #[tokio::test]
    async fn update_bookmark_invalidates_listing_cache() {
        let server = MockServer::start().await;
        let listing = serde_json::json!([
            { "bookmark_id": "b1", "bookmarkname": "vendors", "query_ids": ["q1"] }
        ]);
        Mock::given(method("GET"))
            .and(path("/bookmarks/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&listing))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/bookmark/b1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.bookmarks("u1").await.unwrap();
        client
            .update_bookmark("b1", "vendors", Some("q2"))
            .await
            .unwrap();
        client.bookmarks("u1").await.unwrap();
    }

    #[tokio::test]
    async fn create_dashboard_accepts_empty_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dashboard/u1"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client
            .create_dashboard("u1", &serde_json::json!({ "tiles": [] }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn thread_fetch_decodes_and_caches() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "thread_id": "t1",
            "queries": [{
                "query_id": "q1",
                "messages": [{"role": "user", "content": "hello"}]
            }]
        });
        Mock::given(method("GET"))
            .and(path("/thread/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let first = client.thread("t1").await.unwrap();
        let second = client.thread("t1").await.unwrap();
        assert_eq!(first.thread_id, "t1");
        assert_eq!(second.queries.len(), 1);
    }

    #[tokio::test]
    async fn bookmark_mutation_invalidates_listing_cache() {
        let server = MockServer::start().await;
        let listing = serde_json::json!([
            { "bookmark_id": "b1", "bookmarkname": "vendors", "query_ids": ["q1"] }
        ]);
        Mock::given(method("GET"))
            .and(path("/bookmarks/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&listing))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bookmark"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.bookmarks("u1").await.unwrap();
        // Cached: a second read within the TTL would not hit the backend.
        client.create_bookmark("u1", "vendors", "q2").await.unwrap();
        // Invalidation forces the next read through to the backend.
        let bookmarks = client.bookmarks("u1").await.unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert!(bookmarks[0].query_ids.contains("q1"));
    }

    #[tokio::test]
    async fn delete_thread_invalidates_thread_and_history() {
        let server = MockServer::start().await;
        let doc = serde_json::json!({ "thread_id": "t1", "queries": [] });
        Mock::given(method("GET"))
            .and(path("/thread/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&doc))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/thread/t1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.thread("t1").await.unwrap();
        client.delete_thread("t1").await.unwrap();
        client.thread("t1").await.unwrap();
    }

    #[tokio::test]
    async fn ai_table_listing_decodes() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            { "id": "at1", "name": "vendors" }
        ]);
        Mock::given(method("GET"))
            .and(path("/ai_tables/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let tables = client.ai_tables("u1").await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].id, "at1");
        assert_eq!(tables[0].name, "vendors");
    }

    #[tokio::test]
    async fn dashboard_is_cached_until_updated() {
        let server = MockServer::start().await;
        let doc = serde_json::json!({ "tiles": ["spend-by-vendor"] });
        Mock::given(method("GET"))
            .and(path("/dashboard/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&doc))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/dashboard/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let fetched = client.dashboard("u1").await.unwrap();
        assert_eq!(fetched["tiles"][0], "spend-by-vendor");
        // Served from cache while the entry is live.
        client.dashboard("u1").await.unwrap();
        // A write invalidates, so the next read goes to the backend.
        client.update_dashboard("u1", &doc).await.unwrap();
        client.dashboard("u1").await.unwrap();
    }

    #[tokio::test]
    async fn history_listing_decodes() {
        let server = MockServer::start().await;
        let body = serde_json::json!([
            { "thread_id": "t1", "title": "Vendors" },
            { "thread_id": "t2" }
        ]);
        Mock::given(method("GET"))
            .and(path("/history/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let history = client.history("u1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].title, "Vendors");
        assert!(history[1].title.is_empty());
    }
}
