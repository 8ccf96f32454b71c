// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session state.
//!
//! [`ChatSession`] owns the message array, the adopted thread id, the known
//! bookmark collection, and the advisory in-flight flag. State is explicit
//! and constructor-injected; there is no ambient shared bus.
//!
//! Ordering: the optimistic user message is appended synchronously before
//! the network call begins, so it always precedes the eventual bot reply.
//! Concurrent sends are soft-guarded: while a request is outstanding, new
//! send attempts are dropped, not queued.

use dbchat_client::{AskRequest, BookmarkDoc, DbChatClient};
use dbchat_core::{Answer, ChatMessage, ContentKind, DbChatError, QueryType, RawAnswer, Sender};
use tracing::{debug, warn};

use crate::{answer, normalize, reply};

/// Fixed text of the synthetic bot message appended when a send fails.
pub const SEND_ERROR_TEXT: &str =
    "Something went wrong while answering your question. Please try again.";

/// Outcome of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The exchange ran (successfully or degraded to an error message).
    Sent,
    /// Dropped because a request was already in flight.
    Dropped,
    /// The reply arrived after the user navigated away and was discarded.
    Stale,
}

/// One conversation: messages, thread identity, and send state.
pub struct ChatSession {
    client: DbChatClient,
    user_id: String,
    query_type: QueryType,
    thread_id: Option<String>,
    ai_table: Option<String>,
    messages: Vec<ChatMessage>,
    bookmarks: Vec<BookmarkDoc>,
    in_flight: bool,
    last_error: Option<String>,
    /// Navigation epoch: bumped on thread switch / new chat so replies from
    /// a previous view are discarded instead of populating the current one.
    epoch: u64,
}

impl ChatSession {
    pub fn new(client: DbChatClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
            query_type: QueryType::Chat,
            thread_id: None,
            ai_table: None,
            messages: Vec::new(),
            bookmarks: Vec::new(),
            in_flight: false,
            last_error: None,
            epoch: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn ai_table(&self) -> Option<&str> {
        self.ai_table.as_deref()
    }

    pub fn bookmarks(&self) -> &[BookmarkDoc] {
        &self.bookmarks
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn set_query_type(&mut self, query_type: QueryType) {
        self.query_type = query_type;
    }

    /// The dismissible error banner value, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Sends a question, optionally as a reply to an earlier message.
    ///
    /// The outgoing question is composed from the reply chain's original
    /// question when a reply context exists. Failures degrade to a synthetic
    /// bot message plus the error banner; they are never propagated.
    pub async fn send(&mut self, text: &str, reply_to: Option<&str>) -> SendOutcome {
        if self.in_flight {
            debug!("send dropped: request already in flight");
            return SendOutcome::Dropped;
        }
        self.in_flight = true;
        let epoch = self.epoch;

        let original = reply_to.and_then(|id| reply::original_question(&self.messages, id));
        let question = reply::compose_question(original.as_deref(), text);

        let mut user_msg = ChatMessage::text(local_id(), Sender::User, question.clone());
        user_msg.reply_to = reply_to.map(str::to_string);
        self.messages.push(user_msg);

        let request = self.build_request(question);
        let result = self.client.ask(&request).await;
        self.finish_exchange(result, epoch)
    }

    /// Sends a recorded question as multipart audio.
    pub async fn send_audio(
        &mut self,
        audio: Vec<u8>,
        filename: &str,
        mime: &str,
    ) -> SendOutcome {
        if self.in_flight {
            debug!("audio send dropped: request already in flight");
            return SendOutcome::Dropped;
        }
        self.in_flight = true;
        let epoch = self.epoch;

        let mut user_msg = ChatMessage::text(local_id(), Sender::User, "(voice message)");
        user_msg.kind = ContentKind::Audio;
        self.messages.push(user_msg);

        let request = self.build_request(String::new());
        let result = self.client.ask_audio(&request, audio, filename, mime).await;
        self.finish_exchange(result, epoch)
    }

    /// Replaces the session content with a fetched thread.
    ///
    /// Bumps the navigation epoch first so a reply still in flight for the
    /// previous view is discarded when it lands.
    pub async fn load_thread(&mut self, thread_id: &str) -> Result<(), DbChatError> {
        self.epoch += 1;
        let epoch = self.epoch;
        self.in_flight = false;

        let bookmarks = match self.client.bookmarks(&self.user_id).await {
            Ok(bookmarks) => bookmarks,
            Err(e) => {
                warn!(error = %e, "bookmark listing failed, continuing without");
                Vec::new()
            }
        };
        let doc = self.client.thread(thread_id).await?;
        if self.epoch != epoch {
            return Ok(());
        }

        self.bookmarks = bookmarks;
        self.messages = normalize::normalize_thread(&doc, &self.bookmarks);
        self.thread_id = Some(thread_id.to_string());
        self.ai_table = None;
        Ok(())
    }

    /// Replaces the session content with a fetched AI table (folder).
    pub async fn load_ai_table(&mut self, table_id: &str) -> Result<(), DbChatError> {
        self.epoch += 1;
        let epoch = self.epoch;
        self.in_flight = false;

        let doc = self.client.ai_table(table_id).await?;
        if self.epoch != epoch {
            return Ok(());
        }

        self.messages = normalize::normalize_ai_table(&doc);
        self.ai_table = Some(if doc.ai_table.is_empty() {
            table_id.to_string()
        } else {
            doc.ai_table.clone()
        });
        self.thread_id = None;
        Ok(())
    }

    /// Replaces the session content with a bookmark's queries, each refetched
    /// individually.
    pub async fn load_bookmark(&mut self, bookmark_id: &str) -> Result<(), DbChatError> {
        self.epoch += 1;
        let epoch = self.epoch;
        self.in_flight = false;

        let bookmarks = self.client.bookmarks(&self.user_id).await?;
        let bookmark = bookmarks
            .iter()
            .find(|b| b.bookmark_id == bookmark_id)
            .cloned()
            .ok_or_else(|| DbChatError::Internal(format!("unknown bookmark {bookmark_id}")))?;

        let mut groups = Vec::new();
        for query_id in bookmark.query_ids.iter() {
            groups.push(self.client.query(query_id).await?);
        }
        if self.epoch != epoch {
            return Ok(());
        }

        self.messages = normalize::normalize_bookmark(&bookmark, &groups);
        self.bookmarks = bookmarks;
        self.thread_id = None;
        self.ai_table = None;
        Ok(())
    }

    /// Starts a fresh conversation.
    pub fn new_chat(&mut self) {
        self.epoch += 1;
        self.in_flight = false;
        self.messages.clear();
        self.thread_id = None;
        self.ai_table = None;
        self.last_error = None;
    }

    /// Bookmarks a query and refreshes the known bookmark collection,
    /// marking the affected messages.
    pub async fn bookmark_query(&mut self, query_id: &str, name: &str) -> Result<(), DbChatError> {
        self.client
            .create_bookmark(&self.user_id, name, query_id)
            .await?;
        self.refresh_bookmarks().await
    }

    /// Deletes a bookmark and refreshes the known collection.
    pub async fn remove_bookmark(&mut self, bookmark_id: &str) -> Result<(), DbChatError> {
        self.client.delete_bookmark(bookmark_id).await?;
        self.refresh_bookmarks().await
    }

    async fn refresh_bookmarks(&mut self) -> Result<(), DbChatError> {
        self.bookmarks = self.client.bookmarks(&self.user_id).await?;
        for message in &mut self.messages {
            let Some(query_id) = message.query_id.as_deref() else {
                continue;
            };
            match self
                .bookmarks
                .iter()
                .find(|b| b.query_ids.contains(query_id))
            {
                Some(bookmark) => {
                    message.bookmarked = true;
                    message.bookmark_id = Some(bookmark.bookmark_id.clone());
                }
                None => {
                    message.bookmarked = false;
                    message.bookmark_id = None;
                }
            }
        }
        Ok(())
    }

    fn build_request(&self, question: String) -> AskRequest {
        let mut request = AskRequest::new(&self.user_id, question, self.query_type);
        if let Some(thread_id) = &self.thread_id {
            request = request.with_thread(thread_id);
        }
        if let Some(ai_table) = &self.ai_table {
            request = request.with_ai_table(ai_table);
        }
        request
    }

    fn finish_exchange(
        &mut self,
        result: Result<dbchat_client::AskExchange, DbChatError>,
        epoch: u64,
    ) -> SendOutcome {
        if self.epoch != epoch {
            debug!("discarding reply from a previous view");
            return SendOutcome::Stale;
        }
        self.in_flight = false;

        match result {
            Ok(exchange) => {
                if let Some(thread_id) = &exchange.thread_id {
                    self.thread_id = Some(thread_id.clone());
                }
                let classified = answer::classify_exchange(&exchange.body);
                self.messages
                    .push(bot_message(classified, exchange.query_id.as_deref()));
                SendOutcome::Sent
            }
            Err(e) => {
                warn!(error = %e, "ask exchange failed");
                self.messages
                    .push(ChatMessage::text(local_id(), Sender::Bot, SEND_ERROR_TEXT));
                self.last_error = Some(e.to_string());
                SendOutcome::Sent
            }
        }
    }

    #[cfg(test)]
    fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
    }
}

/// Identifier for messages that exist before the backend assigns a query id.
fn local_id() -> String {
    format!("local-{}", uuid::Uuid::new_v4())
}

/// Builds the bot message for a classified answer. The id combines the
/// backend query id with index zero when one was assigned.
fn bot_message(classified: Answer, query_id: Option<&str>) -> ChatMessage {
    let id = match query_id {
        Some(query_id) => format!("{query_id}-0"),
        None => local_id(),
    };
    let mut message = match classified {
        Answer::Text(text) => ChatMessage::text(id, Sender::Bot, text),
        Answer::Rows(rows) => {
            let mut m = ChatMessage::text(id, Sender::Bot, "");
            m.kind = ContentKind::Tabular;
            m.raw_answer = Some(RawAnswer::Rows(rows));
            m
        }
        Answer::Records(records) => {
            let mut m = ChatMessage::text(id, Sender::Bot, "");
            m.kind = ContentKind::Tabular;
            m.raw_answer = Some(RawAnswer::Records(records));
            m
        }
        Answer::Blob { kind, mime, data } => {
            let mut m = ChatMessage::text(id, Sender::Bot, "");
            m.kind = kind;
            m.raw_answer = Some(RawAnswer::Blob { mime, data });
            m
        }
    };
    message.query_id = query_id.map(str::to_string);
    message
}
