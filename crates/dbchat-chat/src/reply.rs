// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply-chain resolution and question composition.
//!
//! When the user replies to an earlier message, the outgoing question is
//! composed from the chain's "true original question": the most ancestral
//! message whose text is not a content-free acknowledgement.

use std::collections::{HashMap, HashSet};

use dbchat_core::ChatMessage;
use tracing::warn;

/// Closed set of low-content acknowledgements that never count as the
/// original question. Compared case-insensitively after trimming.
const GREETINGS: &[&str] = &[
    "ok", "okay", "thanks", "thank you", "thankyou", "yes", "no", "hmm", "hm", "great",
    "cool", "nice", "good", "fine", "sure", "yep", "yeah", "hi", "hello", "hey", "got it",
];

/// Marker that terminates a composed question; everything after it is the
/// newest question and is what the UI displays.
const NEW_QUESTION_MARKER: &str = "New Question: ";

/// True when the text is one of the fixed content-free acknowledgements.
pub fn is_greeting(text: &str) -> bool {
    let trimmed = text.trim().to_lowercase();
    GREETINGS.contains(&trimmed.as_str())
}

/// Resolves the "true original question" of a reply chain.
///
/// Walks backward from the replied-to message, adopting each non-greeting
/// ancestor's display text as the running original, so the returned value is
/// the most ancestral non-greeting in the chain. Returns `None` when the
/// entire chain consists of greetings — the caller then sends the new
/// message verbatim instead of echoing a greeting.
///
/// `reply_to` must reference a message appearing earlier in `messages`; a
/// visited set guards against cyclic input so malformed data cannot hang
/// the caller.
pub fn original_question(messages: &[ChatMessage], reply_to: &str) -> Option<String> {
    let by_id: HashMap<&str, &ChatMessage> =
        messages.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = by_id.get(reply_to).copied();
    let mut original: Option<String> = None;

    while let Some(msg) = current {
        if !visited.insert(msg.id.as_str()) {
            warn!(id = %msg.id, "cycle detected in reply chain, stopping traversal");
            break;
        }
        let text = display_text(&msg.text);
        if !text.trim().is_empty() && !is_greeting(text) {
            original = Some(text.to_string());
        }
        current = msg
            .reply_to
            .as_deref()
            .and_then(|id| by_id.get(id).copied());
    }

    original
}

/// Composes the outgoing question from an optional reply-chain original.
pub fn compose_question(original: Option<&str>, new_message: &str) -> String {
    match original {
        Some(original) => {
            format!("Original Questions: {original} | New Question: {new_message}")
        }
        None => new_message.to_string(),
    }
}

/// Strips the composed format back down for presentation: a message ending
/// in `New Question: X` displays only `X`; anything else is unchanged.
pub fn display_text(text: &str) -> &str {
    match text.rfind(NEW_QUESTION_MARKER) {
        Some(idx) => &text[idx + NEW_QUESTION_MARKER.len()..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use dbchat_core::Sender;

    use super::*;

    fn msg(id: &str, text: &str, reply_to: Option<&str>) -> ChatMessage {
        let mut m = ChatMessage::text(id, Sender::User, text);
        m.reply_to = reply_to.map(str::to_string);
        m
    }

    #[test]
    fn greeting_detection_is_case_insensitive_and_trimmed() {
        assert!(is_greeting("ok"));
        assert!(is_greeting("  Thanks "));
        assert!(is_greeting("HMM"));
        assert!(!is_greeting("ok, but show me vendors"));
        assert!(!is_greeting("Top 5 vendors"));
    }

    #[test]
    fn skips_greeting_in_the_middle_of_the_chain() {
        // A <- B ("ok") <- C: the original question of C is A's text.
        let messages = vec![
            msg("a", "Top 5 vendors", None),
            msg("b", "ok", Some("a")),
            msg("c", "and their totals?", Some("b")),
        ];
        assert_eq!(
            original_question(&messages, "c").as_deref(),
            Some("Top 5 vendors")
        );
    }

    #[test]
    fn greeting_root_yields_last_non_greeting_ancestor() {
        // Root itself is a greeting; the resolver must not fall back to it.
        let messages = vec![
            msg("a", "hello", None),
            msg("b", "Top 5 vendors", Some("a")),
            msg("c", "ok", Some("b")),
        ];
        assert_eq!(
            original_question(&messages, "c").as_deref(),
            Some("Top 5 vendors")
        );
    }

    #[test]
    fn all_greeting_chain_resolves_to_none() {
        let messages = vec![msg("a", "hi", None), msg("b", "ok", Some("a"))];
        assert_eq!(original_question(&messages, "b"), None);
    }

    #[test]
    fn cyclic_chain_terminates() {
        let messages = vec![
            msg("a", "first question", Some("b")),
            msg("b", "second question", Some("a")),
        ];
        // Must terminate and still report the most ancestral text visited.
        let result = original_question(&messages, "b");
        assert!(result.is_some());
    }

    #[test]
    fn unknown_reply_target_resolves_to_none() {
        let messages = vec![msg("a", "Top 5 vendors", None)];
        assert_eq!(original_question(&messages, "missing"), None);
    }

    #[test]
    fn adoption_uses_display_text_of_composed_ancestors() {
        let messages = vec![
            msg(
                "a",
                "Original Questions: Top 5 vendors | New Question: by region",
                None,
            ),
            msg("b", "thanks", Some("a")),
        ];
        assert_eq!(original_question(&messages, "b").as_deref(), Some("by region"));
    }

    #[test]
    fn compose_with_context_uses_fixed_format() {
        assert_eq!(
            compose_question(Some("Top 5 vendors"), "by region"),
            "Original Questions: Top 5 vendors | New Question: by region"
        );
    }

    #[test]
    fn compose_without_context_is_verbatim() {
        assert_eq!(compose_question(None, "Top 5 vendors"), "Top 5 vendors");
    }

    #[test]
    fn display_text_strips_composed_format() {
        assert_eq!(
            display_text("Original Questions: foo | New Question: bar"),
            "bar"
        );
        assert_eq!(display_text("just a message"), "just a message");
        assert_eq!(display_text("New Question: solo"), "solo");
    }
}
