//! Completion-client port.
//!
//! The planner only ever needs one call: system prompt plus user
//! prompt in, raw reply text out. [`MockCompletion`] scripts that
//! exchange for tests and demos; [`crate::HttpCompletion`] speaks to
//! any OpenAI-compatible endpoint.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    /// The request never produced a usable response (network, timeout,
    /// unparseable body).
    #[error("completion transport failed: {0}")]
    Transport(String),

    /// The service answered with an explicit error.
    #[error("completion service rejected the request: {0}")]
    Service(String),

    #[error("completion reply was empty")]
    EmptyReply,
}

/// One-shot text completion with a system and a user message.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError>;
}

/// Scripted completion client for tests and the offline demo.
///
/// Replies are served in order; once the queue drains, the repeating
/// reply takes over if one is set, otherwise calls fail with a
/// transport error. Every user prompt is retained for assertions.
#[derive(Default)]
pub struct MockCompletion {
    replies: Mutex<VecDeque<String>>,
    repeating: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `reply` forever once the scripted queue is empty.
    pub fn repeating(reply: impl Into<String>) -> Self {
        let mock = Self::default();
        *mock.repeating.lock() = Some(reply.into());
        mock
    }

    /// Queue one scripted reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().push_back(reply.into());
        self
    }

    /// Queue one scripted reply as a JSON value.
    pub fn with_action(self, action: &serde_json::Value) -> Self {
        let text = action.to_string();
        self.with_reply(text)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts seen so far, oldest first.
    pub fn user_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(
        &self,
        _system: &str,
        user: &str,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(user.to_string());
        if let Some(reply) = self.replies.lock().pop_front() {
            return Ok(reply);
        }
        match self.repeating.lock().clone() {
            Some(reply) => Ok(reply),
            None => Err(LlmError::Transport("no scripted reply left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn scripted_replies_serve_in_order_then_fail() {
        let mock = MockCompletion::new()
            .with_reply("first")
            .with_action(&json!({"action": "complete", "description": "Done"}));
        assert_eq!(mock.complete("s", "u1", 64).await.unwrap(), "first");
        let second = mock.complete("s", "u2", 64).await.unwrap();
        assert!(second.contains("\"complete\""));
        assert!(matches!(
            mock.complete("s", "u3", 64).await,
            Err(LlmError::Transport(_))
        ));
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.user_prompts(), vec!["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn repeating_reply_takes_over_after_queue() {
        let mock = MockCompletion::repeating("again").with_reply("once");
        assert_eq!(mock.complete("s", "u", 64).await.unwrap(), "once");
        assert_eq!(mock.complete("s", "u", 64).await.unwrap(), "again");
        assert_eq!(mock.complete("s", "u", 64).await.unwrap(), "again");
    }
}
