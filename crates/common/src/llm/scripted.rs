//! Scripted model for offline runs and tests
//!
//! Replies are chosen by the first rule whose trigger appears in the last
//! user message; unmatched conversations get the fallback reply.

use super::{ChatMessage, ChatModel, ChatRole, Completion, CompletionOptions};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text
    Text(String),
    /// Fail the call as a transport or provider error would
    Failure(String),
}

/// Deterministic [`ChatModel`] driven by substring rules
pub struct ScriptedModel {
    rules: Vec<(String, ScriptedReply)>,
    fallback: ScriptedReply,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    /// Model answering every call with `reply`
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: ScriptedReply::Text(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Model failing every unmatched call
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: ScriptedReply::Failure(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `reply` when the last user message contains `trigger`
    pub fn on(mut self, trigger: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules
            .push((trigger.into(), ScriptedReply::Text(reply.into())));
        self
    }

    /// Fail when the last user message contains `trigger`
    pub fn fail_on(mut self, trigger: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules
            .push((trigger.into(), ScriptedReply::Failure(message.into())));
        self
    }

    /// Conversations received so far, in call order
    pub async fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<Completion> {
        self.calls.lock().await.push(messages.to_vec());

        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let reply = self
            .rules
            .iter()
            .find(|(trigger, _)| prompt.contains(trigger.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback);

        match reply {
            ScriptedReply::Text(text) => Ok(Completion::text(text.clone())),
            ScriptedReply::Failure(message) => Err(AppError::GenerationFatal {
                message: message.clone(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rules_match_last_user_message() {
        let model = ScriptedModel::new("fallback").on("true/false", "[]");
        let options = CompletionOptions::default();

        let reply = model
            .complete(&[ChatMessage::user("Create 3 true/false questions")], &options)
            .await
            .unwrap();
        assert_eq!(reply.content, "[]");

        let reply = model
            .complete(&[ChatMessage::user("Something else")], &options)
            .await
            .unwrap();
        assert_eq!(reply.content, "fallback");
        assert_eq!(model.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_failure_reply() {
        let model = ScriptedModel::failing("quota exceeded");
        let err = model
            .complete(&[ChatMessage::user("hi")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GenerationFatal { .. }));
    }
}
