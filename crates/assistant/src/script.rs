//! Reply scripts for offline rehearsal
//!
//! A script is a JSON file of trigger/reply rules loaded into a
//! [`ScriptedModel`], so sessions can run without a model service.

use serde::{Deserialize, Serialize};
use std::path::Path;
use studyforge_common::errors::{AppError, Result};
use studyforge_common::llm::ScriptedModel;

/// Message returned when no script is supplied
pub const NO_TRANSPORT: &str =
    "no model service configured; pass --replies <script.json> to rehearse offline";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRule {
    /// Substring of the last user message
    pub trigger: String,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyScript {
    /// Reply for conversations no rule matches
    pub fallback: String,

    #[serde(default)]
    pub rules: Vec<ReplyRule>,
}

impl ReplyScript {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::input(format!("Unable to read reply script {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn into_model(self) -> ScriptedModel {
        self.rules
            .into_iter()
            .fold(ScriptedModel::new(self.fallback), |model, rule| {
                model.on(rule.trigger, rule.reply)
            })
    }
}

/// Model used when no script is given: every call fails
pub fn unconfigured_model() -> ScriptedModel {
    ScriptedModel::failing(NO_TRANSPORT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_common::llm::{ChatMessage, ChatModel, CompletionOptions};

    #[tokio::test]
    async fn test_script_rules_drive_model() {
        let script: ReplyScript = serde_json::from_str(
            r#"{"fallback": "default", "rules": [{"trigger": "essay", "reply": "[]"}]}"#,
        )
        .unwrap();
        let model = script.into_model();
        let options = CompletionOptions::default();

        let reply = model
            .complete(&[ChatMessage::user("Create 2 essay questions")], &options)
            .await
            .unwrap();
        assert_eq!(reply.content, "[]");

        let reply = model
            .complete(&[ChatMessage::user("What is eddy current testing?")], &options)
            .await
            .unwrap();
        assert_eq!(reply.content, "default");
    }

    #[tokio::test]
    async fn test_unconfigured_model_fails() {
        let err = unconfigured_model()
            .complete(&[ChatMessage::user("hi")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_upstream_error());
    }

    #[test]
    fn test_missing_script_file() {
        let err = ReplyScript::from_file(Path::new("/nonexistent/replies.json")).unwrap_err();
        assert!(err.is_input_error());
    }
}
