//! Intent classification and the conversational reply path.

use crate::config::Prompts;
use crate::error::{Result, SleuthError};
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Whether a query needs research or just a friendly reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Research,
    Conversation,
}

impl Intent {
    /// Parse a classifier label, tolerating case, quotes and punctuation.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_uppercase();

        match normalized.as_str() {
            "RESEARCH" => Some(Intent::Research),
            "CONVERSATION" => Some(Intent::Conversation),
            _ => None,
        }
    }
}

/// Ask the model whether `query` needs research.
///
/// A reply that is not exactly one of the two labels is an error; callers
/// decide how to recover.
#[instrument(skip(model, prompts))]
pub async fn classify_intent(
    model: &dyn ChatModel,
    prompts: &Prompts,
    llm_model: &str,
    query: &str,
) -> Result<Intent> {
    let request = CompletionRequest::new(
        llm_model,
        vec![
            ChatMessage::system(prompts.render_with_custom(&prompts.intent.system, &Default::default())),
            ChatMessage::user(query),
        ],
    )
    .temperature(0.1)
    .max_tokens(10);

    let reply = model.complete(request).await?;
    debug!("Classifier replied {:?}", reply);

    Intent::from_label(&reply)
        .ok_or_else(|| SleuthError::Llm(format!("Unexpected intent label: {:?}", reply)))
}

/// Produce a short conversational reply.
#[instrument(skip(model, prompts))]
pub async fn generate_chat_response(
    model: &dyn ChatModel,
    prompts: &Prompts,
    llm_model: &str,
    query: &str,
) -> Result<String> {
    let request = CompletionRequest::new(
        llm_model,
        vec![
            ChatMessage::system(prompts.render_with_custom(&prompts.chat.system, &Default::default())),
            ChatMessage::user(query),
        ],
    )
    .temperature(0.7)
    .max_tokens(200);

    model.complete(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedModel};

    #[test]
    fn test_label_normalization() {
        assert_eq!(Intent::from_label("RESEARCH"), Some(Intent::Research));
        assert_eq!(Intent::from_label("  conversation.\n"), Some(Intent::Conversation));
        assert_eq!(Intent::from_label("\"Research\""), Some(Intent::Research));
        assert_eq!(Intent::from_label("RESEARCH please"), None);
        assert_eq!(Intent::from_label(""), None);
    }

    #[tokio::test]
    async fn test_classify_thanks_as_conversation() {
        let model = ScriptedModel::new(vec![Reply::text("CONVERSATION")]);
        let intent = classify_intent(&model, &Prompts::builtin(), "m", "Thank you for your help")
            .await
            .unwrap();
        assert_eq!(intent, Intent::Conversation);

        let requests = model.requests();
        let request = &requests[0];
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.max_tokens, Some(10));
        assert_eq!(request.messages[1].content, "Thank you for your help");
    }

    #[tokio::test]
    async fn test_classify_factual_question_as_research() {
        let model = ScriptedModel::new(vec![Reply::text("Research")]);
        let intent = classify_intent(&model, &Prompts::builtin(), "m", "Who is the CEO of Google?")
            .await
            .unwrap();
        assert_eq!(intent, Intent::Research);
    }

    #[tokio::test]
    async fn test_classify_rejects_unexpected_label() {
        let model = ScriptedModel::new(vec![Reply::text("MAYBE")]);
        let result = classify_intent(&model, &Prompts::builtin(), "m", "hmm").await;
        assert!(matches!(result, Err(SleuthError::Llm(_))));
    }

    #[tokio::test]
    async fn test_chat_response() {
        let model = ScriptedModel::new(vec![Reply::text("You're welcome!")]);
        let reply = generate_chat_response(&model, &Prompts::builtin(), "m", "thanks")
            .await
            .unwrap();
        assert_eq!(reply, "You're welcome!");
        assert_eq!(model.requests()[0].max_tokens, Some(200));
    }
}
