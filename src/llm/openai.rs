//! OpenAI-compatible chat client.

use super::{ChatMessage, ChatModel, CompletionRequest, Role};
use crate::config::LlmSettings;
use crate::error::{Result, SleuthError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Build a reqwest client with a bounded timeout for API calls.
pub fn create_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SleuthError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Chat model served by any OpenAI-compatible endpoint (Groq by default).
pub struct OpenAiChat {
    client: Client<OpenAIConfig>,
}

impl OpenAiChat {
    /// Create a client for the given endpoint.
    pub fn new(api_base: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);

        Ok(Self {
            client: Client::with_config(config).with_http_client(create_http_client(timeout)?),
        })
    }

    /// Create a client from settings, reading the API key from the environment.
    pub fn from_settings(settings: &LlmSettings, api_key: &str) -> Result<Self> {
        Self::new(
            &settings.api_base,
            api_key,
            Duration::from_secs(settings.timeout_seconds),
        )
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| SleuthError::Llm(e.to_string()))?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| SleuthError::Llm(e.to_string()))?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| SleuthError::Llm(e.to_string()))?
            .into(),
    };
    Ok(built)
}

#[async_trait]
impl ChatModel for OpenAiChat {
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len(), json = request.json_response))]
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let messages = request
            .messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(messages)
            .temperature(request.temperature);
        if let Some(max_tokens) = request.max_tokens {
            args.max_completion_tokens(max_tokens);
        }
        if request.json_response {
            args.response_format(ResponseFormat::JsonObject);
        }
        let built = args.build().map_err(|e| SleuthError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(built)
            .await
            .map_err(|e| SleuthError::Llm(format!("Completion request failed: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SleuthError::Llm("Empty response from model".to_string()))?;

        debug!("Completion returned {} characters", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_conversion_keeps_roles() {
        let system = to_request_message(&ChatMessage::system("rules")).unwrap();
        let user = to_request_message(&ChatMessage::user("question")).unwrap();
        let assistant = to_request_message(&ChatMessage::assistant("{}")).unwrap();

        assert!(matches!(system, ChatCompletionRequestMessage::System(_)));
        assert!(matches!(user, ChatCompletionRequestMessage::User(_)));
        assert!(matches!(assistant, ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_client_creation() {
        let settings = LlmSettings::default();
        assert!(OpenAiChat::from_settings(&settings, "test-key").is_ok());
    }
}
