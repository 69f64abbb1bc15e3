use std::str::FromStr;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateEmbeddingRequest, CreateEmbeddingRequestArgs,
        ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::AppError;

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Hosted providers a comparison can run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Google,
    Groq,
}

impl LlmProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Groq => "groq",
        }
    }

    /// Both providers expose an OpenAI-compatible endpoint.
    pub fn api_base(self) -> &'static str {
        match self {
            Self::Google => GOOGLE_API_BASE,
            Self::Groq => GROQ_API_BASE,
        }
    }

    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Google => "GOOGLE_API_KEY",
            Self::Groq => "GROQ_API_KEY",
        }
    }

    fn supports_json_schema(self) -> bool {
        matches!(self, Self::Google)
    }
}

impl FromStr for LlmProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "groq" => Ok(Self::Groq),
            other => Err(AppError::Configuration(format!(
                "Unsupported LLM provider: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured-output contract attached to a chat request.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub response_schema: Option<ResponseSchema>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_response_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// A chat model that turns one prompt into one completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, AppError>;

    fn model_name(&self) -> &str;
}

#[derive(Clone)]
pub struct LlmClient {
    provider: LlmProvider,
    model_name: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
    client: Client<OpenAIConfig>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    pub fn new(
        provider: LlmProvider,
        api_key: &str,
        model_name: impl Into<String>,
        temperature: f32,
        max_output_tokens: Option<u32>,
    ) -> Self {
        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(provider.api_base()),
        );

        Self {
            provider,
            model_name: model_name.into(),
            temperature,
            max_output_tokens,
            client,
        }
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }

    fn build_request(&self, request: ChatRequest) -> Result<CreateChatCompletionRequest, AppError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatCompletionRequestSystemMessage::from(system).into());
        }
        messages.push(ChatCompletionRequestUserMessage::from(request.prompt).into());

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature);

        if let Some(max_tokens) = self.max_output_tokens {
            args.max_completion_tokens(max_tokens);
        }

        if let Some(schema) = request.response_schema {
            // Groq only guarantees JSON mode across its model catalogue.
            let response_format = if self.provider.supports_json_schema() {
                ResponseFormat::JsonSchema {
                    json_schema: ResponseFormatJsonSchema {
                        description: Some(schema.description),
                        name: schema.name,
                        schema: Some(schema.schema),
                        strict: Some(false),
                    },
                }
            } else {
                ResponseFormat::JsonObject
            };
            args.response_format(response_format);
        }

        Ok(args.build()?)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, AppError> {
        let request = self.build_request(request)?;
        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or(AppError::LLMParsing(
                "No content found in LLM response".into(),
            ))?;

        debug!(
            provider = %self.provider,
            model = %self.model_name,
            response_chars = content.len(),
            "Received LLM completion"
        );

        Ok(content.clone())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[derive(Clone)]
pub struct EmbeddingClient {
    model_name: String,
    client: Client<OpenAIConfig>,
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}

impl EmbeddingClient {
    pub fn new(provider: LlmProvider, api_key: &str, model_name: impl Into<String>) -> Self {
        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(provider.api_base()),
        );

        Self {
            model_name: model_name.into(),
            client,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let request = self.build_request(text)?;
        let response = self.client.embeddings().create(request).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|embedding| embedding.embedding)
            .ok_or_else(|| AppError::LLMParsing("No embedding data received".into()))
    }

    fn build_request(&self, text: &str) -> Result<CreateEmbeddingRequest, AppError> {
        Ok(CreateEmbeddingRequestArgs::default()
            .model(self.model_name.clone())
            .input([text])
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::EmbeddingInput;
    use serde_json::json;

    #[test]
    fn provider_names_match_exactly() {
        assert_eq!("google".parse::<LlmProvider>().ok(), Some(LlmProvider::Google));
        assert_eq!("groq".parse::<LlmProvider>().ok(), Some(LlmProvider::Groq));

        let err = "Google".parse::<LlmProvider>().expect_err("capitalised");
        assert!(matches!(err, AppError::Configuration(msg) if msg.contains("Google")));
    }

    #[test]
    fn unsupported_provider_names_the_provider() {
        let err = "openai".parse::<LlmProvider>().expect_err("unsupported");
        assert!(matches!(err, AppError::Configuration(msg) if msg.contains("openai")));
    }

    #[test]
    fn groq_requests_fall_back_to_json_mode() {
        let client = LlmClient::new(LlmProvider::Groq, "key", "llama", 0.2, None);
        let request = client
            .build_request(ChatRequest::new("compare").with_response_schema(ResponseSchema {
                name: "comparison".into(),
                description: "diff".into(),
                schema: json!({"type": "object"}),
            }))
            .expect("request");

        assert!(matches!(
            request.response_format,
            Some(ResponseFormat::JsonObject)
        ));
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.max_completion_tokens.is_none());
    }

    #[test]
    fn google_requests_carry_schema_and_token_limit() {
        let client = LlmClient::new(LlmProvider::Google, "key", "gemini", 0.1, Some(2048));
        let request = client
            .build_request(
                ChatRequest::new("compare")
                    .with_system("You compare documents.")
                    .with_response_schema(ResponseSchema {
                        name: "comparison".into(),
                        description: "diff".into(),
                        schema: json!({"type": "object"}),
                    }),
            )
            .expect("request");

        assert!(matches!(
            request.response_format,
            Some(ResponseFormat::JsonSchema { .. })
        ));
        assert_eq!(request.max_completion_tokens, Some(2048));
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn embedding_requests_carry_model_and_single_input() {
        let client = EmbeddingClient::new(LlmProvider::Google, "key", "text-embedding-004");
        let request = client.build_request("Fee: 12 EUR").expect("request");

        assert_eq!(request.model, "text-embedding-004");
        assert!(matches!(
            request.input,
            EmbeddingInput::StringArray(ref inputs) if inputs == &vec!["Fee: 12 EUR".to_string()]
        ));
    }
}
