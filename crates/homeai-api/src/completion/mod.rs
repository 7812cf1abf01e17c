// Chat completion client
//
// Thin client for an OpenAI-compatible `/chat/completions` endpoint. The
// caller assembles the transcript; this module only ships it and extracts
// the first choice's text.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{self, TransportConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Raw HTTP client for the completion service.
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: Url,
    model: String,
}

impl CompletionClient {
    pub fn new(api_key: &SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_base_url(Url::parse(DEFAULT_BASE_URL)?, api_key, transport)
    }

    pub fn with_base_url(
        base_url: Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(transport::bearer_headers(api_key)?)?;
        Ok(Self {
            http,
            base_url,
            model: DEFAULT_MODEL.into(),
        })
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the transcript and return the first choice's text.
    ///
    /// `POST /chat/completions`. Returns an empty string when the service
    /// answers without choices.
    pub async fn complete(&self, messages: &[ChatTurn]) -> Result<String, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/chat/completions"))?;
        debug!(model = %self.model, turns = messages.len(), "POST {}", url);

        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let parsed: CompletionResponse = transport::parse_json(resp).await?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
