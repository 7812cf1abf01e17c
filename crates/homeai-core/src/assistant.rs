// ── Chat assistant ──
//
// Keyword intents are executed directly through the command router.
// Anything else goes to a completion backend along with the device list
// and the recent conversation.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use homeai_api::transport::TransportConfig;
use homeai_api::{ChatTurn, CompletionClient};

use crate::aggregator::Aggregator;
use crate::config::CompletionSettings;
use crate::error::CoreError;
use crate::intent::{IntentParser, KeywordIntentParser};
use crate::model::{ChatMessage, ChatRole, Device};
use crate::router::CommandRouter;

/// Conversation turns sent along with each completion request.
pub const HISTORY_WINDOW: usize = 10;

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are HomeAI, a friendly and helpful AI assistant for smart home control.
You can control lights, switches, thermostats, locks, and other smart devices.

When the user asks to control a device, respond naturally and include the action.
Available commands you can understand:
- Turn on/off lights, switches, devices
- Set brightness (0-100%)
- Set temperature (thermostat)
- Lock/unlock doors
- Adjust blinds/shades
- Create scenes and routines

Always be helpful, concise, and confirm actions taken.
If you don't understand a request, ask for clarification.";

const MISSING_KEY_REPLY: &str =
    "Please configure your OpenAI API key in settings to enable AI responses.";

/// Free-form reply generator. Always answers with text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn respond(&self, system_prompt: &str, device_context: &str, history: &[ChatMessage]) -> String;
}

/// Chat completions over the OpenAI-compatible API.
pub struct OpenAiBackend {
    client: Option<CompletionClient>,
}

impl OpenAiBackend {
    /// A backend from settings. A blank or missing key yields a backend that
    /// only ever asks for one.
    pub fn new(settings: &CompletionSettings, transport: &TransportConfig) -> Result<Self, CoreError> {
        let Some(key) = settings
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
        else {
            return Ok(Self { client: None });
        };

        let mut client = match &settings.base_url {
            Some(url) => CompletionClient::with_base_url(url.clone(), key, transport)?,
            None => CompletionClient::new(key, transport)?,
        };
        if let Some(model) = &settings.model {
            client = client.with_model(model.clone());
        }
        Ok(Self {
            client: Some(client),
        })
    }

    /// A backend with no key configured.
    pub fn unconfigured() -> Self {
        Self { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn respond(&self, system_prompt: &str, device_context: &str, history: &[ChatMessage]) -> String {
        let Some(client) = &self.client else {
            return MISSING_KEY_REPLY.to_owned();
        };

        let mut turns = Vec::with_capacity(history.len() + 1);
        turns.push(ChatTurn::system(format!(
            "{system_prompt}\n\nAvailable devices:\n{device_context}"
        )));
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        turns.extend(history[start..].iter().map(|msg| match msg.role {
            ChatRole::User => ChatTurn::user(msg.content.clone()),
            ChatRole::Assistant => ChatTurn::assistant(msg.content.clone()),
        }));

        debug!(model = client.model(), turns = turns.len(), "requesting completion");
        match client.complete(&turns).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "completion request failed");
                match e.status() {
                    Some(status) => {
                        format!("I'm having trouble connecting to my AI service. Error: {status}")
                    }
                    None => format!("I encountered an error: {e}. Please try again."),
                }
            }
        }
    }
}

/// Device list grouped by room, in first-seen room order:
///
/// ```text
/// Kitchen:
///   - Kitchen Light (light): off
/// ```
pub fn device_context(devices: &[Arc<Device>]) -> String {
    let mut rooms: Vec<(&str, Vec<&Device>)> = Vec::new();
    for device in devices {
        match rooms.iter_mut().find(|(room, _)| *room == device.room) {
            Some((_, members)) => members.push(device.as_ref()),
            None => rooms.push((device.room.as_str(), vec![device.as_ref()])),
        }
    }

    let mut out = String::new();
    for (i, (room, members)) in rooms.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{room}:");
        for device in members {
            let _ = write!(
                out,
                "\n  - {} ({}): {}",
                device.name,
                device.device_type,
                if device.state.is_on { "on" } else { "off" }
            );
        }
    }
    out
}

/// Conversational front end over the router and a completion backend.
pub struct Assistant {
    aggregator: Arc<Aggregator>,
    router: CommandRouter,
    parser: Box<dyn IntentParser>,
    backend: Box<dyn CompletionBackend>,
    system_prompt: String,
    history: Mutex<Vec<ChatMessage>>,
}

impl Assistant {
    pub fn new(
        aggregator: Arc<Aggregator>,
        router: CommandRouter,
        backend: Box<dyn CompletionBackend>,
    ) -> Self {
        Self {
            aggregator,
            router,
            parser: Box::new(KeywordIntentParser),
            backend,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn IntentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Handle one user message and return the assistant's reply.
    pub async fn process(&self, message: &str) -> ChatMessage {
        let devices = self.aggregator.snapshot().to_vec();
        let mut history = self.history.lock().await;
        history.push(ChatMessage::user(message));

        let actions = self.parser.parse(message, &devices);
        let reply = if actions.is_empty() {
            let context = device_context(&devices);
            self.backend
                .respond(&self.system_prompt, &context, &history)
                .await
        } else {
            let mut results = Vec::with_capacity(actions.len());
            for action in &actions {
                results.push(self.router.execute(action).await);
            }
            if let [only] = results.as_slice() {
                only.clone()
            } else {
                let names: Vec<&str> = actions.iter().map(|a| a.device_name.as_str()).collect();
                format!("Done! I've updated these devices: {}", names.join(", "))
            }
        };

        let reply = ChatMessage::assistant(reply);
        history.push(reply.clone());
        let excess = history.len().saturating_sub(HISTORY_WINDOW);
        history.drain(..excess);
        reply
    }

    /// Conversation so far, oldest first.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.clone()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }
}
