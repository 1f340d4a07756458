use serde::{Deserialize, Serialize};

use crate::domain::ChatMessage;
use crate::usage::UsageSample;

/// Outbound payload for the chat completions endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Response shape of the OpenAI-compatible chat completions endpoint.
///
/// Every field is optional on the wire; defaults keep partial responses
/// usable instead of failing deserialization.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<UsageSample>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<AssistantReply>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Reply text from the first choice, if the backend produced one.
    pub fn reply_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}
