//! Model Gateway: request orchestration and usage accounting.

use std::sync::Arc;

use crate::{
    domain::{ChatMessage, UserId},
    errors::Error,
    model::{
        client::ChatApi,
        types::{ChatCompletion, ChatRequest},
    },
    usage::UsageStats,
};

/// Product decision inherited from the original bot: a 200 without reply
/// content is shown as this literal, not treated as an error.
pub const NO_RESPONSE_FALLBACK: &str = "No response received.";

/// Outcome of one gateway call. Failures are already formatted for display;
/// nothing escapes this boundary as an `Err`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyResult {
    Reply(String),
    Failure(String),
}

impl ReplyResult {
    pub fn text(&self) -> &str {
        match self {
            ReplyResult::Reply(s) | ReplyResult::Failure(s) => s,
        }
    }
}

/// Serialized request body for debug logging. `ChatRequest` is plain data,
/// so serialization failure is theoretical.
fn payload_json(req: &ChatRequest) -> String {
    serde_json::to_string(req).unwrap_or_else(|e| format!("<unserializable payload: {e}>"))
}

pub struct ModelGateway {
    api: Arc<dyn ChatApi>,
    stats: Arc<UsageStats>,
}

impl ModelGateway {
    pub fn new(api: Arc<dyn ChatApi>, stats: Arc<UsageStats>) -> Self {
        Self { api, stats }
    }

    /// Send one chat request and convert the outcome to displayable text.
    ///
    /// On success the usage aggregator is updated exactly once (with zeroed
    /// counters if the backend omitted the `usage` object). On any failure
    /// the aggregator is untouched and a formatted error string is returned.
    pub async fn send_request(
        &self,
        model: &str,
        messages: &[ChatMessage],
        user_id: &UserId,
        username: &str,
    ) -> ReplyResult {
        let req = ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
        };
        tracing::debug!(
            user = %user_id,
            username,
            model,
            history_len = req.messages.len(),
            payload = %payload_json(&req),
            "sending chat request"
        );

        match self.api.chat(&req).await {
            Ok(completion) => {
                tracing::debug!(response = ?completion, "received chat response");
                self.log_request_summary(user_id, username, model, &completion);
                let usage = completion.usage.clone().unwrap_or_default();
                self.stats.record(&usage);

                let text = completion
                    .reply_text()
                    .unwrap_or(NO_RESPONSE_FALLBACK)
                    .to_string();
                ReplyResult::Reply(text)
            }
            Err(Error::Api { status, body }) => {
                tracing::warn!(status, body = %body, "API returned an error status");
                ReplyResult::Failure(format!("⚠️ API error: HTTP {status}: {body}"))
            }
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                ReplyResult::Failure(format!("❌ Request failed: {e}"))
            }
        }
    }

    fn log_request_summary(
        &self,
        user_id: &UserId,
        username: &str,
        model: &str,
        completion: &ChatCompletion,
    ) {
        let usage = completion.usage.clone().unwrap_or_default();
        let latency_secs = usage.duration_ns as f64 / 1e9;
        tracing::info!(
            user = %user_id,
            username,
            model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            latency_secs = format!("{latency_secs:.2}"),
            "request completed"
        );
    }
}
