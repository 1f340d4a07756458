use async_trait::async_trait;

use crate::Result;

use super::types::{ChatCompletion, ChatRequest};

/// Port for the chat completions backend.
///
/// Implementations make exactly one network attempt per call and map
/// failures onto the core error taxonomy:
/// - non-success HTTP status -> `Error::Api { status, body }`
/// - connection/timeout problems -> `Error::Transport`
/// - a 200 with an unparseable body -> `Error::MalformedResponse`
///
/// No retry, no client-side cancellation; callers always await completion.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatCompletion>;
}
