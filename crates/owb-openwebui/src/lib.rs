//! Open WebUI adapter: the `ChatApi` port over the OpenAI-compatible chat
//! completions HTTP endpoint.

use std::time::Duration;

use async_trait::async_trait;

use owb_core::{
    errors::Error,
    model::{
        client::ChatApi,
        types::{ChatCompletion, ChatRequest},
    },
    Result,
};

#[derive(Clone, Debug)]
pub struct OpenWebUiClient {
    api_url: String,
    api_token: String,
    http: reqwest::Client,
}

impl OpenWebUiClient {
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("owb/0.1")
            .build()
            .expect("reqwest client build");
        Self {
            api_url: api_url.into(),
            api_token: api_token.into(),
            http,
        }
    }
}

#[async_trait]
impl ChatApi for OpenWebUiClient {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatCompletion> {
        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(req)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("chat request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<ChatCompletion>()
            .await
            .map_err(|e| Error::MalformedResponse(format!("chat endpoint returned invalid JSON: {e}")))
    }
}
