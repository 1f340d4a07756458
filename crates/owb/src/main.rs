use std::sync::Arc;

use owb_core::{config::Config, dispatcher::Dispatcher, model::client::ChatApi};
use owb_openwebui::OpenWebUiClient;

#[tokio::main]
async fn main() -> Result<(), owb_core::Error> {
    let cfg = Arc::new(Config::load()?);
    owb_core::logging::init("owb", cfg.debug_mode)?;

    let api: Arc<dyn ChatApi> = Arc::new(OpenWebUiClient::new(
        cfg.api_url.clone(),
        cfg.api_token.clone(),
        cfg.request_timeout,
    ));
    let dispatcher = Arc::new(Dispatcher::new(cfg.clone(), api));

    owb_telegram::router::run_polling(cfg, dispatcher)
        .await
        .map_err(|e| owb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
