use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed process configuration, sourced from the environment (with an
/// optional `.env` file that never overrides real env vars).
#[derive(Clone, Debug)]
pub struct Config {
    // Upstream API
    pub api_url: String,
    pub api_token: String,
    pub chat_model: String,
    pub summarizer_model: String,
    pub request_timeout: Duration,

    // Telegram
    pub telegram_bot_token: String,

    // Behavior
    pub message_limit: usize,
    /// Per-user history cap applied after each append; 0 disables trimming.
    pub history_max_messages: usize,
    pub debug_mode: bool,

    // Rate limiting
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let api_token = env_str("OPEN_WEBUI_API_TOKEN").unwrap_or_default();
        let api_url = env_str("OPEN_WEBUI_API_URL").unwrap_or_default();
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();

        if api_token.trim().is_empty() {
            return Err(Error::Config(
                "OPEN_WEBUI_API_TOKEN environment variable is required".to_string(),
            ));
        }
        if api_url.trim().is_empty() {
            return Err(Error::Config(
                "OPEN_WEBUI_API_URL environment variable is required".to_string(),
            ));
        }
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        // Model names are Open WebUI presets; the defaults match the
        // deployment this bot was written for.
        let chat_model = env_str("CHAT_MODEL").unwrap_or_else(|| "discord".to_string());
        let summarizer_model =
            env_str("SUMMARIZER_MODEL").unwrap_or_else(|| "summarizer".to_string());

        let request_timeout = Duration::from_secs(env_u64("REQUEST_TIMEOUT_SECS").unwrap_or(120));
        let message_limit = env_usize("MESSAGE_LIMIT").unwrap_or(2000);
        let history_max_messages = env_usize("HISTORY_MAX_MESSAGES").unwrap_or(100);
        let debug_mode = env_bool("DEBUG_MODE").unwrap_or(false);

        let rate_limit_enabled = env_bool("RATE_LIMIT_ENABLED").unwrap_or(true);
        // A limit of zero requests would lock every user out; the limiter
        // needs at least one token per window, so clamp misconfiguration up.
        let rate_limit_requests = env_u32("RATE_LIMIT_REQUESTS").unwrap_or(1).max(1);
        let rate_limit_window =
            Duration::from_secs(env_u64("RATE_LIMIT_WINDOW_SECS").unwrap_or(5));

        Ok(Self {
            api_url,
            api_token,
            chat_model,
            summarizer_model,
            request_timeout,
            telegram_bot_token,
            message_limit,
            history_max_messages,
            debug_mode,
            rate_limit_enabled,
            rate_limit_requests,
            rate_limit_window,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}
