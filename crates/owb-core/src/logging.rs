use tracing_subscriber::{fmt, EnvFilter};

use crate::Result;

/// Initialize tracing for the bot.
///
/// `debug_mode` raises the default level so full request/response payloads
/// are logged; `RUST_LOG` overrides everything.
pub fn init(service_name: &str, debug_mode: bool) -> Result<()> {
    let default_level = if debug_mode { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{default_level},owb_core={default_level},{service_name}={default_level}"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .init();

    Ok(())
}
