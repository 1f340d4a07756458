use std::sync::Arc;

use teloxide::{dispatching::Dispatcher as TgDispatcher, dptree, prelude::*};
use tokio::sync::Mutex;

use owb_core::{
    config::Config,
    dispatcher::{Command, Dispatcher},
    domain::UserId,
    ratelimit::RateLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

pub async fn run_polling(cfg: Arc<Config>, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        tracing::info!(bot = me.username(), "owb started");
    }

    let state = Arc::new(AppState {
        rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
            cfg.rate_limit_enabled,
            cfg.rate_limit_requests,
            cfg.rate_limit_window,
        ))),
        cfg,
        dispatcher,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    TgDispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let (name, args) = parse_command(text);
    let Some(command) = command_from_parts(&name, &args) else {
        return Ok(());
    };

    let user_id = UserId::new(user.id.0.to_string());
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    // Cooldown applies only to model-backed commands.
    if matches!(command, Command::Ask(_) | Command::Summarize(_)) {
        let (ok, retry) = state.rate_limiter.lock().await.check(&user_id);
        if !ok {
            let wait = retry.map(|d| d.as_secs_f64()).unwrap_or(0.0);
            bot.send_message(
                msg.chat.id,
                format!("⏳ You're on cooldown. Try again in {wait:.1} seconds."),
            )
            .await?;
            return Ok(());
        }
    }

    let segments = state.dispatcher.handle(&user_id, &username, command).await;
    for segment in segments {
        if let Err(e) = bot.send_message(msg.chat.id, segment).await {
            tracing::error!(error = %e, chat_id = msg.chat.id.0, "failed to send reply segment");
        }
    }

    Ok(())
}

/// Telegram may send `/cmd@botname arg1 ...`; `!cmd` is accepted for parity
/// with the original prefix.
fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches(['/', '!'])
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn command_from_parts(name: &str, args: &str) -> Option<Command> {
    match name {
        "ask" if !args.is_empty() => Some(Command::Ask(args.to_string())),
        "summarize" if !args.is_empty() => Some(Command::Summarize(args.to_string())),
        "setpersona" if !args.is_empty() => Some(Command::SetPersona(args.to_string())),
        "reset" => Some(Command::Reset),
        "stats" => Some(Command::Stats),
        "commands" | "help" | "start" => Some(Command::Commands),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slash_commands_with_bot_suffix() {
        let (cmd, rest) = parse_command("/ask@mybot what is rust?");
        assert_eq!(cmd, "ask");
        assert_eq!(rest, "what is rust?");
    }

    #[test]
    fn parses_bang_prefix() {
        let (cmd, rest) = parse_command("!summarize  some long text ");
        assert_eq!(cmd, "summarize");
        assert_eq!(rest, "some long text");
    }

    #[test]
    fn unknown_or_bare_commands_map_correctly() {
        assert_eq!(command_from_parts("reset", ""), Some(Command::Reset));
        assert_eq!(command_from_parts("stats", ""), Some(Command::Stats));
        assert_eq!(command_from_parts("ask", ""), None); // no prompt given
        assert_eq!(command_from_parts("dance", "x"), None);
    }

    #[test]
    fn help_aliases_show_the_command_list() {
        assert_eq!(command_from_parts("help", ""), Some(Command::Commands));
        assert_eq!(command_from_parts("start", ""), Some(Command::Commands));
    }
}
