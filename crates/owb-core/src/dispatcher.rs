//! Command dispatcher: maps parsed user commands onto the session store,
//! gateway, and chunker, and produces ready-to-send reply segments.

use std::sync::Arc;

use crate::{
    config::Config,
    domain::{ChatMessage, UserId},
    formatting::split_message,
    gateway::{ModelGateway, ReplyResult},
    model::client::ChatApi,
    session::{SessionCounts, SessionStore},
    usage::{UsageReport, UsageStats},
};

/// A parsed user command, platform-agnostic. Adapters translate their own
/// syntax (`/ask ...`, `!ask ...`) into this.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Summarize(String),
    SetPersona(String),
    Reset,
    Stats,
    Commands,
}

const HELP_TEXT: &str = "🤖 Available commands:\n\
/ask [message] — Send a message to the model and get a response.\n\
/summarize [text] — Summarize input using a dedicated model.\n\
/setpersona [description] — Define how the assistant should behave for you.\n\
/reset — Clear your personal conversation history.\n\
/stats — View overall bot and usage stats.\n\
/commands — Show this help message.";

/// Process-scoped state container: owns the session store, the usage
/// aggregator, and the gateway. One instance per process, shared by the
/// platform adapter.
pub struct Dispatcher {
    cfg: Arc<Config>,
    store: SessionStore,
    gateway: ModelGateway,
    stats: Arc<UsageStats>,
}

impl Dispatcher {
    pub fn new(cfg: Arc<Config>, api: Arc<dyn ChatApi>) -> Self {
        let stats = Arc::new(UsageStats::new());
        Self {
            store: SessionStore::new(cfg.history_max_messages),
            gateway: ModelGateway::new(api, stats.clone()),
            stats,
            cfg,
        }
    }

    /// Handle one command and return the reply segments to emit, in order.
    ///
    /// Never fails: every error path is already a displayable message.
    pub async fn handle(&self, user_id: &UserId, username: &str, command: Command) -> Vec<String> {
        match command {
            Command::Ask(prompt) => self.ask(user_id, username, &prompt).await,
            Command::Summarize(text) => self.summarize(user_id, username, &text).await,
            Command::SetPersona(persona) => {
                self.store.set_persona(user_id, &persona).await;
                vec![format!(
                    "✅ Persona set! Future replies will reflect: {persona}"
                )]
            }
            Command::Reset => {
                self.store.reset(user_id).await;
                vec!["🗑️ Your conversation history has been reset.".to_string()]
            }
            Command::Stats => {
                let text = format_stats(self.store.counts().await, self.stats.snapshot());
                split_message(&text, self.cfg.message_limit)
            }
            Command::Commands => vec![HELP_TEXT.to_string()],
        }
    }

    async fn ask(&self, user_id: &UserId, username: &str, prompt: &str) -> Vec<String> {
        self.store.get_or_create(user_id).await;
        self.store.push_user(user_id, prompt).await;
        let messages = self.store.messages(user_id).await;

        match self
            .gateway
            .send_request(&self.cfg.chat_model, &messages, user_id, username)
            .await
        {
            ReplyResult::Reply(text) => {
                self.store.push_assistant(user_id, &text).await;
                split_message(&text, self.cfg.message_limit)
            }
            // The failed turn keeps the user's message in context for the
            // next attempt; the error itself is not persisted.
            ReplyResult::Failure(msg) => vec![msg],
        }
    }

    async fn summarize(&self, user_id: &UserId, username: &str, text: &str) -> Vec<String> {
        let messages = vec![ChatMessage::user(text)];
        let result = self
            .gateway
            .send_request(&self.cfg.summarizer_model, &messages, user_id, username)
            .await;
        match result {
            ReplyResult::Reply(text) => split_message(&text, self.cfg.message_limit),
            ReplyResult::Failure(msg) => vec![msg],
        }
    }
}

fn format_stats(counts: SessionCounts, report: UsageReport) -> String {
    format!(
        "📊 Bot Stats:\n- Active conversations: {}\n- Custom personas set: {}\n- Total messages tracked: {}\n\n🧠 Model Usage Stats:\n- Requests made: {}\n- Total tokens used: {}\n  - Prompt: {}\n  - Completion: {}\n- Total runtime: {}\n- Avg response speed: {:.2} tokens/sec",
        counts.conversations,
        counts.personas,
        counts.messages,
        report.total_requests,
        report.total_tokens,
        report.total_prompt_tokens,
        report.total_completion_tokens,
        format_duration_ns(report.total_duration_ns),
        report.avg_tokens_per_second,
    )
}

fn format_duration_ns(ns: u64) -> String {
    let secs = ns / 1_000_000_000;
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{hours:02}h{mins:02}m{secs:02}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::errors::Error;
    use crate::model::types::{AssistantReply, ChatCompletion, ChatRequest, Choice};
    use crate::usage::UsageSample;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeApi {
        outcomes: Mutex<Vec<crate::Result<ChatCompletion>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl FakeApi {
        fn new(outcomes: Vec<crate::Result<ChatCompletion>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn reply(text: &str, usage: Option<UsageSample>) -> crate::Result<ChatCompletion> {
            Ok(ChatCompletion {
                choices: vec![Choice {
                    message: Some(AssistantReply {
                        content: Some(text.to_string()),
                    }),
                }],
                usage,
            })
        }
    }

    #[async_trait]
    impl ChatApi for FakeApi {
        async fn chat(&self, req: &ChatRequest) -> crate::Result<ChatCompletion> {
            self.requests.lock().unwrap().push(req.clone());
            self.outcomes.lock().unwrap().remove(0)
        }
    }

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            api_url: "http://localhost/api/chat/completions".to_string(),
            api_token: "token".to_string(),
            chat_model: "discord".to_string(),
            summarizer_model: "summarizer".to_string(),
            request_timeout: std::time::Duration::from_secs(1),
            telegram_bot_token: "x".to_string(),
            message_limit: 2000,
            history_max_messages: 0,
            debug_mode: false,
            rate_limit_enabled: true,
            rate_limit_requests: 1,
            rate_limit_window: std::time::Duration::from_secs(5),
        })
    }

    fn dispatcher(api: Arc<FakeApi>) -> Dispatcher {
        Dispatcher::new(test_config(), api)
    }

    fn uid() -> UserId {
        UserId::new("42")
    }

    #[tokio::test]
    async fn ask_appends_turns_and_updates_stats() {
        let usage = UsageSample {
            prompt_tokens: 5,
            completion_tokens: 3,
            total_tokens: 8,
            duration_ns: 2_000_000_000,
            tokens_per_second: None,
        };
        let api = FakeApi::new(vec![FakeApi::reply("Hi there", Some(usage))]);
        let d = dispatcher(api.clone());

        let out = d
            .handle(&uid(), "alice", Command::Ask("Hello".to_string()))
            .await;
        assert_eq!(out, vec!["Hi there".to_string()]);

        let history = d.store.messages(&uid()).await;
        assert_eq!(history, vec![ChatMessage::user("Hello"), ChatMessage::assistant("Hi there")]);

        let report = d.stats.snapshot();
        assert_eq!(report.total_requests, 1);
        assert_eq!(report.total_tokens, 8);
    }

    #[tokio::test]
    async fn second_ask_sends_prior_turns_in_order() {
        let api = FakeApi::new(vec![
            FakeApi::reply("first answer", None),
            FakeApi::reply("second answer", None),
        ]);
        let d = dispatcher(api.clone());

        d.handle(&uid(), "alice", Command::Ask("first question".to_string()))
            .await;
        d.handle(&uid(), "alice", Command::Ask("second question".to_string()))
            .await;

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].messages,
            vec![
                ChatMessage::user("first question"),
                ChatMessage::assistant("first answer"),
                ChatMessage::user("second question"),
            ]
        );
    }

    #[tokio::test]
    async fn ask_seeds_persona_into_the_payload() {
        let api = FakeApi::new(vec![FakeApi::reply("arr", None)]);
        let d = dispatcher(api.clone());

        d.handle(&uid(), "alice", Command::SetPersona("talk like a pirate".to_string()))
            .await;
        d.handle(&uid(), "alice", Command::Ask("hello".to_string())).await;

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages[0].content, "talk like a pirate");
    }

    #[tokio::test]
    async fn failed_ask_keeps_user_message_but_no_assistant_turn() {
        let api = FakeApi::new(vec![Err(Error::Api {
            status: 500,
            body: "server error".to_string(),
        })]);
        let d = dispatcher(api);

        let out = d.handle(&uid(), "alice", Command::Ask("Hello".to_string())).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("500"));
        assert!(out[0].contains("server error"));

        assert_eq!(d.store.messages(&uid()).await, vec![ChatMessage::user("Hello")]);
        assert_eq!(d.stats.snapshot().total_requests, 0);
    }

    #[tokio::test]
    async fn summarize_uses_its_own_model_and_persists_nothing() {
        let api = FakeApi::new(vec![FakeApi::reply("a summary", None)]);
        let d = dispatcher(api.clone());

        let out = d
            .handle(&uid(), "alice", Command::Summarize("long text".to_string()))
            .await;
        assert_eq!(out, vec!["a summary".to_string()]);

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].model, "summarizer");
        assert_eq!(requests[0].messages, vec![ChatMessage::user("long text")]);
        drop(requests);

        assert!(d.store.messages(&uid()).await.is_empty());
    }

    #[tokio::test]
    async fn reset_clears_history_and_confirms() {
        let api = FakeApi::new(vec![FakeApi::reply("hi", None)]);
        let d = dispatcher(api);

        d.handle(&uid(), "alice", Command::Ask("hello".to_string())).await;
        let out = d.handle(&uid(), "alice", Command::Reset).await;
        assert_eq!(out, vec!["🗑️ Your conversation history has been reset.".to_string()]);
        assert!(d.store.messages(&uid()).await.is_empty());
    }

    #[tokio::test]
    async fn long_replies_are_chunked() {
        let line = "a".repeat(1500);
        let reply = format!("{line}\n{line}");
        let api = FakeApi::new(vec![FakeApi::reply(&reply, None)]);
        let d = dispatcher(api);

        let out = d.handle(&uid(), "alice", Command::Ask("go".to_string())).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out.concat(), reply);
    }

    #[tokio::test]
    async fn stats_command_reports_counts_and_totals() {
        let usage = UsageSample {
            prompt_tokens: 4,
            completion_tokens: 6,
            total_tokens: 10,
            duration_ns: 3_500_000_000,
            tokens_per_second: Some(25.0),
        };
        let api = FakeApi::new(vec![FakeApi::reply("hi", Some(usage))]);
        let d = dispatcher(api);

        d.handle(&uid(), "alice", Command::Ask("hello".to_string())).await;
        let out = d.handle(&uid(), "alice", Command::Stats).await;
        let text = out.concat();

        assert!(text.contains("Active conversations: 1"));
        assert!(text.contains("Total messages tracked: 2"));
        assert!(text.contains("Requests made: 1"));
        assert!(text.contains("Total tokens used: 10"));
        assert!(text.contains("00h00m03s"));
        assert!(text.contains("25.00 tokens/sec"));
    }

    #[tokio::test]
    async fn commands_lists_every_command() {
        let api = FakeApi::new(vec![]);
        let d = dispatcher(api);

        let out = d.handle(&uid(), "alice", Command::Commands).await;
        let text = out.concat();
        for cmd in ["/ask", "/summarize", "/setpersona", "/reset", "/stats", "/commands"] {
            assert!(text.contains(cmd), "help text missing {cmd}");
        }
    }

    #[test]
    fn duration_formatting_rolls_up_hours() {
        assert_eq!(format_duration_ns(0), "00h00m00s");
        assert_eq!(format_duration_ns(2_000_000_000), "00h00m02s");
        assert_eq!(format_duration_ns(3_661 * 1_000_000_000), "01h01m01s");
    }
}
