//! Per-user conversation state: histories and personas.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{ChatMessage, Role, UserId};

#[derive(Default)]
struct State {
    histories: HashMap<UserId, Vec<ChatMessage>>,
    personas: HashMap<UserId, String>,
}

/// Counts reported by the `stats` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionCounts {
    pub conversations: usize,
    pub personas: usize,
    pub messages: usize,
}

/// Owns all per-user conversation histories and persona overrides.
///
/// Personas have an independent lifecycle from histories: setting one does
/// not touch an existing history, and resetting a history leaves the persona
/// in place. A persona only takes effect when a history is (re)created from
/// empty, seeded as the leading `system` message.
pub struct SessionStore {
    state: Mutex<State>,
    max_messages: usize,
}

impl SessionStore {
    /// `max_messages` bounds each history after an append; `0` disables the
    /// cap. A leading persona `system` message is never trimmed.
    pub fn new(max_messages: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            max_messages,
        }
    }

    /// Return the user's history, creating it (seeded with the persona, if
    /// any) when absent.
    pub async fn get_or_create(&self, user_id: &UserId) -> Vec<ChatMessage> {
        let mut st = self.state.lock().await;
        if !st.histories.contains_key(user_id) {
            let mut history = Vec::new();
            if let Some(persona) = st.personas.get(user_id) {
                history.push(ChatMessage::system(persona.clone()));
            }
            st.histories.insert(user_id.clone(), history);
        }
        st.histories[user_id].clone()
    }

    pub async fn push_user(&self, user_id: &UserId, content: &str) {
        self.push(user_id, ChatMessage::user(content)).await;
    }

    pub async fn push_assistant(&self, user_id: &UserId, content: &str) {
        self.push(user_id, ChatMessage::assistant(content)).await;
    }

    /// Append to an existing history. Callers ensure the history exists via
    /// `get_or_create` first; appends for unknown users are dropped.
    async fn push(&self, user_id: &UserId, message: ChatMessage) {
        let mut st = self.state.lock().await;
        let Some(history) = st.histories.get_mut(user_id) else {
            return;
        };
        history.push(message);
        trim_history(history, self.max_messages);
    }

    /// Snapshot of the current history (empty if none exists).
    pub async fn messages(&self, user_id: &UserId) -> Vec<ChatMessage> {
        let st = self.state.lock().await;
        st.histories.get(user_id).cloned().unwrap_or_default()
    }

    /// Store or overwrite the persona. Existing histories are untouched; the
    /// persona applies the next time a history is created from empty.
    pub async fn set_persona(&self, user_id: &UserId, persona: &str) {
        let mut st = self.state.lock().await;
        st.personas.insert(user_id.clone(), persona.to_string());
    }

    /// Drop the user's history entirely. The persona survives.
    pub async fn reset(&self, user_id: &UserId) {
        let mut st = self.state.lock().await;
        st.histories.remove(user_id);
    }

    pub async fn counts(&self) -> SessionCounts {
        let st = self.state.lock().await;
        SessionCounts {
            conversations: st.histories.len(),
            personas: st.personas.len(),
            messages: st.histories.values().map(|h| h.len()).sum(),
        }
    }
}

/// Drop the oldest non-system messages once the history exceeds `max`.
fn trim_history(history: &mut Vec<ChatMessage>, max: usize) {
    if max == 0 || history.len() <= max {
        return;
    }
    let start = usize::from(history.first().map(|m| m.role == Role::System).unwrap_or(false));
    let excess = (history.len() - max).min(history.len() - start);
    history.drain(start..start + excess);
}
