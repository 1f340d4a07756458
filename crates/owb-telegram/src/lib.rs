//! Telegram adapter for the relay bot (long polling via teloxide).

pub mod router;
