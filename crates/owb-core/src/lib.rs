//! Core domain + application logic for the Open WebUI relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / the Open WebUI
//! HTTP API live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod ratelimit;
pub mod session;
pub mod usage;

pub use errors::{Error, Result};
