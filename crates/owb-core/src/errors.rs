/// Core error type for the relay bot.
///
/// Adapter crates map their specific failures into this type so the
/// dispatcher and gateway can handle them consistently (user-facing message
/// vs logged detail).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The upstream API answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never produced a usable HTTP response (connection refused,
    /// timeout, etc).
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream API answered 200 but the body was not the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
