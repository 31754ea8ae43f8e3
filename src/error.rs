//! Error types.
//!
//! Application-level failures (404, 400, 500 from a handler, ...) are
//! expressed as [`Response`](crate::Response) values, never as errors. The
//! types here cover the rest: infrastructure failures, body decoding, and
//! what a handler may return instead of a response.

use thiserror::Error;

/// The error type returned by viaduct's fallible operations: binding the
/// local server, parsing configuration, encoding a response body.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("encode {format}: {message}")]
    Encode { format: &'static str, message: String },
}

/// Anything a handler can fail with. Becomes a 500.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Why a request body could not be decoded. `Display` is the exact 400 body.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DecodeError {
    /// A required field was absent.
    #[error("Invalid request. Error is: {0}")]
    MissingField(String),

    /// The body is not well-formed in its declared format.
    #[error("Could not deserialize body. Error is: {0}")]
    Syntax(String),

    /// Well-formed, but a value has the wrong type or is out of range.
    #[error("Could not deserialize body; invalid value. Error is: {0}")]
    InvalidValue(String),
}

impl DecodeError {
    pub(crate) fn from_json(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let message = err.to_string();
        match err.classify() {
            Category::Data => Self::from_data_message(message),
            Category::Syntax | Category::Eof | Category::Io => Self::Syntax(message),
        }
    }

    pub(crate) fn from_yaml(err: serde_yaml::Error) -> Self {
        let message = err.to_string();
        if is_data_message(&message) {
            Self::from_data_message(message)
        } else {
            Self::Syntax(message)
        }
    }

    /// Errors from decoding the raw body string directly into the target.
    pub(crate) fn from_raw(err: serde::de::value::Error) -> Self {
        Self::from_data_message(err.to_string())
    }

    fn from_data_message(message: String) -> Self {
        if message.starts_with("missing field") {
            Self::MissingField(message)
        } else {
            Self::InvalidValue(message)
        }
    }
}

fn is_data_message(message: &str) -> bool {
    ["missing field", "invalid type", "invalid value", "invalid length", "unknown variant", "unknown field"]
        .iter()
        .any(|prefix| message.starts_with(prefix))
}
