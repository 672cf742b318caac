//! Error types for value parsing.

use thiserror::Error;

/// Errors raised while parsing textual values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid duration {input:?}: {message}")]
    InvalidDuration { input: String, message: String },

    #[error("invalid timestamp {input:?}: {message}")]
    InvalidTimestamp { input: String, message: String },

    #[error("number {number} {message}")]
    UnrepresentableNumber { number: String, message: &'static str },
}

impl Error {
    pub(crate) fn number(number: impl ToString, message: &'static str) -> Self {
        Error::UnrepresentableNumber {
            number: number.to_string(),
            message,
        }
    }

    pub(crate) fn duration(input: &str, message: impl Into<String>) -> Self {
        Error::InvalidDuration {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
