use thiserror::Error;

use crate::KeyPath;

/// Errors raised while marshaling values and records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("{path}: has invalid keys: {}", .keys.join(", "))]
    UnusedKeys { path: KeyPath, keys: Vec<String> },

    #[error("{path}: expected {expected}, found {found}")]
    InvalidType {
        path: KeyPath,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: {message}")]
    Convert { path: KeyPath, message: String },

    #[error("{path}: {source}")]
    Parse {
        path: KeyPath,
        source: harvest_value::Error,
    },

    #[error("{path}: unknown type {type_url:?}")]
    UnknownType { path: KeyPath, type_url: String },

    #[error("{path}: missing type tag \"@type\"")]
    MissingTypeTag { path: KeyPath },

    #[error("marshal {type_name}: {message}")]
    Marshal {
        type_name: &'static str,
        message: String,
    },

    #[error("decode into {type_name}: {message}")]
    Decode {
        type_name: &'static str,
        message: String,
    },

    #[error("overwrite asset: asset has no payload")]
    MissingPayload,

    #[error("overwrite asset: cannot change payload type from {expected} to {found}")]
    TypeMismatch { expected: String, found: String },
}

impl Error {
    pub(crate) fn invalid_type(path: &KeyPath, expected: &'static str, found: &harvest_value::Value) -> Self {
        Error::InvalidType {
            path: path.clone(),
            expected,
            found: found.type_name(),
        }
    }

    pub(crate) fn convert(path: &KeyPath, message: impl Into<String>) -> Self {
        Error::Convert {
            path: path.clone(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
