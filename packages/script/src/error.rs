//! Error types for compiling and running scripts.

use std::fmt;

use thiserror::Error;

/// A run-time resource guarded by [`ScriptLimits`](crate::ScriptLimits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Allocations,
    Constants,
    Memory,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Allocations => write!(f, "allocations"),
            Resource::Constants => write!(f, "constant objects"),
            Resource::Memory => write!(f, "memory bytes"),
        }
    }
}

/// Why a run stopped before finishing on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "context canceled"),
            CancelReason::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Errors from compiling or running a script.
///
/// An `exit()` call is not an error; it surfaces as
/// [`RunOutcome::UserExited`](crate::RunOutcome::UserExited).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("compile error: {message}")]
    Compile { message: String },

    #[error("runtime error: {}", runtime_message(.function, .message))]
    Runtime {
        function: Option<String>,
        message: String,
    },

    #[error("resource limit exceeded: more than {limit} {resource}")]
    ResourceLimitExceeded { resource: Resource, limit: u64 },

    #[error("script cancelled: {reason}")]
    Cancelled { reason: CancelReason },

    #[error("marshal: {0}")]
    Marshal(#[from] harvest_structmap::Error),

    #[error("global {0:?} is not declared for this script")]
    Undeclared(String),

    #[error("script has already run")]
    AlreadyRun,

    #[error("invalid script config: {0}")]
    InvalidConfig(String),

    #[error("interpreter: {0}")]
    Interpreter(String),
}

fn runtime_message(function: &Option<String>, message: &str) -> String {
    match function {
        Some(function) => format!("{function}: {message}"),
        None => message.to_string(),
    }
}

impl Error {
    /// A failure inside the named host function.
    pub fn runtime(function: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Runtime {
            function: Some(function.into()),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    pub fn is_resource_limit(&self) -> bool {
        matches!(self, Error::ResourceLimitExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
