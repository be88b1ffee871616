use std::fmt;
use thiserror::Error;

use crate::types::ListenerId;

// ---------------------------------------------------------------------------
// ArgumentPosition
// ---------------------------------------------------------------------------

/// Which argument of a registry call violated its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentPosition {
    /// The event name.
    Name,
    /// The listener handle.
    Listener,
    /// A decoration value.
    Value,
}

impl fmt::Display for ArgumentPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Listener => "listener",
            Self::Value => "value",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// EmitterError
// ---------------------------------------------------------------------------

/// Errors returned by registry calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitterError {
    /// An argument broke the call's contract. Fix the call site; retrying
    /// with the same input fails again.
    #[error(r#"Invalid argument "{position}": expected {expected}, received {received}"#)]
    InvalidArgument {
        /// Which argument was rejected.
        position: ArgumentPosition,
        /// What the registry accepts in that position.
        expected: String,
        /// What it was given.
        received: String,
    },
}

impl EmitterError {
    pub(crate) fn invalid(
        position: ArgumentPosition,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            position,
            expected: expected.into(),
            received: received.into(),
        }
    }

    pub(crate) fn empty_name() -> Self {
        Self::invalid(ArgumentPosition::Name, "a non-empty event name", "\"\"")
    }

    pub(crate) fn unknown_listener(id: ListenerId) -> Self {
        Self::invalid(
            ArgumentPosition::Listener,
            "a registered listener id",
            format!("unknown id {id}"),
        )
    }

    /// The argument position that failed validation.
    pub fn position(&self) -> ArgumentPosition {
        match self {
            Self::InvalidArgument { position, .. } => *position,
        }
    }
}

/// Convenience alias — the default error type is `EmitterError`.
pub type Result<T, E = EmitterError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
