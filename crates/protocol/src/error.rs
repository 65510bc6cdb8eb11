use {serde::Serialize, thiserror::Error};

use crate::error_codes;

/// Caller-contract violations. Malformed server output never produces one of
/// these; it is folded into a failed [`crate::NormalizedResponse`] instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot call '{method}' when the args property is not an object")]
    ArgsNotMapping { method: &'static str },

    #[error("call descriptor has no function name")]
    MissingFunction,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Structured classification, separate from the human-readable text.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        let kind = match self {
            Self::ArgsNotMapping { .. } => error_codes::ARGS_NOT_MAPPING,
            Self::MissingFunction => error_codes::MISSING_FUNCTION,
            Self::Json(_) => error_codes::PROTOCOL_ERROR,
            Self::Message(_) => error_codes::INTERNAL,
        };
        ErrorKind {
            kind,
            detail: self.to_string(),
        }
    }
}

/// `{kind, detail}` pair handed to presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorKind {
    pub kind: &'static str,
    pub detail: String,
}

pub type Result<T> = std::result::Result<T, Error>;
