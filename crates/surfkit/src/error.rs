//! Load pipeline errors.

use thiserror::Error;

/// Why a surface failed to load. Every variant names the surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// No decoder recognizes the file name.
    #[error("surface format of '{name}' is not supported")]
    UnsupportedFormat { name: String },

    /// The bytes could not be obtained.
    #[error("there was a problem reading '{name}': {reason}")]
    Transport { name: String, reason: String },

    /// The decoder rejected the data, or produced inconsistent geometry.
    #[error("failed to decode '{name}': {reason}")]
    Decode { name: String, reason: String },

    /// Anything else that went wrong while decoding or deriving attributes.
    #[error("unexpected failure loading '{name}': {reason}")]
    Unexpected { name: String, reason: String },
}

impl LoadError {
    pub(crate) fn transport(name: &str, reason: impl ToString) -> Self {
        Self::Transport {
            name: name.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(name: &str, reason: impl ToString) -> Self {
        Self::Decode {
            name: name.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unexpected(name: &str, reason: impl ToString) -> Self {
        Self::Unexpected {
            name: name.to_owned(),
            reason: reason.to_string(),
        }
    }

    /// Name of the surface the error belongs to.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::UnsupportedFormat { name }
            | Self::Transport { name, .. }
            | Self::Decode { name, .. }
            | Self::Unexpected { name, .. } => name,
        }
    }
}

/// Result type for loading.
pub type LoadResult<T> = Result<T, LoadError>;
