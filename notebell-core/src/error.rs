//! Error taxonomy for note operations

use crate::NoteId;
use thiserror::Error;

/// Failure of a note repository call or of a client-side precondition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NoteError {
    /// The store (or the client, before submitting) rejected the fields.
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    /// The target note no longer exists in the store.
    #[error("Note not found: {id}")]
    NotFound { id: NoteId },

    /// Network, timeout, unexpected status, or undecodable response.
    #[error("Transport failure: {reason}")]
    Transport { reason: String },
}

impl NoteError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type NoteResult<T> = Result<T, NoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = NoteError::NotFound {
            id: NoteId::new(9),
        };
        assert_eq!(err.to_string(), "Note not found: 9");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_validation_display() {
        let err = NoteError::validation("title must not be empty");
        assert_eq!(err.to_string(), "Validation failed: title must not be empty");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_transport_display() {
        let err = NoteError::transport("connection refused");
        assert_eq!(err.to_string(), "Transport failure: connection refused");
    }
}
