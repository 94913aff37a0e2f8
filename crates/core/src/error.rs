use crate::constants::IDENTITY_NOT_FOUND_MARKER;
use crate::form::FormId;

/// Failure reported by a remote directory (forms list or unread count).
///
/// Collaborators classify their own failures so the controller never has to
/// inspect message text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("no authenticated identity")]
    AuthRequired,
    #[error("transient fetch failure: {0}")]
    Transient(String),
}

impl FetchError {
    /// Classifies a free-text failure coming from a legacy backend or client layer.
    ///
    /// Only the identity-not-found marker maps to [`FetchError::AuthRequired`].
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(IDENTITY_NOT_FOUND_MARKER) {
            Self::AuthRequired
        } else {
            Self::Transient(message)
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }
}

/// Failure reading or clearing the session store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read session store: {0}")]
    Read(std::io::Error),
    #[error("failed to write session store: {0}")]
    Write(std::io::Error),
    #[error("failed to deserialize session store: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to serialize session store: {0}")]
    Serialization(serde_json::Error),
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("form {0} is not in the current list")]
    UnknownForm(FormId),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type DeskResult<T> = std::result::Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_message_detects_identity_marker() {
        let err = FetchError::from_message("Error: User ID not found in storage");
        assert_eq!(err, FetchError::AuthRequired);
        assert!(err.is_auth_required());
    }

    #[test]
    fn test_from_message_keeps_other_failures_transient() {
        let err = FetchError::from_message("Network request failed");
        assert_eq!(err, FetchError::Transient("Network request failed".into()));
        assert!(!err.is_auth_required());
    }
}
