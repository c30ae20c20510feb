use sf_compiler::BuildError;

/// Failure reported by a browser host API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error type for worker operations.
///
/// The `Display` text is what callers see in the `error` field of a failed
/// response.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Invalid message")]
    InvalidMessage,
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),
    #[error("Malformed {kind} message: {reason}")]
    MalformedMessage { kind: String, reason: String },
    #[error("Please enter a valid domain (example.com)")]
    InvalidDomain(String),
    #[error("No note at index {0}")]
    NoteNotFound(usize),
    #[error("Storage error: {0}")]
    Storage(#[source] HostError),
    #[error("Rule update failed: {0}")]
    RuleApi(#[source] HostError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkerError {
    /// Errors caused by the caller's input rather than the host.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidMessage
                | Self::UnknownMessageType(_)
                | Self::MalformedMessage { .. }
                | Self::InvalidDomain(_)
                | Self::NoteNotFound(_)
        )
    }
}
