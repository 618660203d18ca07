//! Error types for tau reconstruction and classification

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TauError {
    /// The event is internally inconsistent; it is skipped, not fatal to the run.
    #[error("Malformed event {event}: {reason}")]
    MalformedEvent { event: u64, reason: String },

    /// A zero or non-finite transverse momentum was about to be used as a denominator.
    #[error("Degenerate vector: {0}")]
    DegenerateVector(&'static str),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TauError {
    /// Build a [`TauError::MalformedEvent`]
    pub fn malformed(event: u64, reason: impl Into<String>) -> Self {
        TauError::MalformedEvent {
            event,
            reason: reason.into(),
        }
    }

    /// Whether the run may continue past this error (skip the event)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TauError::MalformedEvent { .. } | TauError::DegenerateVector(_)
        )
    }
}

impl From<serde_json::Error> for TauError {
    fn from(err: serde_json::Error) -> Self {
        TauError::Serialization(err.to_string())
    }
}
