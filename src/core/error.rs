//! Error types for the positioning engine

use thiserror::Error;

/// Failure reported by a hardware or panel collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("command rejected: {0}")]
    Rejected(String),

    #[error("not supported on this device: {0}")]
    Unsupported(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("device disconnected")]
    Disconnected,
}

impl DeviceError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Outcome of a failed preset or tracking-mode activation
#[derive(Debug, Error)]
pub enum ActivationError {
    /// Camera or preset id missing from the request
    #[error("invalid preset reference: {0}")]
    InvalidPresetReference(String),

    #[error("no default preset in catalog")]
    NoDefaultPreset,

    #[error("activation failed ({cause}): {source}")]
    ActivationFailed {
        cause: String,
        #[source]
        source: DeviceError,
    },
}

impl ActivationError {
    pub fn failed(cause: &str, source: DeviceError) -> Self {
        Self::ActivationFailed {
            cause: cause.to_string(),
            source,
        }
    }
}

/// Control value that does not match any selection encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("malformed selection '{value}': {reason}")]
    Malformed { value: String, reason: String },
}

impl SelectionError {
    pub fn malformed(reason: impl Into<String>, value: &str) -> Self {
        Self::Malformed {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(key: &str, value: &str) -> Self {
        Self::malformed(format!("missing '{}'", key), value)
    }
}

/// Pushing a value to the selector control failed
#[derive(Debug, Error)]
#[error("control '{control}' sync failed: {source}")]
pub struct ControlSyncError {
    pub control: String,
    #[source]
    pub source: DeviceError,
}
