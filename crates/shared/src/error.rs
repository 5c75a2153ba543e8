use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown screen '{0}'")]
pub struct UnknownScreen(pub String);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid message envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("malformed '{message_type}' message: {reason}")]
    Payload {
        message_type: String,
        reason: String,
    },
}

impl ProtocolError {
    pub fn payload(message_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Payload {
            message_type: message_type.into(),
            reason: reason.into(),
        }
    }
}
