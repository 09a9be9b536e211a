use thiserror::Error;

/// Errors raised while converting a single message or content part.
///
/// Both variants are local to one part; the converter fails the whole
/// message rather than silently dropping content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Invalid encoded payload: {0}")]
    InvalidEncodedPayload(String),

    #[error("Missing media type for file part ({0})")]
    MissingMediaType(String),
}

impl ConvertError {
    pub(crate) fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidEncodedPayload(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
