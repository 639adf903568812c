use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid pitch format: {0:?}")]
    InvalidPitchFormat(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DomainError {
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_pitch<T: Into<String>>(raw: T) -> Self {
        Self::InvalidPitchFormat(raw.into())
    }
}
