use thiserror::Error;
use transcript_model::{AddressError, FlagParseError, IdentityError, InvariantError};

/// Common error type that can hold any transcript error
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Invariant error: {0}")]
    Invariant(#[from] InvariantError),

    #[error("Flag error: {0}")]
    Flag(#[from] FlagParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl From<String> for CommonError {
    fn from(s: String) -> Self {
        CommonError::Generic(s)
    }
}

impl From<&str> for CommonError {
    fn from(s: &str) -> Self {
        CommonError::Generic(s.to_string())
    }
}
