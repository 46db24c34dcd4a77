use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Truncated identity: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Unsupported certificate type {0}")]
    UnsupportedCertificate(u8),

    #[error("Invalid key certificate length {0}")]
    InvalidCertificateLength(u16),

    #[error("Unsupported signing key type {0}")]
    UnsupportedSigningKey(u16),

    #[error("Unsupported crypto key type {0}")]
    UnsupportedCryptoKey(u16),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaseSetError {
    #[error("Truncated {field}: need {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Invalid identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("LeaseSet has no leases")]
    NoLeases,

    #[error("Signature verification failed")]
    SignatureMismatch,

    #[error("Destination for local LeaseSet doesn't exist")]
    MissingDestination,

    #[error("LeaseSet too large: {len} bytes exceeds {max}")]
    BufferOverflow { len: usize, max: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, LeaseSetError>;
