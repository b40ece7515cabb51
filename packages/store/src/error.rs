use thiserror::Error;

/// Failure reported by a backend service.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("{0}")]
    Network(String),

    #[error("Malformed document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
