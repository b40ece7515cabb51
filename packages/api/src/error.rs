use store::BackendError;
use thiserror::Error;

/// Failure of a synchronizer operation.
///
/// Status-driven operations (login, save) publish the message of one of
/// these as an `Error` status; action entry points return it directly.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Credentials rejected or the identity service unreachable.
    #[error("{0}")]
    Auth(String),

    /// A subscription or read failed.
    #[error("{0}")]
    Data(String),

    /// A write failed.
    #[error("{0}")]
    Save(String),

    /// A photo could not be read or uploaded.
    #[error("Failed to upload image: {0}")]
    Upload(String),

    #[error("User not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The backend's message, or `fallback` when it has none.
pub(crate) fn describe(error: &BackendError, fallback: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_falls_back_on_empty_messages() {
        let silent = BackendError::Network(String::new());
        assert_eq!(describe(&silent, "Login failed"), "Login failed");

        let loud = BackendError::InvalidCredentials;
        assert_eq!(describe(&loud, "Login failed"), "Invalid email or password");
    }

    #[test]
    fn test_not_logged_in_message() {
        assert_eq!(SyncError::NotLoggedIn.to_string(), "User not logged in");
    }
}
