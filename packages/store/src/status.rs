//! Status tags published alongside the mirrored data.

/// Progress of a sign-in or sign-up attempt.
///
/// `Idle → Loading → Success | Error`, back to `Idle` on reset or sign-out.
/// `Success` and `Error` are not sticky: the next attempt starts a new `Loading`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

/// Progress of a preferences save.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

/// A remotely loaded value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DataState<T> {
    #[default]
    Loading,
    Success(T),
    Error(String),
}

impl<T> DataState<T> {
    /// The loaded value, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            DataState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DataState::Loading)
    }

    pub fn as_ref(&self) -> DataState<&T> {
        match self {
            DataState::Loading => DataState::Loading,
            DataState::Success(data) => DataState::Success(data),
            DataState::Error(message) => DataState::Error(message.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DataState<U> {
        match self {
            DataState::Loading => DataState::Loading,
            DataState::Success(data) => DataState::Success(f(data)),
            DataState::Error(message) => DataState::Error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_state_helpers() {
        let loaded: DataState<Vec<u32>> = DataState::Success(vec![1, 2, 3]);
        assert_eq!(loaded.data().map(Vec::len), Some(3));
        assert_eq!(loaded.as_ref().map(|v| v[0]), DataState::Success(1));

        let failed: DataState<Vec<u32>> = DataState::Error("offline".to_string());
        assert!(failed.data().is_none());
        assert_eq!(failed.map(|v| v.len()), DataState::Error("offline".to_string()));

        assert!(DataState::<()>::default().is_loading());
    }
}
