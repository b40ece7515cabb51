use store::{encode, Backend, BackendError, FromDocument, Identity, SaveStatus, UserPreferences};

use super::Synchronizer;
use crate::error::{describe, SyncError};

impl<B: Backend> Synchronizer<B> {
    /// Fetch the signed-in user's preferences and recompute the filter.
    ///
    /// A user with no stored record gets [`Settings::default_preferences`](crate::Settings::default_preferences),
    /// which is not written back. Does nothing when signed out; failures are
    /// logged and leave the cached preferences as they were.
    pub async fn load_preferences(&self) {
        let Some(identity) = self.current_identity() else {
            return;
        };
        match self.fetch_preferences(&identity).await {
            Ok(preferences) => {
                self.state().preferences.send_replace(Some(preferences));
                self.apply_filters();
            }
            Err(error) => {
                tracing::warn!(uid = %identity.uid, %error, "error loading user preferences");
            }
        }
    }

    async fn fetch_preferences(&self, identity: &Identity) -> Result<UserPreferences, BackendError> {
        let collection = &self.settings().collections.preferences;
        match self.inner.backend.get(collection, &identity.uid).await? {
            Some(doc) => UserPreferences::from_document(&doc),
            None => {
                tracing::debug!(uid = %identity.uid, "no stored preferences, using defaults");
                Ok(self.settings().default_preferences())
            }
        }
    }

    /// Overwrite the signed-in user's preferences.
    ///
    /// Progress is published through [`save_status`](Self::save_status).
    /// Signed out, the status becomes `Error("User not logged in")` and
    /// nothing is written.
    pub async fn save_preferences(&self, preferences: UserPreferences) {
        let Some(identity) = self.current_identity() else {
            self.state()
                .save_status
                .send_replace(SaveStatus::Error(SyncError::NotLoggedIn.to_string()));
            return;
        };

        self.state().save_status.send_replace(SaveStatus::Loading);
        match self.store_preferences(&identity, &preferences).await {
            Ok(()) => {
                tracing::info!(uid = %identity.uid, "preferences saved");
                self.state().preferences.send_replace(Some(preferences));
                self.state().save_status.send_replace(SaveStatus::Success);
                self.apply_filters();
            }
            Err(error) => {
                tracing::error!(uid = %identity.uid, %error, "error saving preferences");
                self.state()
                    .save_status
                    .send_replace(SaveStatus::Error(error.to_string()));
            }
        }
    }

    async fn store_preferences(
        &self,
        identity: &Identity,
        preferences: &UserPreferences,
    ) -> Result<(), SyncError> {
        let collection = &self.settings().collections.preferences;
        let save = |e: BackendError| SyncError::Save(describe(&e, "Failed to save preferences"));
        let body = encode(preferences).map_err(save)?;
        self.inner
            .backend
            .set(collection, &identity.uid, body)
            .await
            .map_err(save)
    }
}
