//! Credential flows and the identity listener.
//!
//! Concurrent `login` / `sign_up` calls are not sequenced: each publishes
//! `Loading` and then its own outcome, so whichever finishes last decides
//! the final status.

use futures::StreamExt;
use store::{AuthStatus, Backend, Identity};

use super::Synchronizer;
use crate::error::{describe, SyncError};

impl<B: Backend> Synchronizer<B> {
    /// Sign in with email and password, then reload preferences.
    pub async fn login(&self, email: &str, password: &str) {
        self.state().auth_status.send_replace(AuthStatus::Loading);
        match self.inner.backend.sign_in(email, password).await {
            Ok(identity) => {
                tracing::info!(uid = %identity.uid, "signed in");
                self.state().auth_status.send_replace(AuthStatus::Success);
                self.load_preferences().await;
            }
            Err(e) => {
                let error = SyncError::Auth(describe(&e, "Login failed"));
                tracing::error!(%error, "sign in failed");
                self.state()
                    .auth_status
                    .send_replace(AuthStatus::Error(error.to_string()));
            }
        }
    }

    /// Create an account. The identity service signs the new account in.
    pub async fn sign_up(&self, email: &str, password: &str) {
        self.state().auth_status.send_replace(AuthStatus::Loading);
        match self.inner.backend.sign_up(email, password).await {
            Ok(identity) => {
                tracing::info!(uid = %identity.uid, "account created");
                self.state().auth_status.send_replace(AuthStatus::Success);
            }
            Err(e) => {
                let error = SyncError::Auth(describe(&e, "Sign up failed"));
                tracing::error!(%error, "sign up failed");
                self.state()
                    .auth_status
                    .send_replace(AuthStatus::Error(error.to_string()));
            }
        }
    }

    /// Sign out. Cached state is cleared by the identity listener.
    pub async fn logout(&self) {
        if let Err(error) = self.inner.backend.sign_out().await {
            tracing::warn!(%error, "error signing out");
        }
    }

    pub fn reset_auth_status(&self) {
        self.state().auth_status.send_replace(AuthStatus::Idle);
    }

    pub(super) async fn watch_identity(self) {
        let mut changes = self.inner.backend.identity_changes();
        while let Some(identity) = changes.next().await {
            self.apply_identity(identity).await;
        }
    }

    async fn apply_identity(&self, identity: Option<Identity>) {
        let signed_in = identity.is_some();
        tracing::debug!(signed_in, "identity changed");
        let previous = self.state().identity.send_replace(identity);
        if signed_in {
            self.load_preferences().await;
        } else if previous.is_some() {
            self.state().auth_status.send_replace(AuthStatus::Idle);
            self.state().preferences.send_replace(None);
            self.apply_filters();
        }
    }
}
