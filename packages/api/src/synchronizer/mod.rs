//! # State synchronizer
//!
//! [`Synchronizer`] mirrors the backend's collections into observable
//! values and derives the one computed view, the preference-filtered
//! restaurant list. It is the only writer of that state; UI code reads
//! snapshots (`restaurants()`, `preferences()`, ...) or subscribes to
//! changes (`subscribe_restaurants()`, ...), each a [`tokio::sync::watch`]
//! channel holding the latest value.
//!
//! ## Flow
//!
//! remote change → listener task → list rebuilt → value published →
//! filter recomputed → UI re-renders. Nothing is cached beyond the latest
//! value and nothing is persisted locally.
//!
//! ## Lifecycle
//!
//! [`Synchronizer::start`] takes the backend and [`Settings`] explicitly,
//! publishes the current identity and spawns the auth listener. Collection
//! listeners are opened with [`load_restaurants`](Synchronizer::load_restaurants)
//! and [`load_reviews`](Synchronizer::load_reviews); opening one again
//! replaces the previous listener. [`shutdown`](Synchronizer::shutdown)
//! cancels every listener. Listener tasks keep the synchronizer alive until
//! then.
//!
//! ## Operations
//!
//! | Module | Entry points |
//! |--------|-------------|
//! | [`auth`] | `login`, `sign_up`, `logout`, `reset_auth_status` and the identity listener |
//! | [`preferences`] | `load_preferences`, `save_preferences` |
//! | [`restaurants`] | `load_restaurants`, `get_restaurant`, `select_restaurant` and filter recomputation |
//! | [`reviews`] | `load_reviews`, `add_review`, `delete_review`, the followed feed and per-dish / per-user views |
//! | [`follows`] | `follow`, `unfollow`, `followers`, `following`, `is_following` |
//!
//! Remote failures never escape as panics: they become an `Error` status,
//! a returned [`crate::SyncError`] or a log line, per operation.

mod auth;
mod follows;
mod preferences;
mod restaurants;
mod reviews;
mod subscription;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use store::{
    AuthStatus, Backend, DataState, Identity, Restaurant, Review, SaveStatus, UserPreferences,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::settings::Settings;

pub use subscription::SubscriptionHandle;

/// Bridges backend collections to observable client state.
///
/// Cheap to clone; clones share the same state and listeners.
pub struct Synchronizer<B: Backend> {
    inner: Arc<Inner<B>>,
}

impl<B: Backend> Clone for Synchronizer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B> {
    backend: B,
    settings: Settings,
    state: State,
    shutdown: CancellationToken,
    listeners: Mutex<Listeners>,
    /// Held across reading the filter inputs and publishing the result.
    filter_lock: Mutex<()>,
}

/// Published values, one writer each.
struct State {
    identity: watch::Sender<Option<Identity>>,
    auth_status: watch::Sender<AuthStatus>,
    restaurants: watch::Sender<DataState<Vec<Restaurant>>>,
    filtered_restaurants: watch::Sender<DataState<Vec<Restaurant>>>,
    selected_restaurant: watch::Sender<Option<Restaurant>>,
    preferences: watch::Sender<Option<UserPreferences>>,
    save_status: watch::Sender<SaveStatus>,
    reviews: watch::Sender<Vec<Review>>,
    followed_feed: watch::Sender<Vec<Review>>,
}

impl State {
    fn new(identity: Option<Identity>) -> Self {
        Self {
            identity: watch::Sender::new(identity),
            auth_status: watch::Sender::new(AuthStatus::Idle),
            restaurants: watch::Sender::new(DataState::Loading),
            filtered_restaurants: watch::Sender::new(DataState::Loading),
            selected_restaurant: watch::Sender::new(None),
            preferences: watch::Sender::new(None),
            save_status: watch::Sender::new(SaveStatus::Idle),
            reviews: watch::Sender::new(Vec::new()),
            followed_feed: watch::Sender::new(Vec::new()),
        }
    }
}

#[derive(Default)]
struct Listeners {
    auth: Option<SubscriptionHandle>,
    restaurants: Option<SubscriptionHandle>,
    reviews: Option<SubscriptionHandle>,
}

impl<B: Backend> Synchronizer<B> {
    /// Create the synchronizer and start observing the identity service.
    ///
    /// When a user is already signed in, reviews and the followed feed are
    /// loaded right away; preferences follow from the identity listener.
    /// Must be called inside a tokio runtime.
    pub fn start(backend: B, settings: Settings) -> Self {
        let identity = backend.current_identity();
        let signed_in = identity.is_some();
        let sync = Self {
            inner: Arc::new(Inner {
                backend,
                settings,
                state: State::new(identity),
                shutdown: CancellationToken::new(),
                listeners: Mutex::default(),
                filter_lock: Mutex::default(),
            }),
        };

        let listener = sync.clone();
        let handle = sync.spawn_listener("auth", async move { listener.watch_identity().await });
        sync.listeners().auth = Some(handle);

        if signed_in {
            sync.load_reviews();
        }
        tracing::debug!(signed_in, "synchronizer started");
        sync
    }

    /// Cancel every listener. Published values keep their last state.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut listeners = self.listeners();
        listeners.auth = None;
        listeners.restaurants = None;
        listeners.reviews = None;
        tracing::debug!("synchronizer shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Number of listeners still running.
    pub fn active_listeners(&self) -> usize {
        let listeners = self.listeners();
        [&listeners.auth, &listeners.restaurants, &listeners.reviews]
            .into_iter()
            .flatten()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    fn state(&self) -> &State {
        &self.inner.state
    }

    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_listener<F>(&self, name: &'static str, listener: F) -> SubscriptionHandle
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        SubscriptionHandle::spawn(name, self.inner.shutdown.child_token(), listener)
    }

    /// The identity currently signed in at the identity service.
    fn current_identity(&self) -> Option<Identity> {
        self.inner.backend.current_identity()
    }

    // Snapshots

    pub fn identity(&self) -> Option<Identity> {
        self.state().identity.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().identity.borrow().is_some()
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.state().auth_status.borrow().clone()
    }

    pub fn restaurants(&self) -> DataState<Vec<Restaurant>> {
        self.state().restaurants.borrow().clone()
    }

    pub fn filtered_restaurants(&self) -> DataState<Vec<Restaurant>> {
        self.state().filtered_restaurants.borrow().clone()
    }

    pub fn selected_restaurant(&self) -> Option<Restaurant> {
        self.state().selected_restaurant.borrow().clone()
    }

    pub fn preferences(&self) -> Option<UserPreferences> {
        self.state().preferences.borrow().clone()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.state().save_status.borrow().clone()
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.state().reviews.borrow().clone()
    }

    /// Latest review of each followed user.
    pub fn recent_reviews_from_followed(&self) -> Vec<Review> {
        self.state().followed_feed.borrow().clone()
    }

    // Subscriptions

    pub fn subscribe_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.state().identity.subscribe()
    }

    pub fn subscribe_auth_status(&self) -> watch::Receiver<AuthStatus> {
        self.state().auth_status.subscribe()
    }

    pub fn subscribe_restaurants(&self) -> watch::Receiver<DataState<Vec<Restaurant>>> {
        self.state().restaurants.subscribe()
    }

    pub fn subscribe_filtered_restaurants(&self) -> watch::Receiver<DataState<Vec<Restaurant>>> {
        self.state().filtered_restaurants.subscribe()
    }

    pub fn subscribe_selected_restaurant(&self) -> watch::Receiver<Option<Restaurant>> {
        self.state().selected_restaurant.subscribe()
    }

    pub fn subscribe_preferences(&self) -> watch::Receiver<Option<UserPreferences>> {
        self.state().preferences.subscribe()
    }

    pub fn subscribe_save_status(&self) -> watch::Receiver<SaveStatus> {
        self.state().save_status.subscribe()
    }

    pub fn subscribe_reviews(&self) -> watch::Receiver<Vec<Review>> {
        self.state().reviews.subscribe()
    }

    pub fn subscribe_recent_reviews_from_followed(&self) -> watch::Receiver<Vec<Review>> {
        self.state().followed_feed.subscribe()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use store::MemoryBackend;
    use tokio::sync::watch;

    use super::Synchronizer;
    use crate::settings::Settings;

    /// Wait until the watched value satisfies `pred`.
    pub async fn wait_for<T: Clone>(
        rx: &mut watch::Receiver<T>,
        pred: impl FnMut(&T) -> bool,
    ) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("timed out waiting for state")
            .expect("synchronizer dropped")
            .clone()
    }

    /// A synchronizer over a fresh backend with a signed-up user.
    pub async fn signed_in(email: &str) -> (MemoryBackend, Synchronizer<MemoryBackend>) {
        let backend = MemoryBackend::new();
        store::IdentityService::sign_up(&backend, email, "secret1")
            .await
            .unwrap();
        let sync = Synchronizer::start(backend.clone(), Settings::default());
        (backend, sync)
    }
}
