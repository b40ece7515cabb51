//! Synchronizer context and hooks for the UI.
//!
//! The root component calls [`use_sync_provider`] once. It owns the
//! [`Synchronizer`] for the lifetime of that component, opens the
//! restaurants and reviews listeners, and mirrors every observable into a
//! [`Signal`] so components re-render when the synchronizer publishes.
//! Unmounting the root shuts the synchronizer down.

use api::{SyncError, Synchronizer};
use dioxus::prelude::*;
use store::{
    AuthStatus, Backend, DataState, Identity, Restaurant, Review, SaveStatus, UserPreferences,
};
use tokio::sync::watch;

use crate::activity_log::{log_activity, ActivityLog, LogLevel};

/// Every synchronizer observable as a signal.
#[derive(Clone, Copy)]
pub struct SyncSignals {
    pub identity: Signal<Option<Identity>>,
    pub auth_status: Signal<AuthStatus>,
    pub restaurants: Signal<DataState<Vec<Restaurant>>>,
    pub filtered_restaurants: Signal<DataState<Vec<Restaurant>>>,
    pub selected_restaurant: Signal<Option<Restaurant>>,
    pub preferences: Signal<Option<UserPreferences>>,
    pub save_status: Signal<SaveStatus>,
    pub reviews: Signal<Vec<Review>>,
    pub recent_reviews_from_followed: Signal<Vec<Review>>,
}

impl SyncSignals {
    fn mirror<B: Backend>(sync: &Synchronizer<B>) -> Self {
        Self {
            identity: mirror(sync.subscribe_identity()),
            auth_status: mirror(sync.subscribe_auth_status()),
            restaurants: mirror(sync.subscribe_restaurants()),
            filtered_restaurants: mirror(sync.subscribe_filtered_restaurants()),
            selected_restaurant: mirror(sync.subscribe_selected_restaurant()),
            preferences: mirror(sync.subscribe_preferences()),
            save_status: mirror(sync.subscribe_save_status()),
            reviews: mirror(sync.subscribe_reviews()),
            recent_reviews_from_followed: mirror(sync.subscribe_recent_reviews_from_followed()),
        }
    }
}

/// A signal holding the receiver's latest value, updated by a scoped task.
fn mirror<T: Clone + 'static>(mut rx: watch::Receiver<T>) -> Signal<T> {
    let mut signal = Signal::new(rx.borrow_and_update().clone());
    spawn(async move {
        while rx.changed().await.is_ok() {
            let value = rx.borrow_and_update().clone();
            signal.set(value);
        }
    });
    signal
}

/// Own a synchronizer for this component and everything below it.
///
/// `init` runs once, on first render.
pub fn use_sync_provider<B: Backend>(init: impl FnOnce() -> Synchronizer<B>) -> SyncSignals {
    let synchronizer = use_hook(|| {
        let synchronizer = init();
        synchronizer.load_restaurants();
        synchronizer.load_reviews();
        synchronizer
    });
    use_context_provider(|| synchronizer.clone());
    let signals = use_context_provider(|| SyncSignals::mirror(&synchronizer));
    let mut log = use_context_provider(|| Signal::new(ActivityLog::default()));

    // Surface save and auth outcomes as notices
    use_effect(move || match &*signals.save_status.read() {
        SaveStatus::Success => {
            log_activity(&mut log, LogLevel::Success, "Preferences saved successfully")
        }
        SaveStatus::Error(message) => {
            log_activity(&mut log, LogLevel::Error, &format!("Error: {message}"))
        }
        SaveStatus::Idle | SaveStatus::Loading => {}
    });
    use_effect(move || {
        if let AuthStatus::Error(message) = &*signals.auth_status.read() {
            log_activity(&mut log, LogLevel::Warning, message);
        }
    });

    use_drop(move || synchronizer.shutdown());
    signals
}

/// The synchronizer provided by [`use_sync_provider`].
pub fn use_synchronizer<B: Backend>() -> Synchronizer<B> {
    use_context::<Synchronizer<B>>()
}

pub fn use_sync_signals() -> SyncSignals {
    use_context::<SyncSignals>()
}

/// Restaurants matching the signed-in user's preferences.
pub fn use_filtered_restaurants() -> Signal<DataState<Vec<Restaurant>>> {
    use_sync_signals().filtered_restaurants
}

pub fn use_auth_status() -> Signal<AuthStatus> {
    use_sync_signals().auth_status
}

pub fn use_preferences() -> Signal<Option<UserPreferences>> {
    use_sync_signals().preferences
}

/// Log an action's failure to the activity log instead of dropping it.
pub fn report(log: &mut Signal<ActivityLog>, result: Result<(), SyncError>, done: &str) {
    match result {
        Ok(()) => log_activity(log, LogLevel::Success, done),
        Err(error) => {
            tracing::error!(%error, "action failed");
            log_activity(log, LogLevel::Error, &error.to_string());
        }
    }
}
