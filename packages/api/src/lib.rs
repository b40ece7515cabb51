//! # API crate — client-side state synchronizer for the restaurant app
//!
//! Mirrors the backend's restaurants, reviews, preferences and follow
//! records into observable values, and derives the preference-filtered
//! restaurant list the explore screens render. Every frontend goes through
//! the single [`Synchronizer`] created here; none of them talk to the
//! backend directly.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`synchronizer`] | The [`Synchronizer`]: observables, listeners, auth / preferences / restaurants / reviews / follows operations |
//! | [`settings`] | [`Settings`] loaded from defaults, `foodie.toml` and `FOODIE_*` environment variables |
//! | [`error`] | [`SyncError`], the failure taxonomy surfaced to callers |
//! | [`telemetry`] | Tracing subscriber setup for binaries |
//!
//! The backend itself is abstracted by the traits in [`store::backend`];
//! [`store::MemoryBackend`] serves tests and local runs.

pub mod error;
pub mod settings;
pub mod synchronizer;
pub mod telemetry;

pub use error::SyncError;
pub use settings::Settings;
pub use synchronizer::{SubscriptionHandle, Synchronizer};

pub use store::{
    AuthStatus, DataState, Dish, Follow, GeoPoint, Identity, Restaurant, Review, SaveStatus,
    UserPreferences,
};
