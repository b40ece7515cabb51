//! This crate contains the shared UI glue between the synchronizer and Dioxus.

mod sync;
pub use sync::{
    report, use_auth_status, use_filtered_restaurants, use_preferences, use_sync_provider,
    use_sync_signals, use_synchronizer, SyncSignals,
};

pub mod activity_log;
pub use activity_log::{log_activity, use_activity_log, ActivityLog, LogEntry, LogLevel};
