use dioxus::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

/// User-visible notices ("Preferences saved", inline errors).
#[derive(Clone, Debug, Default)]
pub struct ActivityLog {
    pub entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

/// The log provided by [`use_sync_provider`](crate::use_sync_provider).
pub fn use_activity_log() -> Signal<ActivityLog> {
    use_context::<Signal<ActivityLog>>()
}

pub fn log_activity(log: &mut Signal<ActivityLog>, level: LogLevel, message: &str) {
    let ts = current_time();
    log.write().entries.push(LogEntry {
        timestamp: ts,
        level,
        message: message.to_string(),
    });
}

/// UTC wall clock as `HH:MM:SS`.
fn current_time() -> String {
    chrono::Utc::now().format("%H:%M:%S").to_string()
}
