use crate::config::LogLevel;

/// Speaking pace assumed by the duration estimate.
pub(crate) fn default_words_per_minute() -> u32 {
    150
}

pub(crate) fn default_rate() -> f32 {
    1.0
}

/// 8 Hz progress updates.
pub(crate) fn default_tick_interval_ms() -> u64 {
    125
}

pub(crate) fn default_keepalive_enabled() -> bool {
    true
}

pub(crate) fn default_keepalive_interval_secs() -> f32 {
    10.0
}

pub(crate) fn default_cancel_grace_ms() -> u64 {
    500
}

pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Info
}
