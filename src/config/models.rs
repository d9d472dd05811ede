use crate::player::PlayerSettings;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_words_per_minute")]
    pub words_per_minute: u32,
    #[serde(default = "crate::config::defaults::default_rate")]
    pub default_rate: f32,
    #[serde(default = "crate::config::defaults::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_keepalive_enabled")]
    pub keepalive_enabled: bool,
    #[serde(default = "crate::config::defaults::default_keepalive_interval_secs")]
    pub keepalive_interval_secs: f32,
    #[serde(default = "crate::config::defaults::default_cancel_grace_ms")]
    pub cancel_grace_ms: u64,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            words_per_minute: crate::config::defaults::default_words_per_minute(),
            default_rate: crate::config::defaults::default_rate(),
            tick_interval_ms: crate::config::defaults::default_tick_interval_ms(),
            keepalive_enabled: crate::config::defaults::default_keepalive_enabled(),
            keepalive_interval_secs: crate::config::defaults::default_keepalive_interval_secs(),
            cancel_grace_ms: crate::config::defaults::default_cancel_grace_ms(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            words_per_minute: self.words_per_minute.max(1),
            default_rate: self.default_rate,
            keepalive_enabled: self.keepalive_enabled,
            keepalive_interval: Duration::from_secs_f32(self.keepalive_interval_secs.max(0.1)),
            cancel_grace: Duration::from_millis(self.cancel_grace_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}
