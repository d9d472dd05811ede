use super::AppConfig;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Loads config from `path`, falling back to defaults on any failure so a
/// missing or broken file never prevents startup.
pub fn load_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(err) => {
            warn!(path = %path.display(), "Falling back to default config: {err}");
            AppConfig::default()
        }
    }
}

pub fn parse_config(contents: &str, origin: &Path) -> AppConfig {
    match toml::from_str::<AppConfig>(contents) {
        Ok(config) => {
            info!(path = %origin.display(), "Loaded config");
            config
        }
        Err(err) => {
            warn!(path = %origin.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::path::PathBuf;

    fn origin() -> PathBuf {
        PathBuf::from("conf/config.toml")
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("", &origin());
        assert_eq!(config.words_per_minute, 150);
        assert_eq!(config.default_rate, 1.0);
        assert!(config.keepalive_enabled);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config = parse_config(
            "words_per_minute = 180\nlog_level = \"debug\"\n",
            &origin(),
        );
        assert_eq!(config.words_per_minute, 180);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.tick_interval_ms, 125);
    }

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let config = parse_config("words_per_minute = \"fast\"", &origin());
        assert_eq!(config.words_per_minute, 150);
    }

    #[test]
    fn player_settings_carry_the_configured_intervals() {
        let config = parse_config(
            "keepalive_interval_secs = 5.0\ncancel_grace_ms = 250\n",
            &origin(),
        );
        let settings = config.player_settings();
        assert_eq!(settings.keepalive_interval.as_secs_f32(), 5.0);
        assert_eq!(settings.cancel_grace.as_millis(), 250);
    }
}
