//! Entry point for the Vantage Post read-aloud player.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Load the article and hand it to the interactive app loop.

mod app;
mod article;
mod config;
mod engine;
mod extractor;
mod player;
mod progress;

use crate::app::run_app;
use crate::article::load_article;
use crate::config::load_config;
use anyhow::{Result, anyhow};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let article_path = parse_args()?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %article_path.display(),
        level = %config.log_level,
        words_per_minute = config.words_per_minute,
        keepalive = config.keepalive_enabled,
        "Starting read-aloud player"
    );
    let article = load_article(&article_path)?;
    info!(title = %article.title, author = %article.author, "Loaded article");
    run_app(article, config)
}

fn parse_args() -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| anyhow!("Usage: vantage-voice <path-to-article.toml>"))?;

    let path = PathBuf::from(path);
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.as_path().display()));
    }
    Ok(path)
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_filter(filter_layer))
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    }
}
