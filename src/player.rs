//! Read-aloud playback controller.
//!
//! Owns the single active narration session for an article: lifecycle
//! (idle/playing/paused), playback rate, the word-count duration estimate,
//! and the progress position published to the UI. All engine callbacks enter
//! through [`Player::handle_event`] and every operation takes an explicit
//! `now`, so the whole state machine is driven synchronously from the app
//! loop and exercised deterministically in tests.

use crate::engine::{EngineEvent, NarrationEngine};
use crate::extractor::NarrationText;
use crate::progress::PlaybackSnapshot;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("text-to-speech is not available on this system")]
    Unsupported,
    #[error("expected a finite number")]
    NonFinite,
    #[error("narration engine rejected the request: {0}")]
    Engine(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Playing,
    Paused,
}

/// Tunables lifted from the app config.
#[derive(Debug, Clone, Copy)]
pub struct PlayerSettings {
    pub words_per_minute: u32,
    pub default_rate: f32,
    pub keepalive_enabled: bool,
    pub keepalive_interval: Duration,
    pub cancel_grace: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            words_per_minute: 150,
            default_rate: 1.0,
            keepalive_enabled: true,
            keepalive_interval: Duration::from_secs(10),
            cancel_grace: Duration::from_millis(500),
        }
    }
}

pub struct Player<E: NarrationEngine> {
    engine: E,
    narration: NarrationText,
    settings: PlayerSettings,

    lifecycle: Lifecycle,
    rate: f32,
    /// Full-length estimate at 1x speed.
    duration: Duration,
    /// Portion covered by the current utterance at 1x (full text, or the
    /// tail after a seek).
    remaining: Duration,
    /// Percent at which the current utterance began (non-zero after a seek).
    progress_base: f32,
    /// Last published percent, 0..=100.
    progress: f32,
    /// Elapsed accumulated across pause/resume cycles.
    elapsed: Duration,
    started_at: Option<Instant>,
    /// Character offset into the narration text.
    cursor: usize,
    /// Offset where the current utterance starts; boundary events are
    /// relative to the spoken substring.
    utterance_origin: usize,
    /// Engine callbacks before this deadline are echoes of our own cancel.
    cancel_grace_until: Option<Instant>,
    /// Set when an utterance has been issued and its `Started` confirmation
    /// is still outstanding; a `Started` with no utterance pending is a
    /// stale echo from a cancelled one.
    awaiting_start: bool,
    last_keepalive: Option<Instant>,
}

impl<E: NarrationEngine> Player<E> {
    pub fn new(engine: E, narration: NarrationText, settings: PlayerSettings) -> Self {
        let duration = estimate_duration(narration.word_count(), settings.words_per_minute);
        Self {
            engine,
            narration,
            settings,
            lifecycle: Lifecycle::Idle,
            rate: settings.default_rate.clamp(MIN_RATE, MAX_RATE),
            duration,
            remaining: duration,
            progress_base: 0.0,
            progress: 0.0,
            elapsed: Duration::ZERO,
            started_at: None,
            cursor: 0,
            utterance_origin: 0,
            cancel_grace_until: None,
            awaiting_start: false,
            last_keepalive: None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Starts narration from the beginning. Any prior session is cancelled
    /// first; stale engine activity must never leak into a new one. The
    /// session turns `Playing` once the engine confirms with `Started`.
    pub fn play(&mut self, now: Instant) -> Result<(), PlayerError> {
        if !self.engine.is_available() {
            return Err(PlayerError::Unsupported);
        }
        self.begin_cancel(now);
        self.reset_session();
        self.speak_from(0, self.narration_text_owned())?;
        info!(
            rate = self.rate,
            words = self.narration.word_count(),
            "Requested narration start"
        );
        Ok(())
    }

    pub fn pause(&mut self, now: Instant) {
        if self.lifecycle != Lifecycle::Playing {
            debug!(lifecycle = ?self.lifecycle, "Ignoring pause outside active playback");
            return;
        }
        self.engine.pause();
        if let Some(started) = self.started_at.take() {
            self.elapsed += now.saturating_duration_since(started);
        }
        self.lifecycle = Lifecycle::Paused;
        info!(elapsed_secs = self.elapsed.as_secs_f32(), "Paused narration");
    }

    pub fn resume(&mut self, now: Instant) {
        if self.lifecycle != Lifecycle::Paused {
            debug!(lifecycle = ?self.lifecycle, "Ignoring resume outside paused playback");
            return;
        }
        self.engine.resume();
        self.started_at = Some(now);
        self.last_keepalive = Some(now);
        self.lifecycle = Lifecycle::Playing;
        info!(elapsed_secs = self.elapsed.as_secs_f32(), "Resumed narration");
    }

    /// Cancels narration unconditionally and returns to idle with progress
    /// and elapsed zeroed.
    pub fn stop(&mut self, now: Instant) {
        self.begin_cancel(now);
        self.reset_session();
        info!("Stopped narration");
    }

    /// Applies a new playback rate. While a session is active this restarts
    /// narration from the beginning at the new rate; the engine cannot change
    /// the pace of an utterance already in flight.
    pub fn set_rate(&mut self, rate: f32, now: Instant) -> Result<(), PlayerError> {
        // NaN survives clamp and would poison every Duration division later.
        if !rate.is_finite() {
            return Err(PlayerError::NonFinite);
        }
        let clamped = rate.clamp(MIN_RATE, MAX_RATE);
        self.rate = clamped;
        info!(rate = clamped, "Adjusted playback rate");
        if self.lifecycle == Lifecycle::Idle {
            return Ok(());
        }
        self.begin_cancel(now);
        self.reset_session();
        self.speak_from(0, self.narration_text_owned())
    }

    /// Seeks by restarting narration from the character offset matching the
    /// target percentage. Remaining duration shrinks proportionally.
    pub fn seek(&mut self, percent: f32, now: Instant) -> Result<(), PlayerError> {
        if !self.engine.is_available() {
            return Err(PlayerError::Unsupported);
        }
        if !percent.is_finite() {
            return Err(PlayerError::NonFinite);
        }
        let percent = percent.clamp(0.0, 100.0);
        self.begin_cancel(now);
        self.reset_session();

        let (offset, tail) = self.narration.tail_from_percent(percent);
        let tail = tail.to_string();
        self.cursor = offset;
        self.progress_base = percent;
        self.progress = percent;
        self.remaining = self.duration.mul_f32((100.0 - percent) / 100.0);

        if tail.is_empty() {
            debug!(percent, "Seek target at or beyond narration end");
            return Ok(());
        }
        self.speak_from(offset, tail)?;
        info!(percent, offset, "Seeking narration");
        Ok(())
    }

    /// Swaps in a new article's narration, tearing down any active session
    /// first so nothing carries across article navigation.
    pub fn load(&mut self, narration: NarrationText, now: Instant) {
        if self.lifecycle != Lifecycle::Idle {
            self.begin_cancel(now);
        }
        self.duration = estimate_duration(narration.word_count(), self.settings.words_per_minute);
        self.narration = narration;
        self.reset_session();
        debug!(
            total_secs = self.duration.as_secs_f32(),
            "Loaded new narration text"
        );
    }

    /// Single entry point for engine callbacks.
    pub fn handle_event(&mut self, event: EngineEvent, now: Instant) {
        match event {
            EngineEvent::Started => {
                if !self.awaiting_start {
                    debug!("Ignoring start signal with no utterance pending");
                    return;
                }
                self.awaiting_start = false;
                self.started_at = Some(now);
                self.last_keepalive = Some(now);
                self.lifecycle = Lifecycle::Playing;
                debug!("Narration engine reported start");
            }
            EngineEvent::Ended => {
                if self.lifecycle == Lifecycle::Idle {
                    debug!("Ignoring end signal with no active session");
                    return;
                }
                self.progress = 100.0;
                self.progress_base = 0.0;
                self.elapsed = self.duration.div_f32(self.rate);
                self.started_at = None;
                self.last_keepalive = None;
                self.cursor = self.narration.char_len();
                self.lifecycle = Lifecycle::Idle;
                info!("Narration finished");
            }
            EngineEvent::Boundary(offset) => {
                if self.lifecycle == Lifecycle::Playing {
                    self.cursor = (self.utterance_origin + offset).min(self.narration.char_len());
                }
            }
            EngineEvent::Error {
                interrupted,
                message,
            } => {
                let in_grace = self
                    .cancel_grace_until
                    .map(|deadline| now < deadline)
                    .unwrap_or(false);
                if interrupted || in_grace {
                    debug!(interrupted, in_grace, %message, "Swallowing expected interruption");
                    return;
                }
                warn!(%message, "Narration engine error; resetting session");
                self.reset_session();
            }
        }
    }

    /// Periodic progress update; the app calls this at its tick cadence.
    /// Advances nothing unless the session is playing.
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.cancel_grace_until {
            if now >= deadline {
                self.cancel_grace_until = None;
            }
        }
        if self.lifecycle != Lifecycle::Playing {
            return;
        }

        let adjusted = self.remaining.div_f32(self.rate);
        let running = self.elapsed
            + self
                .started_at
                .map(|started| now.saturating_duration_since(started))
                .unwrap_or_default();
        let span = 100.0 - self.progress_base;
        self.progress = if adjusted.is_zero() {
            100.0
        } else {
            let fraction = running.as_secs_f32() / adjusted.as_secs_f32();
            (self.progress_base + fraction * span).min(100.0)
        };

        self.run_keepalive(now);
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let total_secs = self.duration.div_f32(self.rate).as_secs_f32();
        PlaybackSnapshot {
            lifecycle: self.lifecycle,
            percent: self.progress,
            elapsed_secs: self.progress / 100.0 * total_secs,
            total_secs,
            rate: self.rate,
        }
    }

    fn speak_from(&mut self, origin: usize, text: String) -> Result<(), PlayerError> {
        self.utterance_origin = origin;
        self.cursor = origin;
        self.engine
            .speak(&text, self.rate)
            .map_err(|err| PlayerError::Engine(err.to_string()))?;
        self.awaiting_start = true;
        Ok(())
    }

    fn narration_text_owned(&self) -> String {
        self.narration.text().to_string()
    }

    fn begin_cancel(&mut self, now: Instant) {
        self.cancel_grace_until = Some(now + self.settings.cancel_grace);
        self.engine.cancel();
    }

    /// Clears every per-session field. The cancel-grace deadline survives so
    /// late callbacks from a just-cancelled utterance stay classified.
    fn reset_session(&mut self) {
        self.lifecycle = Lifecycle::Idle;
        self.started_at = None;
        self.elapsed = Duration::ZERO;
        self.progress = 0.0;
        self.progress_base = 0.0;
        self.remaining = self.duration;
        self.cursor = 0;
        self.utterance_origin = 0;
        self.awaiting_start = false;
        self.last_keepalive = None;
    }

    /// Some speech engines fall silent after long uninterrupted utterances
    /// unless cycled. While playing, issue a harmless pause/resume at the
    /// configured interval; lifecycle and progress are untouched.
    fn run_keepalive(&mut self, now: Instant) {
        if !self.settings.keepalive_enabled {
            return;
        }
        let Some(last) = self.last_keepalive else {
            return;
        };
        if now.saturating_duration_since(last) < self.settings.keepalive_interval {
            return;
        }
        if self.engine.is_speaking() && !self.engine.is_paused() {
            debug!("Cycling engine pause/resume to keep narration alive");
            self.engine.pause();
            self.engine.resume();
        }
        self.last_keepalive = Some(now);
    }
}

fn estimate_duration(word_count: usize, words_per_minute: u32) -> Duration {
    Duration::from_secs_f32(word_count as f32 / words_per_minute.max(1) as f32 * 60.0)
}
