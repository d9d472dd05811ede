//! Narration engine seam.
//!
//! The player never talks to a speech backend directly; it drives a
//! [`NarrationEngine`] and consumes [`EngineEvent`]s delivered over a channel.
//! That keeps the platform capability swappable and lets tests substitute a
//! scripted fake. The in-repo implementation is [`SimulatedEngine`], which
//! walks the words of an utterance on a worker thread at the configured
//! speaking pace.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Lifecycle signals from the engine. Exactly the callback set the platform
/// speech API exposes: started, ended, error, and word boundaries carrying a
/// character offset into the spoken text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Started,
    Ended,
    Boundary(usize),
    Error { interrupted: bool, message: String },
}

pub trait NarrationEngine {
    /// Whether the platform offers speech synthesis at all.
    fn is_available(&self) -> bool;
    /// Begin speaking `text` at `rate`. Any previous utterance must be
    /// cancelled by the caller first; the engine does not queue.
    fn speak(&mut self, text: &str, rate: f32) -> Result<()>;
    fn cancel(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn is_speaking(&self) -> bool;
    fn is_paused(&self) -> bool;
}

/// Polling granularity for pause and cancellation inside a worker.
const WORKER_POLL: Duration = Duration::from_millis(10);

/// Shared cancel flag between an utterance's worker thread and the engine's
/// control surface. The control side raises it; the worker observes it
/// between words and winds down.
#[derive(Clone, Debug, Default)]
struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    fn new() -> Self {
        Self::default()
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Word-timed engine backing the terminal player. Each `speak` spawns a
/// worker that emits `Started`, per-word `Boundary` offsets, and `Ended`;
/// a cancelled worker reports an `interrupted` error instead, the same way
/// browser speech engines acknowledge a deliberate cancel.
pub struct SimulatedEngine {
    events: Sender<EngineEvent>,
    words_per_minute: u32,
    token: Option<CancellationToken>,
    speaking: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl SimulatedEngine {
    pub fn new(events: Sender<EngineEvent>, words_per_minute: u32) -> Self {
        Self {
            events,
            words_per_minute: words_per_minute.max(1),
            token: None,
            speaking: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl NarrationEngine for SimulatedEngine {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&mut self, text: &str, rate: f32) -> Result<()> {
        self.cancel();

        let token = CancellationToken::new();
        let speaking = Arc::new(AtomicBool::new(false));
        let paused = Arc::new(AtomicBool::new(false));
        self.token = Some(token.clone());
        self.speaking = Arc::clone(&speaking);
        self.paused = Arc::clone(&paused);

        let events = self.events.clone();
        let per_word = Duration::from_secs_f32(60.0 / (self.words_per_minute as f32 * rate.max(0.1)));
        let text = text.to_string();

        thread::Builder::new()
            .name("narration-worker".into())
            .spawn(move || run_worker(text, per_word, events, token, speaking, paused))
            .context("Spawning narration worker")?;
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            debug!("Cancelling active utterance");
            token.cancel();
        }
    }

    fn pause(&mut self) {
        self.paused.store(true, Ordering::Release);
    }

    fn resume(&mut self) {
        self.paused.store(false, Ordering::Release);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::Acquire)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

fn run_worker(
    text: String,
    per_word: Duration,
    events: Sender<EngineEvent>,
    token: CancellationToken,
    speaking: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
) {
    let total_chars = text.chars().count();
    let words: Vec<&str> = text.split_whitespace().collect();

    speaking.store(true, Ordering::Release);
    let _ = events.send(EngineEvent::Started);

    let mut spoken_chars = 0usize;
    for word in &words {
        if wait_through_word(per_word, &token, &paused) {
            speaking.store(false, Ordering::Release);
            let _ = events.send(EngineEvent::Error {
                interrupted: true,
                message: "utterance cancelled".into(),
            });
            return;
        }
        spoken_chars = (spoken_chars + word.chars().count() + 1).min(total_chars);
        let _ = events.send(EngineEvent::Boundary(spoken_chars));
    }

    speaking.store(false, Ordering::Release);
    let _ = events.send(EngineEvent::Ended);
}

/// Sleeps through one word, holding while paused. Returns true if the
/// utterance was cancelled mid-word.
fn wait_through_word(per_word: Duration, token: &CancellationToken, paused: &AtomicBool) -> bool {
    let mut remaining = per_word;
    loop {
        if token.is_cancelled() {
            return true;
        }
        if paused.load(Ordering::Acquire) {
            thread::sleep(WORKER_POLL);
            continue;
        }
        if remaining.is_zero() {
            return false;
        }
        let step = remaining.min(WORKER_POLL);
        thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn short_utterance_runs_started_to_ended() {
        let (tx, rx) = mpsc::channel();
        // Absurdly fast pace so the test finishes quickly.
        let mut engine = SimulatedEngine::new(tx, 60_000);
        engine.speak("alpha beta", 1.0).unwrap();

        assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), EngineEvent::Started);
        let mut saw_boundary = false;
        loop {
            match rx.recv_timeout(RECV_TIMEOUT).unwrap() {
                EngineEvent::Boundary(offset) => {
                    assert!(offset <= "alpha beta".len());
                    saw_boundary = true;
                }
                EngineEvent::Ended => break,
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(saw_boundary);
        assert!(!engine.is_speaking());
    }

    #[test]
    fn cancel_reports_an_interrupted_error() {
        let (tx, rx) = mpsc::channel();
        // Slow pace so the utterance is still in flight when we cancel.
        let mut engine = SimulatedEngine::new(tx, 30);
        engine
            .speak("one two three four five six seven eight", 1.0)
            .unwrap();

        assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), EngineEvent::Started);
        engine.cancel();

        loop {
            match rx.recv_timeout(RECV_TIMEOUT).unwrap() {
                EngineEvent::Error { interrupted, .. } => {
                    assert!(interrupted);
                    break;
                }
                EngineEvent::Boundary(_) => continue,
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn token_clones_observe_cancellation() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn pause_flag_is_reflected_by_the_engine() {
        let (tx, _rx) = mpsc::channel();
        let mut engine = SimulatedEngine::new(tx, 150);
        assert!(!engine.is_paused());
        engine.pause();
        assert!(engine.is_paused());
        engine.resume();
        assert!(!engine.is_paused());
    }
}
