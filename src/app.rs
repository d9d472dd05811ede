//! Interactive terminal front end.
//!
//! One loop owns the player: it drains engine events and typed commands,
//! ticks progress at the configured cadence, and repaints the status line.
//! Stdin is read on a helper thread so the loop never blocks on input.

use crate::article::Article;
use crate::config::AppConfig;
use crate::engine::SimulatedEngine;
use crate::extractor::NarrationText;
use crate::player::{Player, PlayerError};
use crate::progress::render_line;
use anyhow::{Context, Result, anyhow};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Command {
    Play,
    Pause,
    Resume,
    Stop,
    Seek(f32),
    Speed(f32),
    Status,
    Quit,
}

pub fn run_app(article: Article, config: AppConfig) -> Result<()> {
    if !article.kind.supports_narration() {
        return Err(anyhow!(
            "\"{}\" is an infographic; only writeups offer read-aloud narration",
            article.title
        ));
    }

    let narration = NarrationText::compose(&article.title, &article.author, &article.content);
    info!(
        words = narration.word_count(),
        chars = narration.char_len(),
        "Prepared narration text"
    );

    let (engine_tx, engine_rx) = mpsc::channel();
    let engine = SimulatedEngine::new(engine_tx, config.words_per_minute);
    let mut player = Player::new(engine, narration, config.player_settings());

    let commands = spawn_stdin_reader()?;
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .context("Installing Ctrl-C handler")?;
    }

    match &article.date {
        Some(date) => println!("Now reading: {} by {} ({date})", article.title, article.author),
        None => println!("Now reading: {} by {}", article.title, article.author),
    }
    print_help();

    let tick = Duration::from_millis(config.tick_interval_ms.max(50));
    let mut running = true;
    while running {
        let now = Instant::now();

        while let Ok(event) = engine_rx.try_recv() {
            player.handle_event(event, Instant::now());
        }

        while let Ok(line) = commands.try_recv() {
            match parse_command(&line) {
                Some(Command::Play) => report(player.play(now)),
                Some(Command::Pause) => player.pause(now),
                Some(Command::Resume) => player.resume(now),
                Some(Command::Stop) => player.stop(now),
                Some(Command::Seek(percent)) => report(player.seek(percent, now)),
                Some(Command::Speed(rate)) => report(player.set_rate(rate, now)),
                Some(Command::Status) => {
                    println!("\n{}", render_line(&player.snapshot()));
                    println!("cursor at character {}", player.cursor());
                }
                Some(Command::Quit) => running = false,
                None => {
                    if !line.trim().is_empty() {
                        println!("\nunrecognized command: {line}");
                        print_help();
                    }
                }
            }
        }

        if interrupted.load(Ordering::SeqCst) {
            debug!("Interrupt received; shutting down");
            running = false;
        }

        player.tick(now);
        print!("\r{}", render_line(&player.snapshot()));
        let _ = io::stdout().flush();

        if running {
            thread::sleep(tick);
        }
    }

    player.stop(Instant::now());
    println!();
    Ok(())
}

fn report(result: Result<(), PlayerError>) {
    if let Err(err) = result {
        println!("\n{err}");
    }
}

fn print_help() {
    println!(
        "commands: play | pause | resume | stop | seek <percent> | speed <rate> | status | quit"
    );
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        })
        .context("Spawning stdin reader")?;
    Ok(rx)
}

pub(crate) fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let command = match head {
        "play" => Command::Play,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "stop" => Command::Stop,
        "seek" => Command::Seek(parse_finite(parts.next()?)?),
        "speed" => Command::Speed(parse_finite(parts.next()?)?),
        "status" => Command::Status,
        "quit" | "q" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// `"nan".parse::<f32>()` succeeds, so finiteness is checked here before a
/// value ever reaches the player.
fn parse_finite(raw: &str) -> Option<f32> {
    raw.parse::<f32>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse_command("play"), Some(Command::Play));
        assert_eq!(parse_command("  pause "), Some(Command::Pause));
        assert_eq!(parse_command("q"), Some(Command::Quit));
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_command("seek 42.5"), Some(Command::Seek(42.5)));
        assert_eq!(parse_command("speed 1.25"), Some(Command::Speed(1.25)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("seek"), None);
        assert_eq!(parse_command("seek fast"), None);
        assert_eq!(parse_command("rewind"), None);
    }

    #[test]
    fn rejects_non_finite_numbers() {
        assert_eq!(parse_command("seek nan"), None);
        assert_eq!(parse_command("seek inf"), None);
        assert_eq!(parse_command("speed NaN"), None);
        assert_eq!(parse_command("speed -inf"), None);
    }
}
