//! Progress presentation: pure formatting of player state for the terminal.

use crate::player::Lifecycle;

/// Point-in-time view of playback, produced by `Player::snapshot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub lifecycle: Lifecycle,
    pub percent: f32,
    pub elapsed_secs: f32,
    pub total_secs: f32,
    pub rate: f32,
}

/// Renders seconds as `M:SS`, seconds floored and zero-padded.
pub fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

const BAR_WIDTH: usize = 24;

/// One status line: progress bar, elapsed/total clocks, rate, state.
pub fn render_line(snapshot: &PlaybackSnapshot) -> String {
    let filled = ((snapshot.percent / 100.0) * BAR_WIDTH as f32).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    let bar: String = "=".repeat(filled) + &" ".repeat(BAR_WIDTH - filled);
    let state = match snapshot.lifecycle {
        Lifecycle::Idle => "idle",
        Lifecycle::Playing => "playing",
        Lifecycle::Paused => "paused",
    };
    format!(
        "[{bar}] {} / {} @{:.2}x {state}   ",
        format_clock(snapshot.elapsed_secs),
        format_clock(snapshot.total_secs),
        snapshot.rate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pads_seconds() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(5.4), "0:05");
        assert_eq!(format_clock(59.9), "0:59");
        assert_eq!(format_clock(65.0), "1:05");
        assert_eq!(format_clock(600.0), "10:00");
    }

    #[test]
    fn clock_never_goes_negative() {
        assert_eq!(format_clock(-3.0), "0:00");
    }

    #[test]
    fn line_shows_clocks_rate_and_state() {
        let snapshot = PlaybackSnapshot {
            lifecycle: Lifecycle::Playing,
            percent: 50.0,
            elapsed_secs: 65.0,
            total_secs: 130.0,
            rate: 1.25,
        };
        let line = render_line(&snapshot);
        assert!(line.contains("1:05 / 2:10"));
        assert!(line.contains("@1.25x"));
        assert!(line.contains("playing"));
    }

    #[test]
    fn bar_fill_tracks_percent() {
        let idle = PlaybackSnapshot {
            lifecycle: Lifecycle::Idle,
            percent: 0.0,
            elapsed_secs: 0.0,
            total_secs: 60.0,
            rate: 1.0,
        };
        assert!(!render_line(&idle).contains('='));

        let done = PlaybackSnapshot {
            percent: 100.0,
            elapsed_secs: 60.0,
            ..idle
        };
        assert!(render_line(&done).contains(&"=".repeat(24)));
    }
}
