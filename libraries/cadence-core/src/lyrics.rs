//! Timed lyrics (LRC) parsing
//!
//! Only the `[mm:ss.xx]` / `[mm:ss.xxx]` timestamp form is recognized.
//! Lines without a timestamp, and timestamps with no text, are skipped.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One timed lyric line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Offset from track start in milliseconds
    pub time_ms: u64,

    /// Lyric text with the timestamp stripped
    pub text: String,
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[(\d{2}):(\d{2})\.(\d{2,3})\]").expect("timestamp pattern is valid")
    })
}

/// Parse raw LRC text into lines sorted by time
pub fn parse_lrc(text: &str) -> Vec<LyricLine> {
    let pattern = timestamp_pattern();
    let mut lines = Vec::new();

    for raw in text.lines() {
        let Some(caps) = pattern.captures(raw) else {
            continue;
        };

        let minutes: u64 = caps[1].parse().unwrap_or(0);
        let seconds: u64 = caps[2].parse().unwrap_or(0);
        // "[00:01.5x]" style two-digit fractions are hundredths
        let fraction = format!("{:0<3}", &caps[3]);
        let millis: u64 = fraction.parse().unwrap_or(0);

        let stripped = pattern.replace(raw, "");
        let text = stripped.trim();
        if text.is_empty() {
            continue;
        }

        lines.push(LyricLine {
            time_ms: minutes * 60_000 + seconds * 1_000 + millis,
            text: text.to_string(),
        });
    }

    lines.sort_by_key(|line| line.time_ms);
    lines
}

/// Index of the line being sung at `position_ms`
///
/// This is the last line whose timestamp is at or before the position;
/// `None` before the first line.
pub fn current_line(lines: &[LyricLine], position_ms: u64) -> Option<usize> {
    lines.iter().rposition(|line| line.time_ms <= position_ms)
}
