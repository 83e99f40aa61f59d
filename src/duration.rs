//! Human-readable duration parsing for lock windows.
//!
//! Accepted forms:
//! - unit-suffixed, optionally compound, as read by `humantime`: `500ms`,
//!   `30s`, `5m`, `1h30m`, `2d`, `1h 30min`
//! - ISO-8601: `PT5M`, `PT1H30M`, `P1D`, `PT0.5S`
//! - a bare integer, read as milliseconds: `300000`

use crate::error::{Result, SchedLockError};
use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;

static ISO_8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.(\d{1,3})\d*)?S)?)?$")
        .expect("valid ISO-8601 duration regex")
});

/// Parse a duration string into a `chrono::Duration`.
///
/// # Returns
///
/// * `Ok(Duration)` - The parsed, non-negative duration
/// * `Err(SchedLockError::ConfigInvalid)` - Empty, malformed or out-of-range input
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SchedLockError::ConfigInvalid(
            "duration must not be empty".to_string(),
        ));
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = trimmed.parse().map_err(|_| out_of_range(input))?;
        return Duration::try_milliseconds(millis).ok_or_else(|| out_of_range(input));
    }

    if let Some(caps) = ISO_8601.captures(trimmed) {
        // "P" and "PT" alone carry no components.
        if caps.iter().skip(1).all(|c| c.is_none()) {
            return Err(malformed(input));
        }
        let field = |i: usize| -> Result<i64> {
            caps.get(i)
                .map(|m| m.as_str().parse::<i64>().map_err(|_| out_of_range(input)))
                .unwrap_or(Ok(0))
        };
        let fraction_ms = match caps.get(5) {
            Some(m) => {
                let digits = format!("{:0<3}", m.as_str());
                digits.parse::<i64>().map_err(|_| out_of_range(input))?
            }
            None => 0,
        };
        let total = [
            Duration::try_days(field(1)?),
            Duration::try_hours(field(2)?),
            Duration::try_minutes(field(3)?),
            Duration::try_seconds(field(4)?),
            Duration::try_milliseconds(fraction_ms),
        ]
        .into_iter()
        .try_fold(Duration::zero(), |acc, part| acc.checked_add(&part?))
        .ok_or_else(|| out_of_range(input))?;
        return Ok(total);
    }

    match humantime::parse_duration(trimmed) {
        Ok(std) => Duration::from_std(std).map_err(|_| out_of_range(input)),
        Err(humantime::DurationError::NumberOverflow) => Err(out_of_range(input)),
        Err(_) => Err(malformed(input)),
    }
}

/// Format a duration for display, e.g. `1h 30m`, `45s`, `1s 250ms`.
///
/// Sub-millisecond precision is dropped.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.num_milliseconds();
    if millis == 0 {
        return "0s".to_string();
    }
    let sign = if millis < 0 { "-" } else { "" };
    let std = std::time::Duration::from_millis(millis.unsigned_abs());
    format!("{}{}", sign, humantime::format_duration(std))
}

fn malformed(input: &str) -> SchedLockError {
    SchedLockError::ConfigInvalid(format!(
        "malformed duration '{}' (expected e.g. '5m', '1h30m', 'PT5M' or milliseconds)",
        input
    ))
}

fn out_of_range(input: &str) -> SchedLockError {
    SchedLockError::ConfigInvalid(format!("duration '{}' is out of range", input))
}
