// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relative time expressions such as `"7 DAYS"` or `"1 DAY 2 HOURS"`.
//!
//! A pattern is a free-text string containing `<integer> <unit>` tokens.
//! Months are 30 days and years are 365 days; there is no calendar
//! arithmetic. Text between tokens is ignored.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s+(SECOND|MINUTE|HOUR|DAY|WEEK|MONTH|YEAR)S?")
        .expect("constant regex pattern is valid")
});

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Which side of "now" a pattern resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `now - pattern`, used for retention cutoffs
    Before,
    /// `now + pattern`
    After,
}

/// A parsed duration pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationPattern {
    offset: Duration,
}

impl DurationPattern {
    /// Parse a pattern. Returns `None` when no token matched, or when the
    /// accumulated offset does not fit a `chrono::Duration`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut total_secs: i64 = 0;
        let mut matched = false;

        for caps in TOKEN_PATTERN.captures_iter(text) {
            let amount: i64 = caps[1].parse().ok()?;
            let unit = unit_seconds(&caps[2])?;
            total_secs = total_secs.checked_add(amount.checked_mul(unit)?)?;
            matched = true;
        }

        if !matched {
            return None;
        }
        Duration::try_seconds(total_secs).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Apply the offset to `now` in the given direction
    pub fn resolve(&self, now: DateTime<Utc>, direction: Direction) -> Option<DateTime<Utc>> {
        match direction {
            Direction::Before => now.checked_sub_signed(self.offset),
            Direction::After => now.checked_add_signed(self.offset),
        }
    }
}

/// Parse `text` and resolve it against `now` in one step.
///
/// `None` plays the role of the "success = false" flag: the pattern held no
/// recognizable token or the result is out of range.
pub fn resolve_pattern(
    text: &str,
    now: DateTime<Utc>,
    direction: Direction,
) -> Option<DateTime<Utc>> {
    DurationPattern::parse(text)?.resolve(now, direction)
}

fn unit_seconds(unit: &str) -> Option<i64> {
    let secs = match unit.to_ascii_uppercase().as_str() {
        "SECOND" => 1,
        "MINUTE" => MINUTE,
        "HOUR" => HOUR,
        "DAY" => DAY,
        "WEEK" => 7 * DAY,
        "MONTH" => 30 * DAY,
        "YEAR" => 365 * DAY,
        _ => return None,
    };
    Some(secs)
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
