// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron expression parsing
//!
//! Five fields schedule at minute granularity, six fields (leading seconds)
//! at second granularity. Numeric weekdays follow standard cron (0-6 from
//! Sunday, 7 also Sunday) and are rewritten to day names before parsing.

use chrono::{DateTime, TimeZone};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("cron expression {expr:?} has {count} fields, expected 5 or 6")]
    FieldCount { expr: String, count: usize },
    #[error("invalid cron expression {expr:?}: {message}")]
    Invalid { expr: String, message: String },
}

/// Scheduling resolution implied by the field count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Minute,
    Second,
}

/// A validated cron schedule
#[derive(Debug, Clone)]
pub struct CronSpec {
    expr: String,
    granularity: Granularity,
    schedule: cron::Schedule,
}

impl CronSpec {
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let mut fields: Vec<String> = expr.split_whitespace().map(str::to_string).collect();
        let granularity = match fields.len() {
            5 => Granularity::Minute,
            6 => Granularity::Second,
            count => {
                return Err(ScheduleError::FieldCount {
                    expr: expr.to_string(),
                    count,
                })
            }
        };
        if let Some(dow) = fields.last_mut() {
            *dow = day_of_week_names(dow).map_err(|message| ScheduleError::Invalid {
                expr: expr.to_string(),
                message,
            })?;
        }
        let normalized = match granularity {
            Granularity::Minute => format!("0 {}", fields.join(" ")),
            Granularity::Second => fields.join(" "),
        };

        let schedule =
            cron::Schedule::from_str(&normalized).map_err(|e| ScheduleError::Invalid {
                expr: expr.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            expr: expr.to_string(),
            granularity,
            schedule,
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// First fire time strictly after `after`
    pub fn next_after<Z: TimeZone>(&self, after: &DateTime<Z>) -> Option<DateTime<Z>> {
        self.schedule.after(after).next()
    }
}

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Rewrite numeric weekday items as day-name lists. Items already using names
/// and a bare `*` or `?` pass through.
fn day_of_week_names(field: &str) -> Result<String, String> {
    let items = field
        .split(',')
        .map(day_of_week_item)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items.join(","))
}

fn day_of_week_item(item: &str) -> Result<String, String> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => {
            let step: usize = step
                .parse()
                .map_err(|_| format!("invalid day-of-week step in {:?}", item))?;
            if step == 0 {
                return Err(format!("day-of-week step must be positive in {:?}", item));
            }
            (range, Some(step))
        }
        None => (item, None),
    };

    let numeric = range.starts_with(|c: char| c.is_ascii_digit());
    if !numeric && !(range == "*" && step.is_some()) {
        return Ok(item.to_string());
    }

    let (start, end) = match range.split_once('-') {
        _ if range == "*" => (0, 6),
        Some((start, end)) => (day_number(start, item)?, day_number(end, item)?),
        None => {
            let start = day_number(range, item)?;
            (start, if step.is_some() { 6 } else { start })
        }
    };
    if start > end {
        return Err(format!("day-of-week range {:?} runs backwards", item));
    }

    let mut days: Vec<&str> = Vec::new();
    for day in (start..=end).step_by(step.unwrap_or(1)) {
        let name = DAY_NAMES[day % 7];
        if !days.contains(&name) {
            days.push(name);
        }
    }
    Ok(days.join(","))
}

fn day_number(text: &str, item: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n <= 7 => Ok(n),
        _ => Err(format!("day-of-week {:?} is not in 0-7 in {:?}", text, item)),
    }
}

impl fmt::Display for CronSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

impl FromStr for CronSpec {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
