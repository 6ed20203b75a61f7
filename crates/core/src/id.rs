// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifier generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Identifier of one job invocation, a nanosecond timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub i64);

impl RunId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(RunId)
    }
}

/// Generates run identifiers
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self, started_at: DateTime<Utc>) -> RunId;
}

/// Nanosecond-timestamp generator for production use.
///
/// Ids strictly increase for the lifetime of the generator: when two runs
/// start within the same nanosecond, or the wall clock steps backwards, the
/// previous id plus one is issued instead.
#[derive(Clone, Default)]
pub struct TimestampIdGen {
    last: Arc<AtomicI64>,
}

impl TimestampIdGen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGen for TimestampIdGen {
    fn next(&self, started_at: DateTime<Utc>) -> RunId {
        let nanos = started_at.timestamp_nanos_opt().unwrap_or(i64::MIN);
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = nanos.max(current.saturating_add(1));
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return RunId(candidate),
                Err(observed) => current = observed,
            }
        }
    }
}

/// Sequential generator for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    counter: Arc<AtomicI64>,
}

impl SequentialIdGen {
    pub fn starting_at(first: i64) -> Self {
        Self {
            counter: Arc::new(AtomicI64::new(first)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self, _started_at: DateTime<Utc>) -> RunId {
        RunId(self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_gen_uses_nanoseconds() {
        let id_gen = TimestampIdGen::new();
        let at = DateTime::from_timestamp(1_700_000_000, 123).unwrap();
        assert_eq!(id_gen.next(at), RunId(1_700_000_000_000_000_123));
    }

    #[test]
    fn timestamp_gen_strictly_increases_for_same_instant() {
        let id_gen = TimestampIdGen::new();
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let first = id_gen.next(at);
        let second = id_gen.next(at);
        let third = id_gen.next(at);
        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn timestamp_gen_survives_clock_stepping_back() {
        let id_gen = TimestampIdGen::new();
        let later = DateTime::from_timestamp(1_700_000_100, 0).unwrap();
        let earlier = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let first = id_gen.next(later);
        let second = id_gen.next(earlier);
        assert!(second > first);
    }

    #[test]
    fn sequential_gen_is_cloneable_and_shared() {
        let id_gen1 = SequentialIdGen::starting_at(10);
        let id_gen2 = id_gen1.clone();
        let now = Utc::now();
        assert_eq!(id_gen1.next(now), RunId(10));
        assert_eq!(id_gen2.next(now), RunId(11));
    }

    #[test]
    fn run_id_round_trips_through_display() {
        let id: RunId = "1700000000000000123".parse().unwrap();
        assert_eq!(id.to_string(), "1700000000000000123");
    }
}
