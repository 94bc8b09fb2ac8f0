use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

/// Monotonic wall-clock source for store writes. Consecutive calls never
/// return the same or an earlier instant, even under concurrency, so every
/// write lands strictly after the previous one. Unread predicates compare
/// timestamps with strict inequality and must not depend on the OS clock's
/// resolution or on two writes sharing a microsecond.
pub struct Clock {
    last_micros: AtomicI64,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            last_micros: AtomicI64::new(0),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut prev = self.last_micros.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self.last_micros.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return DateTime::from_timestamp_micros(next)
                        .expect("microsecond timestamp in representable range");
                }
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-width RFC 3339 UTC with microseconds (`2026-08-25T12:34:56.123456Z`).
/// Lexicographic order equals chronological order, which every timestamp
/// comparison in the SQL relies on.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp {s:?} in database: {e}");
            DateTime::default()
        })
}
