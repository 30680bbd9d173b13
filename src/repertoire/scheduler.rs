//! # Review Scheduling
//!
//! A small Leitner-style scheduler. Each correct review moves the
//! opening one step along a fixed interval ladder; any mistake drops it back to
//! the start and brings it back the same day.
//!
//! ```text
//! consecutive correct   1    2    3    4     5+
//! interval (days)       1    3    7    14    min(30, 7 * count)
//! ```
//!
//! `difficulty` is bookkeeping only: it drifts down 0.1 per correct review and
//! up 0.2 per mistake, always clamped to `[0, 1]`.
//!
//! The function is pure. Persisting the returned record is the caller's job.

use crate::model::OpeningRecord;
use chrono::{DateTime, Duration, Utc};

const CORRECT_DIFFICULTY_STEP: f64 = 0.1;
const INCORRECT_DIFFICULTY_STEP: f64 = 0.2;
const MAX_INTERVAL_DAYS: f64 = 30.0;
const RETRY_INTERVAL_DAYS: f64 = 0.5;

/// Interval in days for an opening that has just reached `review_count`
/// consecutive correct reviews.
pub fn review_interval(review_count: u32) -> f64 {
    match review_count {
        0 => RETRY_INTERVAL_DAYS,
        1 => 1.0,
        2 => 3.0,
        3 => 7.0,
        4 => 14.0,
        n => (f64::from(n) * 7.0).min(MAX_INTERVAL_DAYS),
    }
}

pub fn compute_next_review(
    record: &OpeningRecord,
    was_correct: bool,
    now: DateTime<Utc>,
) -> OpeningRecord {
    let mut updated = record.clone();

    let interval_days = if was_correct {
        updated.review_count = updated.review_count.saturating_add(1);
        updated.difficulty = (updated.difficulty - CORRECT_DIFFICULTY_STEP).max(0.0);
        review_interval(updated.review_count)
    } else {
        updated.review_count = 0;
        updated.difficulty = (updated.difficulty + INCORRECT_DIFFICULTY_STEP).min(1.0);
        RETRY_INTERVAL_DAYS
    };

    updated.last_reviewed = Some(now);
    updated.next_review = Some(now + days(interval_days));
    updated
}

fn days(interval: f64) -> Duration {
    Duration::milliseconds((interval * 24.0 * 60.0 * 60.0 * 1000.0).round() as i64)
}
