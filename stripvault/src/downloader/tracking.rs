//! Retrieval status and error tracking collaborators.
//!
//! The registry reports every download attempt to a [`RetrievalTracker`] and
//! keeps per-comic error history in an [`ErrorTracker`]. [`InMemoryTracker`]
//! implements both for the CLI and tests; [`NoopTracker`] discards
//! everything.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::FailureKind;

/// Errors kept per comic before the oldest are dropped.
pub const MAX_ERRORS_PER_COMIC: usize = 100;

/// Retrieval records kept before the oldest are dropped.
pub const MAX_RETRIEVAL_RECORDS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrievalStatus {
    Success,
    Failure(FailureKind),
}

/// One download attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalRecord {
    pub comic_id: u32,
    pub comic_name: String,
    pub source: String,
    pub date: NaiveDate,
    pub status: RetrievalStatus,
    pub error_message: Option<String>,
    pub duration: Duration,
    pub image_size: Option<usize>,
    pub recorded_at: DateTime<Utc>,
}

/// One classified failure in a comic's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub kind: FailureKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

pub trait RetrievalTracker: Send + Sync {
    fn record_retrieval(&self, record: RetrievalRecord);
}

pub trait ErrorTracker: Send + Sync {
    fn record_error(&self, comic_id: u32, kind: FailureKind, message: &str);

    /// Forget a comic's error history after a successful download.
    fn clear_errors(&self, comic_id: u32);
}

/// Tracker that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl RetrievalTracker for NoopTracker {
    fn record_retrieval(&self, _record: RetrievalRecord) {}
}

impl ErrorTracker for NoopTracker {
    fn record_error(&self, _comic_id: u32, _kind: FailureKind, _message: &str) {}

    fn clear_errors(&self, _comic_id: u32) {}
}

/// Bounded in-memory retrieval log and error history.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    records: Mutex<Vec<RetrievalRecord>>,
    errors: Mutex<HashMap<u32, Vec<ErrorRecord>>>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<RetrievalRecord> {
        self.records.lock().clone()
    }

    pub fn errors_for(&self, comic_id: u32) -> Vec<ErrorRecord> {
        self.errors.lock().get(&comic_id).cloned().unwrap_or_default()
    }

    /// Comics with at least one recorded error, ascending.
    pub fn comics_with_errors(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.errors.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// `(successes, failures)` across all records.
    pub fn totals(&self) -> (usize, usize) {
        let records = self.records.lock();
        let successes = records
            .iter()
            .filter(|r| r.status == RetrievalStatus::Success)
            .count();
        (successes, records.len() - successes)
    }
}

impl RetrievalTracker for InMemoryTracker {
    fn record_retrieval(&self, record: RetrievalRecord) {
        let mut records = self.records.lock();
        if records.len() >= MAX_RETRIEVAL_RECORDS {
            records.remove(0);
        }
        records.push(record);
    }
}

impl ErrorTracker for InMemoryTracker {
    fn record_error(&self, comic_id: u32, kind: FailureKind, message: &str) {
        let mut errors = self.errors.lock();
        let history = errors.entry(comic_id).or_default();
        if history.len() >= MAX_ERRORS_PER_COMIC {
            history.remove(0);
        }
        history.push(ErrorRecord {
            kind,
            message: message.to_string(),
            occurred_at: Utc::now(),
        });
    }

    fn clear_errors(&self, comic_id: u32) {
        self.errors.lock().remove(&comic_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: RetrievalStatus) -> RetrievalRecord {
        RetrievalRecord {
            comic_id: 1,
            comic_name: "Tracked".to_string(),
            source: "test".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status,
            error_message: None,
            duration: Duration::from_millis(5),
            image_size: None,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_error_history_cleared() {
        let tracker = InMemoryTracker::new();
        tracker.record_error(1, FailureKind::NetworkError, "timeout");
        tracker.record_error(1, FailureKind::ParsingError, "bad html");
        tracker.record_error(2, FailureKind::UnknownError, "?");

        assert_eq!(tracker.errors_for(1).len(), 2);
        assert_eq!(tracker.comics_with_errors(), vec![1, 2]);

        tracker.clear_errors(1);
        assert!(tracker.errors_for(1).is_empty());
        assert_eq!(tracker.comics_with_errors(), vec![2]);
    }

    #[test]
    fn test_error_history_bounded() {
        let tracker = InMemoryTracker::new();
        for i in 0..(MAX_ERRORS_PER_COMIC + 5) {
            tracker.record_error(1, FailureKind::NetworkError, &i.to_string());
        }
        let history = tracker.errors_for(1);
        assert_eq!(history.len(), MAX_ERRORS_PER_COMIC);
        assert_eq!(history[0].message, "5");
    }

    #[test]
    fn test_totals() {
        let tracker = InMemoryTracker::new();
        tracker.record_retrieval(record(RetrievalStatus::Success));
        tracker.record_retrieval(record(RetrievalStatus::Failure(FailureKind::NetworkError)));
        tracker.record_retrieval(record(RetrievalStatus::Success));

        assert_eq!(tracker.totals(), (2, 1));
        assert_eq!(tracker.records().len(), 3);
    }
}
