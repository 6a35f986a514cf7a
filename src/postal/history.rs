//! Append-only log of lookup attempts and the statistics derived from it.

use super::code::PostalCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded lookup attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub code: PostalCode,
    /// HTTP status returned by the service
    pub status: u16,
    pub timestamp: DateTime<Utc>,
}

impl SearchRecord {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Aggregate statistics over a search history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    /// Percentage of successful lookups, rounded to 2 decimals
    pub success_rate: f64,
}

/// Insertion-ordered history; records are never mutated or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHistory {
    records: Vec<SearchRecord>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, code: PostalCode, status: u16, timestamp: DateTime<Utc>) {
        self.records.push(SearchRecord {
            code,
            status,
            timestamp,
        });
    }

    pub fn records(&self) -> &[SearchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> SearchStats {
        let total = self.records.len();
        let successes = self.records.iter().filter(|r| r.is_success()).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            round_two(successes as f64 / total as f64 * 100.0)
        };

        SearchStats {
            total,
            successes,
            failures: total - successes,
            success_rate,
        }
    }
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> PostalCode {
        PostalCode::parse("01001000").unwrap()
    }

    #[test]
    fn test_empty_stats() {
        let stats = SearchHistory::new().stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.successes, 0);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_three_of_four() {
        let mut history = SearchHistory::new();
        for status in [200, 200, 404, 200] {
            history.record(code(), status, Utc::now());
        }
        let stats = history.stats();
        assert_eq!((stats.total, stats.successes, stats.failures), (4, 3, 1));
        assert_eq!(stats.success_rate, 75.0);
    }

    #[test]
    fn test_rate_rounded() {
        let mut history = SearchHistory::new();
        for status in [200, 500, 500] {
            history.record(code(), status, Utc::now());
        }
        assert_eq!(history.stats().success_rate, 33.33);
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut history = SearchHistory::new();
        history.record(code(), 200, Utc::now());
        history.record(PostalCode::parse("20040002").unwrap(), 429, Utc::now());
        let statuses: Vec<u16> = history.records().iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![200, 429]);
    }
}
