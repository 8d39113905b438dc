//! Per-minute window aggregation.
//!
//! Caption records collect into the current minute's window; when the
//! wall clock crosses into a new minute and the window is dense enough,
//! the window is taken for summarization and a fresh one installed.
//! Sparse windows carry forward instead of producing low-information
//! summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use vcap_models::{minute_floor, parse_hint_suffix, CaptionRecord, TimeWindow};

/// Rolling per-minute aggregator for one session.
pub struct WindowAggregator {
    window: TimeWindow,
    min_records: usize,
}

impl WindowAggregator {
    /// Create an aggregator collecting from the minute containing `now`.
    pub fn new(min_records: usize, now: DateTime<Utc>) -> Self {
        Self {
            window: TimeWindow::starting_at(now),
            min_records,
        }
    }

    /// Append a record to the current window.
    pub fn record(&mut self, record: CaptionRecord) {
        self.window.push(record);
    }

    /// The window currently collecting.
    pub fn current(&self) -> &TimeWindow {
        &self.window
    }

    /// Minute-boundary check.
    ///
    /// Returns the closed window when `now` has crossed into a new minute
    /// AND the window holds at least `min_records` distinct timestamp
    /// keys. The replacement window starts at the just-crossed minute.
    /// A sparse crossing leaves the window (including its start minute)
    /// untouched so its records merge into the next flush.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TimeWindow> {
        let current_minute = minute_floor(now);
        if current_minute <= self.window.start_minute {
            return None;
        }

        if self.window.distinct_keys() < self.min_records {
            debug!(
                distinct = self.window.distinct_keys(),
                required = self.min_records,
                "Sparse window carried into next minute"
            );
            return None;
        }

        let closed = std::mem::replace(&mut self.window, TimeWindow::starting_at(now));
        Some(closed)
    }
}

/// Session-wide detection tally.
///
/// Folds every record's detection hint into a running **maximum** count
/// per class — the largest simultaneous count observed, not a sum, since
/// the same objects are recounted across frames. A pure function of the
/// record collection.
#[derive(Debug, Default, Clone)]
pub struct DetectionTally {
    max_counts: BTreeMap<String, u32>,
    clean_texts: Vec<String>,
}

impl DetectionTally {
    /// Fold a record collection into a tally.
    pub fn fold(records: &[CaptionRecord]) -> Self {
        let mut tally = Self::default();
        for record in records {
            tally.observe(record);
        }
        tally
    }

    /// Fold one record into the tally.
    pub fn observe(&mut self, record: &CaptionRecord) {
        let (clean, entries) = parse_hint_suffix(&record.text);
        self.clean_texts.push(clean);
        for (class, count) in entries {
            let entry = self.max_counts.entry(class).or_insert(0);
            *entry = (*entry).max(count);
        }
    }

    /// Largest simultaneous count observed per class.
    pub fn max_counts(&self) -> &BTreeMap<String, u32> {
        &self.max_counts
    }

    /// Caption texts with hint suffixes stripped, production order.
    pub fn clean_texts(&self) -> &[String] {
        &self.clean_texts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn record(key: &str, text: &str) -> CaptionRecord {
        CaptionRecord::new(key, text)
    }

    #[test]
    fn test_no_flush_within_the_same_minute() {
        let mut agg = WindowAggregator::new(3, at(10, 30, 5));
        for i in 0..5 {
            agg.record(record(&format!("10:30:{:02}", i), "text"));
        }
        assert!(agg.tick(at(10, 30, 59)).is_none());
    }

    #[test]
    fn test_density_gate_blocks_sparse_flush() {
        let mut agg = WindowAggregator::new(3, at(10, 30, 0));
        agg.record(record("10:30:01", "a"));
        agg.record(record("10:30:02", "b"));

        // Only 2 distinct keys at the crossing: carry forward.
        assert!(agg.tick(at(10, 31, 1)).is_none());
        assert_eq!(agg.current().record_count(), 2);
        assert_eq!(agg.current().start_minute, at(10, 30, 0));
    }

    #[test]
    fn test_dense_crossing_flushes_and_resets() {
        let mut agg = WindowAggregator::new(3, at(10, 30, 0));
        agg.record(record("10:30:01", "a"));
        agg.record(record("10:30:02", "b"));
        agg.record(record("10:30:03", "c"));

        let closed = agg.tick(at(10, 31, 2)).expect("window should flush");
        assert_eq!(closed.record_count(), 3);
        assert_eq!(closed.start_minute, at(10, 30, 0));

        // Fresh window at the just-crossed minute.
        assert_eq!(agg.current().record_count(), 0);
        assert_eq!(agg.current().start_minute, at(10, 31, 0));
    }

    #[test]
    fn test_carried_records_flush_with_later_minute() {
        let mut agg = WindowAggregator::new(3, at(10, 30, 0));
        agg.record(record("10:30:01", "a"));
        agg.record(record("10:30:02", "b"));
        assert!(agg.tick(at(10, 31, 0)).is_none());

        agg.record(record("10:31:07", "c"));
        let closed = agg.tick(at(10, 32, 0)).expect("merged window should flush");
        assert_eq!(closed.record_count(), 3);
    }

    #[test]
    fn test_duplicate_keys_count_once_for_density() {
        let mut agg = WindowAggregator::new(3, at(10, 30, 0));
        agg.record(record("10:30:01", "a"));
        agg.record(record("10:30:01", "b"));
        agg.record(record("10:30:01", "c"));
        assert!(agg.tick(at(10, 31, 0)).is_none());
    }

    #[test]
    fn test_tally_running_maximum() {
        let records = vec![
            record("k1", "a (Detected: dog: 2)"),
            record("k2", "b (Detected: dog: 5)"),
            record("k3", "c (Detected: dog: 1)"),
        ];
        let tally = DetectionTally::fold(&records);
        assert_eq!(tally.max_counts().get("dog"), Some(&5));
    }

    #[test]
    fn test_tally_strips_suffixes() {
        let records = vec![
            record("k1", "a dog runs (Detected: dog: 2, person: 1)"),
            record("k2", "an empty room"),
        ];
        let tally = DetectionTally::fold(&records);
        assert_eq!(
            tally.clean_texts(),
            &["a dog runs".to_string(), "an empty room".to_string()]
        );
        assert_eq!(tally.max_counts().get("person"), Some(&1));
    }

    #[test]
    fn test_tally_malformed_count_defaults_to_one() {
        let records = vec![record("k1", "a (Detected: cat: lots)")];
        let tally = DetectionTally::fold(&records);
        assert_eq!(tally.max_counts().get("cat"), Some(&1));
    }
}
