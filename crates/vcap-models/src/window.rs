//! Caption records and per-minute aggregation windows.

use std::collections::BTreeSet;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

/// One generated caption, keyed for aggregation.
///
/// The key is a wall-clock `HH:MM:SS` timestamp in live mode or a
/// `frame_<idx>` string in batch mode. The text already embeds the
/// detection hint when one was attached at generation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRecord {
    pub key: String,
    pub text: String,
}

impl CaptionRecord {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    /// Key for a live-mode record captured at `at`.
    pub fn live_key(at: DateTime<Utc>) -> String {
        at.format("%H:%M:%S").to_string()
    }

    /// Key for a batch-mode record at frame `index`.
    pub fn frame_key(index: u64) -> String {
        format!("frame_{}", index)
    }
}

/// Floor a timestamp to the start of its minute.
pub fn minute_floor(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TimeDelta::minutes(1))
        .expect("minute truncation never overflows")
}

/// A one-minute bucket of caption records, the unit of summarization.
///
/// Records stay in insertion order; the window is mutated only by the
/// aggregator that owns it and is taken wholesale on flush.
#[derive(Debug, Clone)]
pub struct TimeWindow {
    /// Start of the minute this window covers.
    pub start_minute: DateTime<Utc>,
    records: Vec<CaptionRecord>,
}

impl TimeWindow {
    /// Open a window at the minute containing `now`.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            start_minute: minute_floor(now),
            records: Vec::new(),
        }
    }

    /// Append a record, preserving production order.
    pub fn push(&mut self, record: CaptionRecord) {
        self.records.push(record);
    }

    /// Records in production order.
    pub fn records(&self) -> &[CaptionRecord] {
        &self.records
    }

    /// Total records collected.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Number of distinct timestamp keys — the density-gate measure.
    pub fn distinct_keys(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.key.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Group records into an ordered `key -> texts` mapping for the
    /// summarizer. First-seen key order is preserved; texts within a key
    /// keep production order.
    pub fn grouped(&self) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for record in &self.records {
            match groups.iter_mut().find(|(key, _)| *key == record.key) {
                Some((_, texts)) => texts.push(record.text.clone()),
                None => groups.push((record.key.clone(), vec![record.text.clone()])),
            }
        }
        groups
    }
}
