//! Append-only log of completed phases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Snapshot taken when a phase runs out on its own.
///
/// Never created for a manual advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub phase: Phase,
    pub ended_at: DateTime<Utc>,
    /// Momentum at the moment the phase ended.
    pub momentum: f64,
    /// Focus target in effect when the phase ended.
    pub focus_secs: u32,
}

/// Ordered, append-only session history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLog {
    records: Vec<SessionRecord>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SessionRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: SessionRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&SessionRecord> {
        self.records.last()
    }

    /// The `n` most recent records, oldest first.
    pub fn recent(&self, n: usize) -> &[SessionRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Mean momentum over the `n` most recent records.
    pub fn mean_momentum(&self, n: usize) -> Option<f64> {
        let recent = self.recent(n);
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().map(|r| r.momentum).sum::<f64>() / recent.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(momentum: f64) -> SessionRecord {
        SessionRecord {
            phase: Phase::Focus,
            ended_at: Utc::now(),
            momentum,
            focus_secs: 840,
        }
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let log = SessionLog::from_records((0..8).map(|i| record(i as f64)).collect());
        let tail: Vec<f64> = log.recent(3).iter().map(|r| r.momentum).collect();
        assert_eq!(tail, vec![5.0, 6.0, 7.0]);
        assert_eq!(log.recent(100).len(), 8);
    }

    #[test]
    fn mean_momentum_over_window() {
        let log = SessionLog::from_records(vec![record(4.0), record(1.0), record(2.0)]);
        assert_eq!(log.mean_momentum(2), Some(1.5));
        assert_eq!(SessionLog::new().mean_momentum(6), None);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut log = SessionLog::new();
        log.push(record(0.5));
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["phase"], "Focus");
    }
}
