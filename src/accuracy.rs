//! 🎯 Accuracy Self-Check
//!
//! Tracks each emitted prediction against the round it targeted and scores
//! it when that round resolves. Feeds the periodic hit-rate report; carries
//! no staking state of any kind.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::history::{HistoryEntry, Outcome};

/// One scored prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCall {
    pub issue_id: u64,
    pub predicted: Outcome,
    pub actual: Outcome,
    pub hit: bool,
}

/// Per-issue prediction bookkeeping with a bounded rolling record
pub struct AccuracyTracker {
    /// Predictions waiting for their round to resolve
    pending: HashMap<u64, Outcome>,

    /// Most recent scored calls, newest last
    resolved: VecDeque<ResolvedCall>,

    /// Cap on the rolling record
    window: usize,

    // Lifetime counters
    hits: u64,
    misses: u64,
}

impl AccuracyTracker {
    pub fn new(window: usize) -> Self {
        Self {
            pending: HashMap::new(),
            resolved: VecDeque::new(),
            window,
            hits: 0,
            misses: 0,
        }
    }

    /// Record the side predicted for an upcoming issue. A repeated
    /// prediction for the same issue overwrites the earlier one.
    pub fn record_prediction(&mut self, issue_id: u64, side: Outcome) {
        self.pending.insert(issue_id, side);
    }

    /// Score a resolved round against its pending prediction, if any
    pub fn resolve(&mut self, entry: &HistoryEntry) -> Option<bool> {
        let predicted = self.pending.remove(&entry.issue_id)?;
        let hit = predicted == entry.size;

        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }

        self.resolved.push_back(ResolvedCall {
            issue_id: entry.issue_id,
            predicted,
            actual: entry.size,
            hit,
        });
        while self.resolved.len() > self.window {
            self.resolved.pop_front();
        }

        debug!(
            "{} issue {}: predicted {}, got {}",
            if hit { "✅" } else { "❌" },
            entry.issue_id,
            predicted.as_str(),
            entry.size.as_str()
        );
        Some(hit)
    }

    /// Lifetime hit rate, None before the first scored call
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 / total as f64)
    }

    /// Hit rate over the bounded rolling record
    pub fn rolling_hit_rate(&self) -> Option<f64> {
        if self.resolved.is_empty() {
            return None;
        }
        let hits = self.resolved.iter().filter(|c| c.hit).count();
        Some(hits as f64 / self.resolved.len() as f64)
    }

    pub fn scored(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// One-line report for the periodic summary log
    pub fn summary(&self) -> String {
        match self.hit_rate() {
            Some(rate) => format!(
                "{}/{} hits ({:.1}%), rolling {:.1}%",
                self.hits,
                self.scored(),
                rate * 100.0,
                self.rolling_hit_rate().unwrap_or(0.0) * 100.0
            ),
            None => "no scored predictions yet".to_string(),
        }
    }
}
