//! 🔌 Feed Seams
//!
//! The two faces the engine shows its collaborators: a source of resolved
//! rounds and a sink for emitted predictions. The real upstream (game API
//! transport, persistence) and downstream (notification, staking) live
//! outside this crate; the simulator and log sink here stand in for them.

use anyhow::Result;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::ensemble::Prediction;
use crate::history::HistoryEntry;

/// Supplies newly resolved rounds, newest-first
pub trait RoundSource {
    fn poll(&mut self) -> Result<Vec<HistoryEntry>>;
}

/// Receives the prediction computed for an upcoming issue
pub trait PredictionSink {
    fn publish(&mut self, issue_id: u64, prediction: &Prediction) -> Result<()>;
}

/// Deterministic random round source for the runner and demos
///
/// Draws are independent uniform 0-9, which makes the predictions
/// statistically meaningless by construction; the simulator exists to
/// exercise the engine, not to validate the game.
pub struct SimulatedFeed {
    rng: StdRng,
    next_issue: u64,
    backfill: usize,
    first_poll: bool,
}

impl SimulatedFeed {
    pub fn new(seed: u64, start_issue: u64, backfill: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_issue: start_issue,
            backfill,
            first_poll: true,
        }
    }
}

impl RoundSource for SimulatedFeed {
    fn poll(&mut self) -> Result<Vec<HistoryEntry>> {
        // First poll returns a page of backfill like a real history fetch;
        // afterwards one round resolves per poll
        let count = if self.first_poll {
            self.first_poll = false;
            self.backfill.max(1)
        } else {
            1
        };

        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            let number: u8 = self.rng.gen_range(0..=9);
            batch.push(HistoryEntry::from_number(self.next_issue, number));
            self.next_issue += 1;
        }
        batch.reverse();
        Ok(batch)
    }
}

/// Sink that publishes predictions to the application log as JSON
#[derive(Debug, Default)]
pub struct LogSink {
    published: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl PredictionSink for LogSink {
    fn publish(&mut self, issue_id: u64, prediction: &Prediction) -> Result<()> {
        self.published += 1;
        info!(
            "🔮 Issue {}: {} ({}%) via {} — {}",
            issue_id,
            prediction.side.as_str(),
            prediction.confidence,
            prediction.best_detector,
            prediction.reason
        );

        let payload = json!({
            "issue": issue_id,
            "prediction": prediction,
        });
        debug!("🔮 payload: {}", payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Outcome;

    #[test]
    fn test_simulated_feed_is_deterministic() {
        let mut a = SimulatedFeed::new(7, 1000, 20);
        let mut b = SimulatedFeed::new(7, 1000, 20);
        assert_eq!(a.poll().unwrap(), b.poll().unwrap());
        assert_eq!(a.poll().unwrap(), b.poll().unwrap());
    }

    #[test]
    fn test_backfill_then_single_rounds() {
        let mut feed = SimulatedFeed::new(1, 500, 30);
        let first = feed.poll().unwrap();
        assert_eq!(first.len(), 30);
        // Newest-first page
        assert_eq!(first[0].issue_id, 529);
        assert_eq!(first[29].issue_id, 500);

        let second = feed.poll().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].issue_id, 530);
    }

    #[test]
    fn test_drawn_numbers_in_domain() {
        let mut feed = SimulatedFeed::new(99, 1, 200);
        for entry in feed.poll().unwrap() {
            assert!(entry.number <= 9);
            assert_eq!(entry.size, Outcome::from_number(entry.number));
        }
    }

    #[test]
    fn test_log_sink_counts_publishes() {
        let mut sink = LogSink::new();
        let prediction = Prediction {
            side: Outcome::Big,
            confidence: 77,
            best_detector: "Streak".to_string(),
            best_score: 0.9,
            reason: "Streak of 4 running".to_string(),
            occurrences: 4,
            details: "Streak(90%)[4]; ".to_string(),
            projected_path: Vec::new(),
        };
        sink.publish(123, &prediction).unwrap();
        sink.publish(124, &prediction).unwrap();
        assert_eq!(sink.published(), 2);
    }
}
