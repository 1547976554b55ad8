//! 📖 Bridge Playbook
//!
//! A fast-path predictor independent of the weighted ensemble: matches the
//! five most recent outcomes against a literal table of named bridge shapes,
//! and supplements the table with n-gram statistics learned from long
//! history. The highest-confidence candidate wins; no match means wait.

use std::collections::HashMap;

use log::info;

use crate::history::{HistoryEntry, Outcome};

/// One playbook verdict
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybookCall {
    pub side: Outcome,

    /// Flat per-row confidence, or the learned win percentage
    pub confidence: u8,

    pub reason: String,

    /// Named pattern family ("1-1", "2-2", "Streak", "Learning", ...)
    pub pattern: &'static str,
}

struct PlaybookRow {
    sig: &'static str,
    side: Outcome,
    confidence: u8,
    reason: &'static str,
    pattern: &'static str,
}

/// Literal 5-char bridge table. Rows are checked in order and duplicate
/// signatures are deliberate (a shape can complete two different bridges);
/// highest confidence wins, first row winning ties.
const ROWS: &[PlaybookRow] = &[
    // 1-1: keep flipping
    PlaybookRow { sig: "BSBSB", side: Outcome::Small, confidence: 90, reason: "1-1 bridge", pattern: "1-1" },
    PlaybookRow { sig: "SBSBS", side: Outcome::Big, confidence: 90, reason: "1-1 bridge", pattern: "1-1" },
    // 2-1: continue the pattern
    PlaybookRow { sig: "BBSBB", side: Outcome::Small, confidence: 85, reason: "2-1 bridge", pattern: "2-1" },
    PlaybookRow { sig: "SSBSS", side: Outcome::Big, confidence: 85, reason: "2-1 bridge", pattern: "2-1" },
    PlaybookRow { sig: "BSSBS", side: Outcome::Small, confidence: 85, reason: "2-1 bridge", pattern: "2-1" },
    PlaybookRow { sig: "SBBSB", side: Outcome::Big, confidence: 85, reason: "2-1 bridge", pattern: "2-1" },
    // 2-2: continue in pairs
    PlaybookRow { sig: "BBSSB", side: Outcome::Big, confidence: 88, reason: "2-2 bridge", pattern: "2-2" },
    PlaybookRow { sig: "SSBBS", side: Outcome::Small, confidence: 88, reason: "2-2 bridge", pattern: "2-2" },
    PlaybookRow { sig: "BSSBB", side: Outcome::Small, confidence: 88, reason: "2-2 bridge", pattern: "2-2" },
    PlaybookRow { sig: "SBBSS", side: Outcome::Big, confidence: 88, reason: "2-2 bridge", pattern: "2-2" },
    // 3-1
    PlaybookRow { sig: "BBBSB", side: Outcome::Big, confidence: 82, reason: "3-1 bridge", pattern: "3-1" },
    PlaybookRow { sig: "SSSBS", side: Outcome::Small, confidence: 82, reason: "3-1 bridge", pattern: "3-1" },
    PlaybookRow { sig: "BSBBB", side: Outcome::Small, confidence: 82, reason: "3-1 bridge", pattern: "3-1" },
    PlaybookRow { sig: "SBSSS", side: Outcome::Big, confidence: 82, reason: "3-1 bridge", pattern: "3-1" },
    // 3-2: flip to the pair
    PlaybookRow { sig: "BBBSS", side: Outcome::Small, confidence: 84, reason: "3-2 bridge", pattern: "3-2" },
    PlaybookRow { sig: "SSSBB", side: Outcome::Big, confidence: 84, reason: "3-2 bridge", pattern: "3-2" },
    PlaybookRow { sig: "SSBBB", side: Outcome::Big, confidence: 84, reason: "3-2 bridge", pattern: "3-2" },
    PlaybookRow { sig: "BBSSS", side: Outcome::Small, confidence: 84, reason: "3-2 bridge", pattern: "3-2" },
    // 3-3 completing (shares signatures with 2-2 rows above)
    PlaybookRow { sig: "BSSBB", side: Outcome::Big, confidence: 86, reason: "3-3 bridge", pattern: "3-3" },
    PlaybookRow { sig: "SBBSS", side: Outcome::Small, confidence: 86, reason: "3-3 bridge", pattern: "3-3" },
    // Full streak: ride it
    PlaybookRow { sig: "BBBBB", side: Outcome::Big, confidence: 92, reason: "Full streak", pattern: "Streak" },
    PlaybookRow { sig: "SSSSS", side: Outcome::Small, confidence: 92, reason: "Full streak", pattern: "Streak" },
    // Streak with one older outlier: keep riding
    PlaybookRow { sig: "SBBBB", side: Outcome::Big, confidence: 78, reason: "Streak continuing", pattern: "Streak" },
    PlaybookRow { sig: "BSSSS", side: Outcome::Small, confidence: 78, reason: "Streak continuing", pattern: "Streak" },
    // Streak just broke: follow the break
    PlaybookRow { sig: "BBBBS", side: Outcome::Small, confidence: 75, reason: "Streak broken", pattern: "StreakBreak" },
    PlaybookRow { sig: "SSSSB", side: Outcome::Big, confidence: 75, reason: "Streak broken", pattern: "StreakBreak" },
];

#[derive(Debug, Default, Clone, Copy)]
struct PatternRecord {
    big: u32,
    small: u32,
}

/// Table matcher plus trainable n-gram statistics
pub struct BridgePlaybook {
    stats: HashMap<String, PatternRecord>,
}

impl BridgePlaybook {
    /// Minimum history length before training is attempted
    const MIN_TRAIN_HISTORY: usize = 50;

    /// A learned key needs strictly more samples than this to be used
    const MIN_SAMPLES: u32 = 10;

    /// Minimum learned win percentage to emit a candidate
    const MIN_WIN_PCT: u8 = 60;

    pub fn new() -> Self {
        Self {
            stats: HashMap::new(),
        }
    }

    /// Number of learned n-gram keys
    pub fn patterns_learned(&self) -> usize {
        self.stats.len()
    }

    /// Rebuild n-gram statistics from long history (newest-first input).
    ///
    /// For every position of an oldest-first replay, each suffix of length
    /// 2-5 of the trailing 10-entry window counts the outcome that followed
    /// it. Histories shorter than the training floor leave stats untouched.
    pub fn train(&mut self, history: &[HistoryEntry]) {
        if history.len() < Self::MIN_TRAIN_HISTORY {
            return;
        }

        self.stats.clear();
        let data: Vec<Outcome> = history.iter().rev().map(|e| e.size).collect();

        for i in 10..data.len() {
            let result = data[i];
            for len in 2..=5usize {
                let key: String = data[i - len..i].iter().map(|o| o.code()).collect();
                let record = self.stats.entry(key).or_default();
                if result == Outcome::Big {
                    record.big += 1;
                } else {
                    record.small += 1;
                }
            }
        }
        info!("📖 Playbook training complete: {} patterns learned", self.stats.len());
    }

    /// Predict the next outcome, or None to wait for a cleaner shape
    pub fn predict_next(&self, history: &[HistoryEntry]) -> Option<PlaybookCall> {
        if history.len() < 5 {
            return None;
        }
        let sig: String = history[..5].iter().map(|e| e.size.code()).collect();

        let mut candidates: Vec<PlaybookCall> = ROWS
            .iter()
            .filter(|row| row.sig == sig)
            .map(|row| PlaybookCall {
                side: row.side,
                confidence: row.confidence,
                reason: row.reason.to_string(),
                pattern: row.pattern,
            })
            .collect();

        // Learned statistics over the 3-5 most recent outcomes, keyed
        // oldest-first to match the training replay direction
        for len in 3..=5usize {
            let key: String = history[..len].iter().rev().map(|e| e.size.code()).collect();
            if let Some(record) = self.stats.get(&key) {
                let total = record.big + record.small;
                if total > Self::MIN_SAMPLES {
                    let side = if record.big > record.small {
                        Outcome::Big
                    } else {
                        Outcome::Small
                    };
                    let win_chance =
                        (f64::from(record.big.max(record.small)) / f64::from(total) * 100.0) as u8;
                    if win_chance >= Self::MIN_WIN_PCT {
                        candidates.push(PlaybookCall {
                            side,
                            confidence: win_chance,
                            reason: "Learned n-gram statistics".to_string(),
                            pattern: "Learning",
                        });
                    }
                }
            }
        }

        // Highest confidence wins; the earlier candidate wins ties
        candidates.into_iter().reduce(|best, candidate| {
            if candidate.confidence > best.confidence {
                candidate
            } else {
                best
            }
        })
    }
}

impl Default for BridgePlaybook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::detectors::tests::{alternating, hist};

    #[test]
    fn test_one_one_row() {
        let playbook = BridgePlaybook::new();
        let call = playbook.predict_next(&hist("BSBSB")).unwrap();
        assert_eq!(call.side, Outcome::Small);
        assert_eq!(call.confidence, 90);
        assert_eq!(call.pattern, "1-1");
    }

    #[test]
    fn test_full_streak_row() {
        let playbook = BridgePlaybook::new();
        let call = playbook.predict_next(&hist("BBBBB")).unwrap();
        assert_eq!(call.side, Outcome::Big);
        assert_eq!(call.confidence, 92);
    }

    #[test]
    fn test_streak_break_row() {
        let playbook = BridgePlaybook::new();
        let call = playbook.predict_next(&hist("BBBBS")).unwrap();
        assert_eq!(call.side, Outcome::Small);
        assert_eq!(call.confidence, 75);
        assert_eq!(call.pattern, "StreakBreak");
    }

    #[test]
    fn test_duplicate_signature_resolved_by_confidence() {
        // "BSSBB" completes both a 2-2 (Small, 88) and a 3-3 (Big, 86);
        // the higher-confidence row must win
        let playbook = BridgePlaybook::new();
        let call = playbook.predict_next(&hist("BSSBB")).unwrap();
        assert_eq!(call.side, Outcome::Small);
        assert_eq!(call.confidence, 88);
        assert_eq!(call.pattern, "2-2");
    }

    #[test]
    fn test_no_match_waits() {
        let playbook = BridgePlaybook::new();
        assert!(playbook.predict_next(&hist("BSBSS")).is_none());
    }

    #[test]
    fn test_short_history_waits() {
        let playbook = BridgePlaybook::new();
        assert!(playbook.predict_next(&hist("BSB")).is_none());
    }

    #[test]
    fn test_training_floor() {
        let mut playbook = BridgePlaybook::new();
        playbook.train(&alternating(49));
        assert_eq!(playbook.patterns_learned(), 0);
        playbook.train(&alternating(50));
        assert!(playbook.patterns_learned() > 0);
    }

    #[test]
    fn test_learned_statistics_dominate() {
        // A long pure alternation teaches every alternating n-gram a 100%
        // Small continuation, outscoring the 90-confidence 1-1 table row
        let mut playbook = BridgePlaybook::new();
        let h = alternating(60);
        playbook.train(&h);

        let call = playbook.predict_next(&h).unwrap();
        assert_eq!(call.side, Outcome::Small);
        assert_eq!(call.confidence, 100);
        assert_eq!(call.pattern, "Learning");
    }

    #[test]
    fn test_retrain_replaces_stats() {
        let mut playbook = BridgePlaybook::new();
        playbook.train(&alternating(60));
        let learned_first = playbook.patterns_learned();
        playbook.train(&hist(&"B".repeat(60)));
        // Constant history has far fewer distinct n-grams
        assert!(playbook.patterns_learned() < learned_first);
    }
}
