//! 🗳️ Vote Aggregator
//!
//! Combines detector candidates, gated by their backtested scores, into a
//! single weighted vote between Big and Small with an integer confidence.
//! The same routine serves the live frontier (target -1) and retroactive
//! scoring of historical positions.

use log::debug;
use serde::Serialize;

use super::detectors::DetectorKind;
use super::entropy::{self, EntropyReading};
use super::projector;
use super::weigher::{self, DetectorWeight};
use crate::history::{HistoryEntry, Outcome};

/// Ensemble tuning knobs. The defaults are the tuned production values;
/// the tests assume them.
#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    /// Minimum history length before any prediction is attempted
    pub min_history: usize,

    /// Backtest score a detector must reach to vote (inclusive)
    pub score_threshold: f64,

    /// Maximum number of backtest positions per detector
    pub train_window: usize,

    /// Per-position decay of the backtest recency weight
    pub recency_decay: f64,

    /// Fraction of the recency weight lost on an incorrect call
    pub miss_penalty: f64,

    /// Vote impact is score raised to this power
    pub impact_exponent: i32,

    /// Extra impact multiplier for the Symmetry detector
    pub symmetry_boost: f64,

    /// Steps of speculative path projection on live predictions
    pub projection_steps: usize,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            min_history: 5,
            score_threshold: 0.52,
            train_window: 1000,
            recency_decay: 0.02,
            miss_penalty: 0.8,
            impact_exponent: 4,
            symmetry_boost: 2.0,
            projection_steps: 5,
        }
    }
}

/// The engine's output for one evaluation cycle; immutable once returned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Winning side (vote ties resolve to Small)
    pub side: Outcome,

    /// Final confidence, 0-99
    pub confidence: u8,

    /// Name of the highest-scoring contributing detector
    pub best_detector: String,

    /// That detector's backtested score
    pub best_score: f64,

    /// Human-readable reasoning from the best detector
    pub reason: String,

    /// Evidence count from the best detector's candidate
    pub occurrences: u32,

    /// Per-contributor breakdown: name, score percent, occurrence count
    pub details: String,

    /// Speculative multi-step forecast (live predictions only)
    pub projected_path: Vec<Outcome>,
}

/// Stateless prediction ensemble over a history snapshot
#[derive(Debug, Default, Clone)]
pub struct Ensemble {
    config: EnsembleConfig,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EnsembleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Live prediction for the next, not-yet-occurred round
    pub fn predict(&self, history: &[HistoryEntry]) -> Option<Prediction> {
        self.run(history, -1, true)
    }

    /// Retroactive prediction for the round at `target` (newest-first index;
    /// -1 is the live frontier). Used for self-scoring and displays.
    pub fn evaluate(&self, history: &[HistoryEntry], target: isize) -> Option<Prediction> {
        self.run(history, target, true)
    }

    pub(crate) fn run(
        &self,
        history: &[HistoryEntry],
        target: isize,
        project: bool,
    ) -> Option<Prediction> {
        if history.len() < self.config.min_history {
            return None;
        }

        let test_range =
            weigher::testable_positions(history.len(), target, self.config.train_window);
        if test_range < 1 {
            // Documented shortcut: too little history to weigh, so the first
            // non-abstaining detector answers at baseline confidence.
            return self.baseline(history, target);
        }

        let weights = weigher::weigh_all(
            history,
            target,
            test_range,
            self.config.recency_decay,
            self.config.miss_penalty,
        );
        let reading = entropy::estimate(history, target + 1);

        let mut prediction = self.aggregate(history, target, &weights, reading)?;
        if project && target == -1 {
            prediction.projected_path =
                projector::project_path(self, history, self.config.projection_steps);
        }
        Some(prediction)
    }

    fn baseline(&self, history: &[HistoryEntry], target: isize) -> Option<Prediction> {
        for kind in DetectorKind::ALL {
            if let Some(candidate) = kind.evaluate(history, target) {
                return Some(Prediction {
                    side: candidate.side,
                    confidence: 51,
                    best_detector: kind.as_str().to_string(),
                    best_score: 0.0,
                    reason: candidate
                        .reason
                        .unwrap_or_else(|| kind.default_reason().to_string()),
                    occurrences: candidate.occurrences,
                    details: "Baseline".to_string(),
                    projected_path: Vec::new(),
                });
            }
        }
        None
    }

    /// Fold gated detector candidates into the final weighted vote.
    ///
    /// Public with injected weights so the gate and tie-break semantics are
    /// directly testable.
    pub fn aggregate(
        &self,
        history: &[HistoryEntry],
        target: isize,
        weights: &[DetectorWeight],
        reading: EntropyReading,
    ) -> Option<Prediction> {
        let mut big_vote = 0.0f64;
        let mut small_vote = 0.0f64;
        let mut details = String::new();
        let mut best: Option<(DetectorKind, f64, super::detectors::Candidate)> = None;

        for weight in weights {
            if weight.score < self.config.score_threshold {
                continue;
            }
            let Some(candidate) = weight.kind.evaluate(history, target) else {
                continue;
            };

            let mut impact = weight.score.powi(self.config.impact_exponent);
            if weight.kind == DetectorKind::Symmetry {
                // Motif matches are trusted more than statistical detectors
                impact *= self.config.symmetry_boost;
            }
            match candidate.side {
                Outcome::Big => big_vote += impact,
                Outcome::Small => small_vote += impact,
            }

            details.push_str(&format!(
                "{}({}%)",
                weight.kind.as_str(),
                (weight.score * 100.0).round()
            ));
            if candidate.occurrences > 0 {
                details.push_str(&format!("[{}]", candidate.occurrences));
            }
            details.push_str("; ");

            if best.as_ref().map_or(true, |(_, s, _)| weight.score > *s) {
                best = Some((weight.kind, weight.score, candidate));
            }
        }

        if big_vote == 0.0 && small_vote == 0.0 {
            return self.fallback(history, target, weights);
        }

        let total = big_vote + small_vote;
        let conf_ratio = big_vote.max(small_vote) / total;
        let mut final_conf = 52.0 + conf_ratio * 48.0;
        final_conf *= 0.65 + reading.chaos_factor * 0.35;

        let (best_kind, best_score, candidate) = best?;
        let prediction = Prediction {
            side: if big_vote > small_vote {
                Outcome::Big
            } else {
                Outcome::Small
            },
            confidence: final_conf.min(99.0).round() as u8,
            best_detector: best_kind.as_str().to_string(),
            best_score,
            reason: candidate
                .reason
                .unwrap_or_else(|| best_kind.default_reason().to_string()),
            occurrences: candidate.occurrences,
            details,
            projected_path: Vec::new(),
        };

        debug!(
            "🗳️ votes big={:.3} small={:.3} chaos={:.2} → {} ({}%)",
            big_vote,
            small_vote,
            reading.chaos_factor,
            prediction.side.as_str(),
            prediction.confidence
        );
        Some(prediction)
    }

    /// No detector cleared the gate: fall back to the single best raw score
    /// among all non-abstaining detectors at a flat 50% confidence
    fn fallback(
        &self,
        history: &[HistoryEntry],
        target: isize,
        weights: &[DetectorWeight],
    ) -> Option<Prediction> {
        let mut best_any = -1.0f64;
        let mut fallback: Option<(DetectorKind, super::detectors::Candidate)> = None;
        for weight in weights {
            if let Some(candidate) = weight.kind.evaluate(history, target) {
                if weight.score > best_any {
                    best_any = weight.score;
                    fallback = Some((weight.kind, candidate));
                }
            }
        }

        let (kind, candidate) = fallback?;
        Some(Prediction {
            side: candidate.side,
            confidence: 50,
            best_detector: kind.as_str().to_string(),
            best_score: best_any,
            reason: candidate
                .reason
                .unwrap_or_else(|| kind.default_reason().to_string()),
            occurrences: candidate.occurrences,
            details: "Fallback".to_string(),
            projected_path: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::detectors::tests::{alternating, hist};

    fn flat_weights(score: f64) -> Vec<DetectorWeight> {
        DetectorKind::ALL
            .iter()
            .map(|&kind| DetectorWeight {
                kind,
                score,
                accuracy: 0.0,
                sample_size: 0,
            })
            .collect()
    }

    fn set_score(weights: &mut [DetectorWeight], kind: DetectorKind, score: f64) {
        for w in weights.iter_mut() {
            if w.kind == kind {
                w.score = score;
            }
        }
    }

    fn neutral_reading() -> EntropyReading {
        EntropyReading {
            entropy: 0.5,
            chaos_factor: 1.0,
        }
    }

    #[test]
    fn test_predict_requires_min_history() {
        let ensemble = Ensemble::new();
        assert!(ensemble.predict(&[]).is_none());
        assert!(ensemble.predict(&alternating(4)).is_none());
        assert!(ensemble.predict(&alternating(5)).is_some());
    }

    #[test]
    fn test_predict_is_deterministic() {
        let ensemble = Ensemble::new();
        let h = alternating(30);
        let first = ensemble.predict(&h).unwrap();
        let second = ensemble.predict(&h).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_alternating_history() {
        // Pure alternation ending on Big: the alternation-following
        // detectors all backtest perfectly and vote Small
        let ensemble = Ensemble::new();
        let h = alternating(30);
        let p = ensemble.predict(&h).unwrap();

        assert_eq!(p.side, Outcome::Small);
        assert!(p.confidence >= 80, "confidence {} < 80", p.confidence);
        assert_eq!(p.best_detector, "ZigZag");
        assert!(p.details.contains("ZigZag(100%)"));
        assert!(p.details.contains("Mirror(100%)"));
        // Speculative path keeps alternating
        assert_eq!(p.projected_path.len(), 5);
        assert_eq!(
            p.projected_path,
            vec![
                Outcome::Small,
                Outcome::Big,
                Outcome::Small,
                Outcome::Big,
                Outcome::Small
            ]
        );
    }

    #[test]
    fn test_score_gate_includes_exact_threshold() {
        let ensemble = Ensemble::new();
        let h = alternating(30);
        let mut weights = flat_weights(0.0);
        set_score(&mut weights, DetectorKind::ZigZag, 0.52);

        let p = ensemble
            .aggregate(&h, -1, &weights, neutral_reading())
            .unwrap();
        assert_eq!(p.best_detector, "ZigZag");
        assert_eq!(p.side, Outcome::Small);
        assert!(p.details.contains("ZigZag(52%)"));
        assert_ne!(p.details, "Fallback");
    }

    #[test]
    fn test_score_gate_excludes_just_below_threshold() {
        let ensemble = Ensemble::new();
        let h = alternating(30);
        let mut weights = flat_weights(0.0);
        set_score(&mut weights, DetectorKind::ZigZag, 0.5199);

        // Nothing clears the gate, so the fallback path answers at 50
        let p = ensemble
            .aggregate(&h, -1, &weights, neutral_reading())
            .unwrap();
        assert_eq!(p.confidence, 50);
        assert_eq!(p.details, "Fallback");
        assert_eq!(p.best_detector, "ZigZag");
        assert!((p.best_score - 0.5199).abs() < 1e-12);
    }

    #[test]
    fn test_fallback_fires_at_exactly_fifty() {
        let ensemble = Ensemble::new();
        let h = alternating(30);
        let weights = flat_weights(0.5);

        let p = ensemble
            .aggregate(&h, -1, &weights, neutral_reading())
            .unwrap();
        assert_eq!(p.confidence, 50);
        assert_eq!(p.details, "Fallback");
    }

    #[test]
    fn test_equal_nonzero_votes_resolve_to_small() {
        // Streak votes Big (run of 2), Frequency votes Small (20% Big);
        // identical scores give identical impacts
        let ensemble = Ensemble::new();
        let h = hist("BBSSSSSSSS");
        let mut weights = flat_weights(0.0);
        set_score(&mut weights, DetectorKind::Streak, 0.8);
        set_score(&mut weights, DetectorKind::Frequency, 0.8);

        let p = ensemble
            .aggregate(&h, -1, &weights, neutral_reading())
            .unwrap();
        assert_eq!(p.side, Outcome::Small);
        // Tie on score resolves to the earlier registry entry
        assert_eq!(p.best_detector, "Streak");
    }

    #[test]
    fn test_symmetry_impact_doubled() {
        // Symmetry rides the 1-1 motif to Big while Mirror echoes Small.
        // At equal scores their impacts would tie (and resolve Small); the
        // Symmetry boost must tip the vote to Big.
        let ensemble = Ensemble::new();
        let h = alternating(10);
        let mut weights = flat_weights(0.0);
        set_score(&mut weights, DetectorKind::Symmetry, 0.8);
        set_score(&mut weights, DetectorKind::Mirror, 0.8);

        let p = ensemble
            .aggregate(&h, -1, &weights, neutral_reading())
            .unwrap();
        assert_eq!(p.side, Outcome::Big);
    }

    #[test]
    fn test_baseline_when_window_too_small() {
        // Target near the oldest entries leaves no testable positions
        let ensemble = Ensemble::new();
        let h = alternating(30);
        let p = ensemble.evaluate(&h, 27).unwrap();
        assert_eq!(p.confidence, 51);
        assert_eq!(p.details, "Baseline");
    }

    #[test]
    fn test_evaluate_at_oldest_position_returns_none() {
        // At the very oldest position every detector abstains
        let ensemble = Ensemble::new();
        let h = alternating(30);
        assert!(ensemble.evaluate(&h, 29).is_none());
    }

    #[test]
    fn test_confidence_bounds() {
        let ensemble = Ensemble::new();
        let h = hist("BBSBBSSSBBBSSBSBSSBBBBSSBSBBSSSBSBBBSSSBSBBSBBSSBBSSSBBSBSSB");
        for target in -1..20isize {
            if let Some(p) = ensemble.evaluate(&h, target) {
                assert!(p.confidence <= 99);
                if p.details != "Baseline" && p.details != "Fallback" {
                    // 52 * 0.65 is the floor after maximal chaos damping
                    assert!(p.confidence >= 34, "confidence {} too low", p.confidence);
                }
            }
        }
    }

    #[test]
    fn test_evaluate_matches_known_outcome_shape() {
        // Retroactive evaluation must never read the target entry itself:
        // corrupting it leaves the prediction unchanged
        let ensemble = Ensemble::new();
        let mut h = alternating(40);
        let before = ensemble.evaluate(&h, 5);
        h[5] = crate::history::HistoryEntry::from_number(h[5].issue_id, 9);
        let after = ensemble.evaluate(&h, 5);
        assert_eq!(before, after);
    }
}
