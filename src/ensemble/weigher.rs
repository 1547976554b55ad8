//! ⚖️ Backtest Weigher
//!
//! Replays every detector over a trailing training window of known outcomes
//! and turns its recent hit/miss record into a confidence score in [0,1].
//! Recent positions weigh more; misses cost 80% of a hit. A detector that
//! never fired in the window scores a neutral 0.5.

use log::debug;

use super::detectors::DetectorKind;
use crate::history::HistoryEntry;

/// Per-cycle backtest record for one detector; never persisted
#[derive(Debug, Clone, Copy)]
pub struct DetectorWeight {
    pub kind: DetectorKind,

    /// Recency-weighted confidence in [0,1]; 0.5 is neutral
    pub score: f64,

    /// Raw hit rate over attempted calls (0.0 when never attempted)
    pub accuracy: f64,

    /// Number of non-abstained calls in the training window
    pub sample_size: u32,
}

/// Number of testable backtest positions for a given target
///
/// Negative or zero means the training window is too small to weigh and the
/// caller should take its documented baseline path.
pub fn testable_positions(history_len: usize, target: isize, train_window: usize) -> isize {
    let train_start = target + 1;
    (history_len as isize - train_start - 2).min(train_window as isize)
}

/// Backtest a single detector over `test_range` positions after the target
pub fn weigh(
    history: &[HistoryEntry],
    target: isize,
    kind: DetectorKind,
    test_range: isize,
    recency_decay: f64,
    miss_penalty: f64,
) -> DetectorWeight {
    let train_start = target + 1;
    let mut correct = 0u32;
    let mut attempted = 0u32;
    let mut weighted_score = 0.0f64;

    let mut i = train_start;
    while i < train_start + test_range {
        if let Some(candidate) = kind.evaluate(history, i) {
            attempted += 1;
            let recency = 1.0 / (1.0 + (i - train_start) as f64 * recency_decay);
            if candidate.side == history[i as usize].size {
                correct += 1;
                weighted_score += recency;
            } else {
                weighted_score -= recency * miss_penalty;
            }
        }
        i += 1;
    }

    let score = if attempted > 0 {
        (0.5 + weighted_score / f64::from(attempted)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let accuracy = if attempted > 0 {
        f64::from(correct) / f64::from(attempted)
    } else {
        0.0
    };

    debug!(
        "⚖️ {} backtest: score={:.3} acc={:.2} n={}",
        kind.as_str(),
        score,
        accuracy,
        attempted
    );

    DetectorWeight {
        kind,
        score,
        accuracy,
        sample_size: attempted,
    }
}

/// Backtest the whole registry, in registry order
pub fn weigh_all(
    history: &[HistoryEntry],
    target: isize,
    test_range: isize,
    recency_decay: f64,
    miss_penalty: f64,
) -> Vec<DetectorWeight> {
    DetectorKind::ALL
        .iter()
        .map(|&kind| weigh(history, target, kind, test_range, recency_decay, miss_penalty))
        .collect()
}
