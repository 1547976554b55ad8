//! 🧠 Prediction Engine
//!
//! Ensemble forecaster for a binary Big/Small round game: a library of
//! independent pattern detectors, scored by recency-weighted backtests over
//! rolling history and combined by a gated weighted vote into a single
//! prediction with an integer confidence. The outcomes being predicted are
//! independent random draws, so the forecasts carry no real edge; the crate
//! implements the mechanism, not a claim about the game.
//!
//! ## Architecture
//! - History Store: newest-first, deduplicated round history
//! - Detectors: eleven stateless heuristics over a history snapshot
//! - Backtest Weigher: recency-weighted per-detector confidence
//! - Entropy Estimator: chaos damping for choppy regimes
//! - Vote Aggregator: gated weighted vote → `Prediction`
//! - Path Projector: speculative multi-step self-feeding forecast
//! - Bridge Playbook: independent quick-pattern cross-check
//! - Feed seams: `RoundSource` in, `PredictionSink` out

pub mod accuracy;
pub mod config;
pub mod ensemble;
pub mod feed;
pub mod history;

// Re-export the core surface
pub use ensemble::{Ensemble, EnsembleConfig, Prediction};
pub use history::{HistoryEntry, HistoryStore, Outcome, Parity};
