//! 🧠 Prediction Engine Service
//!
//! Polls resolved rounds from the configured source, re-scores the detector
//! ensemble against the rolling history, and emits one prediction per new
//! round to the sinks (application log + CSV prediction log), scoring every
//! prediction against the round that eventually resolves it.
//!
//! ## Architecture
//! - Round source: simulated feed standing in for the upstream game API
//! - History store: single-writer, mutex-guarded append path
//! - Ensemble: stateless, recomputed per cycle over a snapshot
//! - Sinks: log sink (JSON payload) + CSV prediction log
//! - Accuracy tracker: per-issue hit/miss self-check

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use prediction_engine::accuracy::AccuracyTracker;
use prediction_engine::config::Config;
use prediction_engine::ensemble::{
    entropy, BridgePlaybook, Ensemble, PredictionLogEntry, PredictionLogger,
};
use prediction_engine::feed::{LogSink, PredictionSink, RoundSource, SimulatedFeed};
use prediction_engine::history::HistoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so the log filter can honor it
    dotenv::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.log_level.as_str()),
    )
    .init();

    print_banner(&config);

    // Prediction log (CSV)
    if let Some(parent) = config.logging.prediction_log_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    let logger = PredictionLogger::new(&config.logging.prediction_log_path)?;

    // History store: the only shared mutable state; appends are serialized
    // behind this mutex (single-writer discipline)
    let store = Arc::new(Mutex::new(HistoryStore::with_capacity(
        config.runner.history_capacity,
    )));

    let ensemble = Ensemble::with_config(config.ensemble_config());
    let mut playbook = BridgePlaybook::new();
    let mut accuracy = AccuracyTracker::new(config.runner.accuracy_window);
    let mut source = SimulatedFeed::new(
        config.runner.sim_seed,
        config.runner.sim_start_issue,
        config.runner.sim_backfill,
    );
    let mut sink = LogSink::new();
    info!("✅ Engine ready, entering polling loop");

    let mut interval = tokio::time::interval(Duration::from_millis(config.runner.poll_interval_ms));
    let mut predictions_emitted = 0u64;
    let mut last_processed_issue = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Interrupt received, shutting down");
                break;
            }
            _ = interval.tick() => {}
        }

        let batch = match source.poll() {
            Ok(batch) => batch,
            Err(e) => {
                warn!("⚠️  Source poll failed: {:#}", e);
                continue;
            }
        };

        // Ingest oldest-first so the store grows in order; score any
        // pending prediction as its round resolves
        let snapshot = {
            let mut store = store.lock().unwrap();
            for entry in batch.iter().rev() {
                if store.append(*entry) {
                    let _ = accuracy.resolve(entry);
                }
            }
            store.entries().to_vec()
        };

        // Only react to a genuinely new result, like the upstream poller
        let Some(latest) = snapshot.first().copied() else {
            continue;
        };
        if latest.issue_id == last_processed_issue {
            continue;
        }
        last_processed_issue = latest.issue_id;

        let next_issue = latest.issue_id + 1;
        playbook.train(&snapshot);

        match ensemble.predict(&snapshot) {
            Some(prediction) => {
                accuracy.record_prediction(next_issue, prediction.side);

                let reading = entropy::estimate(&snapshot, 0);
                logger.log_prediction(PredictionLogEntry::from_prediction(
                    next_issue,
                    reading.entropy,
                    &prediction,
                ))?;
                sink.publish(next_issue, &prediction)?;

                if let Some(call) = playbook.predict_next(&snapshot) {
                    debug!(
                        "📖 Playbook cross-check: {} ({}%) — {}{}",
                        call.side.as_str(),
                        call.confidence,
                        call.reason,
                        if call.side != prediction.side {
                            " [disagrees with ensemble]"
                        } else {
                            ""
                        }
                    );
                }

                predictions_emitted += 1;
                if predictions_emitted % config.runner.summary_every == 0 {
                    info!("🎯 Accuracy: {}", accuracy.summary());
                }
                if config.runner.max_predictions > 0
                    && predictions_emitted >= config.runner.max_predictions
                {
                    info!("🏁 Reached {} predictions, stopping", predictions_emitted);
                    break;
                }
            }
            None => {
                debug!("⏳ Not enough history yet ({} rounds)", snapshot.len());
            }
        }
    }

    info!("🎯 Final accuracy: {}", accuracy.summary());
    info!("📝 Predictions logged: {}", logger.entries_logged());
    Ok(())
}

fn print_banner(config: &Config) {
    println!("\n======================================================================");
    println!("🧠 PREDICTION ENGINE - BIG/SMALL ENSEMBLE FORECASTER");
    println!("======================================================================");
    println!("⏰ {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("⚖️  Score gate: {:.2}", config.engine.score_threshold);
    println!("📊 Train window: {} positions", config.engine.train_window);
    println!("🔮 Projection: {} steps", config.engine.projection_steps);
    println!("📝 Prediction log: {}", config.logging.prediction_log_path.display());
    println!("🔍 Status: POLLING FOR RESULTS...");
    println!("======================================================================\n");
}
