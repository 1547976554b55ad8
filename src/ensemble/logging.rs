//! 📝 Prediction Logging
//!
//! Append-only CSV record of every emitted prediction, for offline accuracy
//! analysis. One row per evaluation cycle: target issue, side, confidence,
//! best detector and its score, chaos reading, contributor breakdown, and
//! the speculative path.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::info;

use super::aggregator::Prediction;

/// One CSV row of the prediction log
#[derive(Debug, Clone)]
pub struct PredictionLogEntry {
    pub prediction_id: u64,
    pub timestamp: u64,

    /// Issue the prediction targets (the upcoming round)
    pub issue_id: u64,

    pub side: String,
    pub confidence: u8,
    pub best_detector: String,
    pub best_score: f64,
    pub occurrences: u32,
    pub entropy: f64,
    pub details: String,
    pub projected_path: String,
}

impl PredictionLogEntry {
    /// Build a row from a prediction (id is assigned by the logger)
    pub fn from_prediction(issue_id: u64, entropy: f64, prediction: &Prediction) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            prediction_id: 0,
            timestamp,
            issue_id,
            side: prediction.side.as_str().to_string(),
            confidence: prediction.confidence,
            best_detector: prediction.best_detector.clone(),
            best_score: prediction.best_score,
            occurrences: prediction.occurrences,
            entropy,
            details: prediction.details.clone(),
            projected_path: prediction
                .projected_path
                .iter()
                .map(|o| o.code().to_string())
                .collect::<Vec<_>>()
                .join("-"),
        }
    }

    /// Convert to CSV row
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{:.4},{},{:.3},\"{}\",{},{}",
            self.prediction_id,
            self.timestamp,
            self.issue_id,
            self.side,
            self.confidence,
            self.best_detector,
            self.best_score,
            self.occurrences,
            self.entropy,
            self.details,
            self.projected_path,
            chrono::DateTime::from_timestamp(self.timestamp as i64, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default()
        )
    }

    /// CSV header
    pub fn csv_header() -> &'static str {
        "prediction_id,timestamp,issue_id,side,confidence,best_detector,best_score,occurrences,entropy,details,projected_path,datetime"
    }
}

/// Prediction logger that appends to a CSV file
pub struct PredictionLogger {
    log_file: Arc<Mutex<File>>,
    prediction_counter: Arc<Mutex<u64>>,
    entries_logged: Arc<Mutex<u64>>,
}

impl PredictionLogger {
    /// Create new prediction logger
    ///
    /// If the log file doesn't exist, it will be created with a CSV header.
    /// If it exists, new entries will be appended.
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self> {
        let path = log_path.as_ref();
        let file_exists = path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(format!("Failed to open prediction log: {:?}", path))?;

        if !file_exists {
            writeln!(file, "{}", PredictionLogEntry::csv_header())
                .context("Failed to write CSV header")?;
            file.flush()?;
            info!("📝 Created new prediction log: {:?}", path);
        } else {
            info!("📝 Opened existing prediction log: {:?}", path);
        }

        Ok(Self {
            log_file: Arc::new(Mutex::new(file)),
            prediction_counter: Arc::new(Mutex::new(1)),
            entries_logged: Arc::new(Mutex::new(0)),
        })
    }

    /// Log one emitted prediction, returning its assigned id
    pub fn log_prediction(&self, mut entry: PredictionLogEntry) -> Result<u64> {
        let prediction_id = {
            let mut counter = self.prediction_counter.lock().unwrap();
            let id = *counter;
            *counter += 1;
            id
        };
        entry.prediction_id = prediction_id;

        {
            let mut file = self.log_file.lock().unwrap();
            writeln!(file, "{}", entry.to_csv_row()).context("Failed to write log entry")?;
            file.flush()?;
        }

        {
            let mut count = self.entries_logged.lock().unwrap();
            *count += 1;
        }

        Ok(prediction_id)
    }

    /// Get total number of logged entries
    pub fn entries_logged(&self) -> u64 {
        *self.entries_logged.lock().unwrap()
    }
}
