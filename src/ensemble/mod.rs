pub mod detectors;
pub mod weigher;
pub mod entropy;
pub mod aggregator;
pub mod projector;
pub mod playbook;
pub mod logging;

// Re-export main types for convenience
pub use detectors::{Candidate, DetectorKind};
pub use weigher::DetectorWeight;
pub use entropy::EntropyReading;
pub use aggregator::{Ensemble, EnsembleConfig, Prediction};
pub use playbook::{BridgePlaybook, PlaybookCall};
pub use logging::{PredictionLogEntry, PredictionLogger};

// Type alias for easier use in main.rs
pub type Engine = Ensemble;
