pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod training;

pub use detection::{CircleDetector, CoinClassifier, CoinCounter};
pub use detection::circles::HoughCircleDetector;
pub use detection::classifier::OnnxCoinClassifier;
pub use error::Error;
pub use models::{
    Classification, CoinObservation, ConfidenceTier, CountResult, Denomination, DetectedCircle,
};
pub use pipeline::{load_image, process_image};
pub use training::{Trainer, TrainingJob, YoloCli, run_training};
