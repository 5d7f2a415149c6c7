mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from moedas for tests
pub use moedas::config::{CountingParams, RadiusBounds, SplitParams, TrainingParams};
pub use moedas::{
    CircleDetector, Classification, CoinClassifier, CoinCounter, CountResult, Denomination,
    DetectedCircle, HoughCircleDetector,
};
