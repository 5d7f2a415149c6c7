pub mod preprocessing;
pub mod circles;
pub mod normalize;
pub mod classifier;

use anyhow::Result;
use image::DynamicImage;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::{CountingParams, RadiusBounds};
use crate::error::Error;
use crate::models::{Classification, CoinObservation, CountResult, Denomination, DetectedCircle};

/// Finds circle candidates in an image
pub trait CircleDetector {
    /// Candidates within `bounds`, strongest first; empty if none found
    fn detect(&self, img: &DynamicImage, bounds: RadiusBounds) -> Vec<DetectedCircle>;
}

/// Assigns a label to a prepared coin region
pub trait CoinClassifier {
    /// Top-1 label and its confidence in [0, 1]
    fn classify(&self, region: &DynamicImage) -> Result<Classification>;
}

/// Counting pipeline orchestrator: detect, normalize, classify
pub struct CoinCounter {
    detector: Box<dyn CircleDetector>,
    classifier: Box<dyn CoinClassifier>,
    pub params: CountingParams,
    debug_dir: Option<PathBuf>,
}

impl CoinCounter {
    pub fn new(detector: Box<dyn CircleDetector>, classifier: Box<dyn CoinClassifier>) -> Self {
        Self {
            detector,
            classifier,
            params: CountingParams::default(),
            debug_dir: None,
        }
    }

    pub fn with_params(mut self, params: CountingParams) -> Self {
        self.params = params;
        self
    }

    /// Save every prepared coin region to `output_dir`.
    /// The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self, Error> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(Error::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug_dir = Some(output_dir);
        Ok(self)
    }

    /// Detect and classify every coin in `img`.
    ///
    /// Returns `Ok(None)` when no circle is found. A coin whose classification
    /// fails is reported and left out of the result.
    pub fn count(&self, img: &DynamicImage) -> Result<Option<CountResult>> {
        info!("[1/2] Detecting coins (Hough circles)...");
        let circles = self.detector.detect(img, self.params.radius);
        info!("      {} circles detected", circles.len());

        if circles.is_empty() {
            warn!("No coins detected");
            return Ok(None);
        }

        info!("[2/2] Classifying coins...");
        let mut observations = Vec::with_capacity(circles.len());

        for (i, circle) in circles.iter().enumerate() {
            let region = self.prepare_region(img, circle);
            self.save_debug_region(&region, i)?;

            match self.classifier.classify(&region) {
                Ok(classification) => {
                    let observation = CoinObservation::new(*circle, classification);
                    let (x, y) = circle.center();
                    info!(
                        "      Moeda em ({}, {}): {} (confiança: {:.1}%)",
                        x,
                        y,
                        observation.name(),
                        observation.confidence * 100.0
                    );
                    if observation.denomination == Denomination::Unknown {
                        debug!("      Unrecognized label '{}'", observation.label);
                    }
                    observations.push(observation);
                }
                Err(e) => {
                    warn!("      Classification failed for circle {}: {}", i + 1, e);
                }
            }
        }

        Ok(Some(CountResult::new(observations)))
    }

    /// Gray background outside the coin, then the optional square window
    fn prepare_region(&self, img: &DynamicImage, circle: &DetectedCircle) -> DynamicImage {
        let normalized = normalize::normalize_region(img, circle);
        let prepared = match self.params.crop_factor {
            Some(factor) if factor > 0.0 => normalize::crop_coin_window(&normalized, circle, factor),
            _ => normalized,
        };
        DynamicImage::ImageRgb8(prepared)
    }

    fn save_debug_region(&self, region: &DynamicImage, index: usize) -> Result<()> {
        if let Some(dir) = &self.debug_dir {
            let path = dir.join(format!("{:02}.png", index + 1));
            region
                .save(&path)
                .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
            debug!("  Debug: saved {}", path.display());
        }
        Ok(())
    }
}
