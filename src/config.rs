use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/moedas_classifier.onnx";
pub const DEFAULT_CLASSES_PATH: &str = "models/classes.txt";
pub const DEFAULT_OUTPUT_PATH: &str = "resultado.jpg";

/// File name of the exported classifier inside the export folder
pub const EXPORTED_MODEL_NAME: &str = "moedas_classifier.onnx";
/// File name of the class manifest inside the export folder
pub const CLASS_MANIFEST_NAME: &str = "classes.txt";

/// Radius range accepted by the circle detector, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadiusBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for RadiusBounds {
    fn default() -> Self {
        Self { min: 20, max: 200 }
    }
}

/// Fixed parameters of the gradient Hough circle detector
#[derive(Debug, Clone)]
pub struct HoughParams {
    /// Gaussian sigma applied before edge detection
    pub blur_sigma: f32,
    /// Upper Canny threshold; the lower one is half of it
    pub canny_threshold: f32,
    /// Minimum votes for a center, and minimum edge support for its radius
    pub accumulator_threshold: u32,
    /// Minimum distance between accepted centers
    pub min_center_distance: f32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            canny_threshold: 100.0,
            accumulator_threshold: 30,
            min_center_distance: 50.0,
        }
    }
}

/// Parameters of one counting run
#[derive(Debug, Clone)]
pub struct CountingParams {
    pub radius: RadiusBounds,
    /// Side of the square classifier window as a multiple of the coin radius.
    /// `None` classifies the full normalized image.
    pub crop_factor: Option<f32>,
}

impl Default for CountingParams {
    fn default() -> Self {
        Self {
            radius: RadiusBounds::default(),
            crop_factor: Some(4.0),
        }
    }
}

/// Train/validation split settings
#[derive(Debug, Clone)]
pub struct SplitParams {
    pub val_fraction: f64,
    pub seed: u64,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            val_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Hyperparameters handed to the external trainer
#[derive(Debug, Clone)]
pub struct TrainingParams {
    pub epochs: u32,
    pub image_size: u32,
    pub batch_size: u32,
    pub learning_rate: f64,
    /// Folder the trainer writes its runs into
    pub project: PathBuf,
    /// Run name inside `project`
    pub run_name: String,
    pub base_model: String,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: 30,
            image_size: 224,
            batch_size: 16,
            learning_rate: 0.01,
            project: PathBuf::from("runs"),
            run_name: "moedas_cls".to_string(),
            base_model: "yolov8n-cls.pt".to_string(),
        }
    }
}

impl TrainingParams {
    /// Where the trainer leaves the best checkpoint of this run
    pub fn best_weights_path(&self) -> PathBuf {
        self.project
            .join(&self.run_name)
            .join("weights")
            .join("best.pt")
    }
}
