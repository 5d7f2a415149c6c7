use anyhow::Result;
use image::{DynamicImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use moedas::config::{RadiusBounds, TrainingParams};
use moedas::training::Trainer;
use moedas::{CircleDetector, Classification, CoinClassifier, DetectedCircle};
use std::cell::Cell;
use std::rc::Rc;
use std::path::{Path, PathBuf};

pub const BACKGROUND: u8 = 230;
pub const COIN: u8 = 60;

/// Light background with dark filled discs at (x, y, radius)
pub fn coin_scene(width: u32, height: u32, coins: &[(i32, i32, i32)]) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([BACKGROUND; 3]));
    for &(x, y, r) in coins {
        draw_filled_circle_mut(&mut img, (x, y), r, Rgb([COIN; 3]));
    }
    DynamicImage::ImageRgb8(img)
}

/// The three separated coins of distinct sizes used across tests
pub fn three_coin_scene() -> DynamicImage {
    coin_scene(400, 300, &THREE_COINS)
}

pub const THREE_COINS: [(i32, i32, i32); 3] = [(80, 150, 30), (200, 150, 40), (320, 150, 50)];

pub fn blank_scene() -> DynamicImage {
    DynamicImage::ImageLuma8(image::GrayImage::from_pixel(400, 300, Luma([BACKGROUND])))
}

/// Classifier that answers the same thing for every region
pub struct FixedClassifier {
    pub label: String,
    pub confidence: f32,
    /// Shared so tests can read it after the classifier is boxed
    pub calls: Rc<Cell<usize>>,
}

impl FixedClassifier {
    pub fn new(label: &str, confidence: f32) -> Self {
        Self {
            label: label.to_string(),
            confidence,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl CoinClassifier for FixedClassifier {
    fn classify(&self, _region: &DynamicImage) -> Result<Classification> {
        self.calls.set(self.calls.get() + 1);
        Ok(Classification::new(self.label.clone(), self.confidence))
    }
}

/// Classifier that answers from a queue of labels, failing on `"!"`
pub struct ScriptedClassifier {
    pub answers: Vec<(&'static str, f32)>,
    next: Cell<usize>,
}

impl ScriptedClassifier {
    pub fn new(answers: Vec<(&'static str, f32)>) -> Self {
        Self {
            answers,
            next: Cell::new(0),
        }
    }
}

impl CoinClassifier for ScriptedClassifier {
    fn classify(&self, _region: &DynamicImage) -> Result<Classification> {
        let i = self.next.get();
        self.next.set(i + 1);
        let (label, confidence) = self.answers[i % self.answers.len()];
        if label == "!" {
            anyhow::bail!("scripted failure");
        }
        Ok(Classification::new(label, confidence))
    }
}

/// Detector returning a fixed set of circles
pub struct FixedDetector(pub Vec<DetectedCircle>);

impl CircleDetector for FixedDetector {
    fn detect(&self, _img: &DynamicImage, _bounds: RadiusBounds) -> Vec<DetectedCircle> {
        self.0.clone()
    }
}

/// Write `count` dummy image files named `<label>_<i>.jpg` per label
pub fn make_labelled_folder(dir: &Path, classes: &[(&str, usize)]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (label, count) in classes {
        for i in 0..*count {
            std::fs::write(dir.join(format!("{}_{:04}.jpg", label, i)), format!("{} {}", label, i))?;
        }
    }
    Ok(())
}

/// Sorted file names directly inside `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Trainer double that writes placeholder artifacts and records its calls
pub struct FakeTrainer {
    pub workdir: PathBuf,
    pub train_calls: Cell<usize>,
    pub export_calls: Cell<usize>,
    pub fail_training: bool,
}

impl FakeTrainer {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            train_calls: Cell::new(0),
            export_calls: Cell::new(0),
            fail_training: false,
        }
    }
}

impl Trainer for FakeTrainer {
    fn train(&self, data_dir: &Path, _params: &TrainingParams) -> Result<PathBuf> {
        self.train_calls.set(self.train_calls.get() + 1);
        if self.fail_training {
            anyhow::bail!("training crashed");
        }
        assert!(data_dir.join("train").is_dir());
        let weights = self.workdir.join("best.pt");
        std::fs::write(&weights, "weights")?;
        Ok(weights)
    }

    fn export(&self, weights: &Path, _params: &TrainingParams) -> Result<PathBuf> {
        self.export_calls.set(self.export_calls.get() + 1);
        let exported = weights.with_extension("onnx");
        std::fs::write(&exported, "onnx")?;
        Ok(exported)
    }
}
