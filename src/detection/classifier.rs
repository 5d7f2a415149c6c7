use anyhow::{Result, anyhow};
use image::DynamicImage;
use image::imageops::FilterType;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::detection::CoinClassifier;
use crate::error::Error;
use crate::models::Classification;

/// Class order the trainer assigns to label folders (sorted by name)
pub const DEFAULT_CLASS_NAMES: [&str; 5] = ["10", "100", "25", "5", "50"];

/// Read a class manifest: one label per line, line index = class index
pub fn load_class_names(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Load the class manifest, or fall back to the default class order
pub fn class_names_or_default(path: &Path) -> Vec<String> {
    match load_class_names(path) {
        Ok(names) if !names.is_empty() => {
            info!("Classes loaded from {}: {}", path.display(), names.join(", "));
            names
        }
        Ok(_) => {
            warn!("Class manifest {} is empty, using default order", path.display());
            DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect()
        }
        Err(e) => {
            warn!("Could not read class manifest {}: {}; using default order", path.display(), e);
            DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect()
        }
    }
}

/// Image classifier exported to ONNX by the training driver, run with rten
pub struct OnnxCoinClassifier {
    model: Model,
    class_names: Vec<String>,
    input_size: u32,
}

impl OnnxCoinClassifier {
    /// Load the model once; the handle is read-only afterwards
    pub fn load(model_path: &Path, class_names: Vec<String>, input_size: u32) -> Result<Self, Error> {
        if !model_path.exists() {
            return Err(Error::ModelLoad {
                path: model_path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        let model = Model::load_file(model_path).map_err(|e| Error::ModelLoad {
            path: PathBuf::from(model_path),
            reason: e.to_string(),
        })?;

        info!("Model loaded: {}", model_path.display());
        debug!(
            "Class index order: {}",
            class_names
                .iter()
                .enumerate()
                .map(|(i, name)| format!("[{}]={}", i, name))
                .collect::<Vec<_>>()
                .join(" ")
        );

        Ok(Self {
            model,
            class_names,
            input_size,
        })
    }
}

impl CoinClassifier for OnnxCoinClassifier {
    fn classify(&self, region: &DynamicImage) -> Result<Classification> {
        let input = to_input_tensor(region, self.input_size);

        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| anyhow!("Inference failed: {}", e))?;
        let scores: NdTensor<f32, 2> = output
            .try_into()
            .map_err(|e| anyhow!("Unexpected model output: {}", e))?;

        let probabilities = to_probabilities(scores.iter().copied().collect());
        debug!("Raw output: {:?}", probabilities);

        let (index, confidence) = top1(&probabilities)
            .ok_or_else(|| anyhow!("Model produced no class scores"))?;
        Ok(Classification::new(label_for_index(&self.class_names, index), confidence))
    }
}

/// Resize to `size`², scale to [0, 1] and lay out as NCHW RGB
pub fn to_input_tensor(region: &DynamicImage, size: u32) -> NdTensor<f32, 4> {
    let resized = region
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgb8();

    let plane = (size * size) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * size + x) as usize;
        for channel in 0..3 {
            data[channel * plane + offset] = pixel[channel] as f32 / 255.0;
        }
    }

    NdTensor::from_data([1, 3, size as usize, size as usize], data)
}

/// Manifest label for a class index; the index itself when the manifest is short
pub fn label_for_index(class_names: &[String], index: usize) -> String {
    class_names
        .get(index)
        .cloned()
        .unwrap_or_else(|| index.to_string())
}

/// Softmax unless the scores already form a probability distribution
fn to_probabilities(scores: Vec<f32>) -> Vec<f32> {
    let sum: f32 = scores.iter().sum();
    let in_range = scores.iter().all(|s| (0.0..=1.0).contains(s));
    if in_range && (sum - 1.0).abs() < 1e-3 {
        return scores;
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn top1(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((i, p)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn probabilities_pass_through() {
        let probs = to_probabilities(vec![0.1, 0.7, 0.2]);
        assert_eq!(probs, vec![0.1, 0.7, 0.2]);
    }

    #[test]
    fn logits_are_softmaxed() {
        let probs = to_probabilities(vec![2.0, 0.0, -1.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }

    #[test]
    fn top1_prefers_first_on_tie() {
        assert_eq!(top1(&[0.4, 0.4, 0.2]), Some((0, 0.4)));
        assert_eq!(top1(&[]), None);
    }

    #[test]
    fn input_tensor_is_nchw_rgb_in_unit_range() {
        let pixels = RgbImage::from_fn(2, 2, |x, y| match (x, y) {
            (0, 0) => Rgb([255, 0, 0]),
            (1, 0) => Rgb([0, 255, 0]),
            (0, 1) => Rgb([0, 0, 255]),
            _ => Rgb([51, 102, 204]),
        });
        let tensor = to_input_tensor(&DynamicImage::ImageRgb8(pixels), 2);

        assert_eq!(tensor.shape(), [1, 3, 2, 2]);
        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert_eq!(tensor[[0, 1, 0, 1]], 1.0);
        assert_eq!(tensor[[0, 2, 1, 0]], 1.0);
        assert_eq!(tensor[[0, 0, 1, 0]], 0.0);
        assert!((tensor[[0, 0, 1, 1]] - 0.2).abs() < 1e-6);
        assert!((tensor[[0, 1, 1, 1]] - 0.4).abs() < 1e-6);
        assert!((tensor[[0, 2, 1, 1]] - 0.8).abs() < 1e-6);

        // Plane-major layout: red plane, then green, then blue
        let flat: Vec<f32> = tensor.iter().copied().collect();
        assert_eq!(&flat[..4], &[1.0, 0.0, 0.0, 0.2]);
    }

    #[test]
    fn input_tensor_is_resized_to_square() {
        let region = DynamicImage::ImageRgb8(RgbImage::from_pixel(37, 20, Rgb([10, 20, 30])));
        let tensor = to_input_tensor(&region, 8);
        assert_eq!(tensor.shape(), [1, 3, 8, 8]);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn index_without_manifest_entry_uses_index() {
        let names: Vec<String> = ["10", "100", "25"].iter().map(|s| s.to_string()).collect();
        assert_eq!(label_for_index(&names, 1), "100");
        assert_eq!(label_for_index(&names, 4), "4");
        assert_eq!(label_for_index(&[], 0), "0");
    }

    #[test]
    fn manifest_skips_blank_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("classes.txt");
        std::fs::write(&path, "10\n100\n\n25\n").unwrap();
        assert_eq!(load_class_names(&path).unwrap(), vec!["10", "100", "25"]);
    }

    #[test]
    fn missing_manifest_falls_back_to_default_order() {
        let names = class_names_or_default(Path::new("/nonexistent/classes.txt"));
        assert_eq!(names, DEFAULT_CLASS_NAMES);
    }

    #[test]
    fn missing_model_is_a_load_error() {
        let result = OnnxCoinClassifier::load(Path::new("/nonexistent/model.onnx"), vec![], 224);
        assert!(matches!(result, Err(Error::ModelLoad { .. })));
    }
}
