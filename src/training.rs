use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::{CLASS_MANIFEST_NAME, EXPORTED_MODEL_NAME, SplitParams, TrainingParams};
use crate::dataset::{self, SplitManifest};
use crate::error::Error;

/// External training backend
pub trait Trainer {
    /// Train on an organized dataset; returns the best checkpoint
    fn train(&self, data_dir: &Path, params: &TrainingParams) -> Result<PathBuf>;

    /// Export a checkpoint to ONNX; returns the exported file
    fn export(&self, weights: &Path, params: &TrainingParams) -> Result<PathBuf>;
}

/// Trainer driving the Ultralytics `yolo` command line
#[derive(Debug, Clone)]
pub struct YoloCli {
    pub program: PathBuf,
}

impl Default for YoloCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yolo"),
        }
    }
}

impl YoloCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[String]) -> Result<(), Error> {
        debug!("Running {} {}", self.program.display(), args.join(" "));
        let status = Command::new(&self.program).args(args).status()?;
        if !status.success() {
            return Err(Error::ExternalCommand {
                program: self.program.display().to_string(),
                status,
            });
        }
        Ok(())
    }
}

/// Arguments of `yolo classify train`
pub fn train_args(data_dir: &Path, params: &TrainingParams) -> Vec<String> {
    vec![
        "classify".to_string(),
        "train".to_string(),
        format!("data={}", data_dir.display()),
        format!("model={}", params.base_model),
        format!("epochs={}", params.epochs),
        format!("imgsz={}", params.image_size),
        format!("batch={}", params.batch_size),
        format!("lr0={}", params.learning_rate),
        format!("project={}", params.project.display()),
        format!("name={}", params.run_name),
        "exist_ok=True".to_string(),
    ]
}

/// Arguments of `yolo export` to ONNX
pub fn export_args(weights: &Path, params: &TrainingParams) -> Vec<String> {
    vec![
        "export".to_string(),
        format!("model={}", weights.display()),
        "format=onnx".to_string(),
        format!("imgsz={}", params.image_size),
        "simplify=True".to_string(),
    ]
}

impl Trainer for YoloCli {
    fn train(&self, data_dir: &Path, params: &TrainingParams) -> Result<PathBuf> {
        self.run(&train_args(data_dir, params))?;
        let weights = params.best_weights_path();
        if !weights.exists() {
            return Err(Error::MissingArtifact(weights).into());
        }
        Ok(weights)
    }

    fn export(&self, weights: &Path, params: &TrainingParams) -> Result<PathBuf> {
        self.run(&export_args(weights, params))?;
        let exported = weights.with_extension("onnx");
        if !exported.exists() {
            return Err(Error::MissingArtifact(exported).into());
        }
        Ok(exported)
    }
}

/// Everything one training run needs
#[derive(Debug, Clone)]
pub struct TrainingJob {
    /// Flat folder of `<label>_<id>.<ext>` images
    pub dataset_dir: PathBuf,
    /// Where the train/val tree is written
    pub organized_dir: PathBuf,
    /// Where the ONNX model and class manifest end up
    pub export_dir: PathBuf,
    pub split: SplitParams,
    pub params: TrainingParams,
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub manifest: SplitManifest,
    pub weights: PathBuf,
    pub model_path: PathBuf,
    pub classes_path: PathBuf,
}

/// One line per class, line index = class index of the exported model
pub fn write_class_manifest(path: &Path, class_names: &[String]) -> std::io::Result<()> {
    std::fs::write(path, class_names.join("\n"))
}

/// Organize the dataset without training
pub fn prepare(job: &TrainingJob) -> Result<SplitManifest, Error> {
    if !job.dataset_dir.exists() {
        return Err(Error::DatasetNotFound(job.dataset_dir.clone()));
    }
    info!("[1/3] Preparing dataset from {}...", job.dataset_dir.display());
    dataset::organize(&job.dataset_dir, &job.organized_dir, &job.split)
}

/// Organize, train once, export and write the class manifest.
///
/// Dataset problems surface before the trainer is invoked. Trainer failures
/// are returned as-is; nothing is retried.
pub fn run_training(job: &TrainingJob, trainer: &dyn Trainer) -> Result<TrainingOutcome> {
    let manifest = prepare(job)?;

    info!("[2/3] Training model...");
    info!("  Dataset: {}", job.organized_dir.display());
    info!("  Epochs: {}", job.params.epochs);
    info!("  Batch size: {}", job.params.batch_size);
    info!("  Image size: {}", job.params.image_size);
    let weights = trainer.train(&job.organized_dir, &job.params)?;

    info!("[3/3] Exporting model...");
    std::fs::create_dir_all(&job.export_dir)?;
    let exported = trainer.export(&weights, &job.params)?;
    let model_path = job.export_dir.join(EXPORTED_MODEL_NAME);
    std::fs::copy(&exported, &model_path)?;
    info!("ONNX model saved to: {}", model_path.display());

    let classes_path = job.export_dir.join(CLASS_MANIFEST_NAME);
    write_class_manifest(&classes_path, &manifest.class_names())?;
    info!("Classes saved to: {}", classes_path.display());

    Ok(TrainingOutcome {
        manifest,
        weights,
        model_path,
        classes_path,
    })
}
