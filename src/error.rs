use std::path::PathBuf;
use std::process::ExitStatus;

/// Failures the counting and training pipelines report to their callers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load classifier model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("dataset folder not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("no images found in {0}")]
    NoImages(PathBuf),

    #[error("validation fraction must be in [0, 1), got {0}")]
    InvalidValFraction(f64),

    #[error("debug directory is not empty: {0}")]
    DebugDirNotEmpty(PathBuf),

    #[error("`{program}` exited with {status}")]
    ExternalCommand { program: String, status: ExitStatus },

    #[error("expected artifact was not produced: {0}")]
    MissingArtifact(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
