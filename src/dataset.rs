//! Train/validation organisation of a flat folder of labelled coin images.
//!
//! Source files are named `<label>_<id>.<ext>` (e.g. `50_1477283178.jpg`).
//! The output mirrors the folder-per-class layout the trainer expects:
//! `train/<label>/*` and `val/<label>/*`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::SplitParams;
use crate::error::{Error, Result};

pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

pub const TRAIN_DIR: &str = "train";
pub const VAL_DIR: &str = "val";

/// Train and validation members of one label
#[derive(Debug, Clone)]
pub struct ClassSplit {
    pub label: String,
    pub train: Vec<PathBuf>,
    pub val: Vec<PathBuf>,
}

impl ClassSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one organisation run
#[derive(Debug, Clone)]
pub struct SplitManifest {
    pub output_dir: PathBuf,
    /// Classes in processing order
    pub classes: Vec<ClassSplit>,
    pub copied: usize,
    /// Files whose destination already existed
    pub skipped: usize,
}

impl SplitManifest {
    /// Labels in the order the trainer indexes them: sorted by name, the way
    /// it enumerates class folders
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.iter().map(|c| c.label.clone()).collect();
        names.sort();
        names
    }

    pub fn train_dir(&self) -> PathBuf {
        self.output_dir.join(TRAIN_DIR)
    }

    pub fn val_dir(&self) -> PathBuf {
        self.output_dir.join(VAL_DIR)
    }
}

/// Image files directly inside `dir`, sorted by path
pub fn find_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Label encoded in a file name: the part before the first underscore, or the
/// whole name when there is none
pub fn label_from_file_name(name: &str) -> &str {
    match name.split_once('_') {
        Some((label, _)) => label,
        None => name,
    }
}

/// Number of training items for a class of `n` items
pub fn train_count(n: usize, val_fraction: f64) -> usize {
    ((n as f64) * (1.0 - val_fraction)).floor() as usize
}

/// Numeric labels first by value; anything else counts as 0, then by name
fn class_order(label: &str) -> (u64, &str) {
    let numeric = if !label.is_empty() && label.chars().all(|c| c.is_ascii_digit()) {
        label.parse().unwrap_or(u64::MAX)
    } else {
        0
    };
    (numeric, label)
}

/// Group images by label
pub fn group_by_label(images: Vec<PathBuf>) -> BTreeMap<String, Vec<PathBuf>> {
    let mut classes: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in images {
        let Some(file_name) = path.file_name() else {
            continue;
        };
        // Undecodable bytes become U+FFFD; the copy keeps the original name
        let name = file_name.to_string_lossy();
        if !name.contains('_') {
            warn!("No '_' in {}, using the whole file name as its label", name);
        }
        let label = label_from_file_name(&name).to_string();
        classes.entry(label).or_default().push(path);
    }
    classes
}

/// Split `source_dir` into `output_dir/{train,val}/<label>/` copies.
///
/// Each label is shuffled with one RNG seeded from `params.seed` and cut at
/// `floor(n * (1 - val_fraction))`. Existing destination files are left alone.
pub fn organize(source_dir: &Path, output_dir: &Path, params: &SplitParams) -> Result<SplitManifest> {
    if !(0.0..1.0).contains(&params.val_fraction) {
        return Err(Error::InvalidValFraction(params.val_fraction));
    }
    if !source_dir.is_dir() {
        return Err(Error::DatasetNotFound(source_dir.to_path_buf()));
    }

    let classes = group_by_label(find_images(source_dir)?);
    if classes.is_empty() {
        return Err(Error::NoImages(source_dir.to_path_buf()));
    }

    info!("Classes found:");
    for (label, items) in &classes {
        info!("  {}: {} images", label, items.len());
    }

    let mut ordered: Vec<(String, Vec<PathBuf>)> = classes.into_iter().collect();
    ordered.sort_by(|a, b| class_order(&a.0).cmp(&class_order(&b.0)));

    let mut manifest = SplitManifest {
        output_dir: output_dir.to_path_buf(),
        classes: Vec::with_capacity(ordered.len()),
        copied: 0,
        skipped: 0,
    };
    let train_root = manifest.train_dir();
    let val_root = manifest.val_dir();
    std::fs::create_dir_all(&train_root)?;
    std::fs::create_dir_all(&val_root)?;

    let mut rng = StdRng::seed_from_u64(params.seed);

    for (label, mut items) in ordered {
        let train_dir = train_root.join(&label);
        let val_dir = val_root.join(&label);
        std::fs::create_dir_all(&train_dir)?;
        std::fs::create_dir_all(&val_dir)?;

        items.shuffle(&mut rng);
        let cut = train_count(items.len(), params.val_fraction);
        let val = items.split_off(cut);
        let train = items;

        for (files, dir) in [(&train, &train_dir), (&val, &val_dir)] {
            for src in files {
                if copy_if_absent(src, dir)? {
                    manifest.copied += 1;
                } else {
                    manifest.skipped += 1;
                }
            }
        }

        info!("  {}: {} train, {} val", label, train.len(), val.len());
        manifest.classes.push(ClassSplit { label, train, val });
    }

    info!("Dataset organized in: {}", output_dir.display());
    info!("  - {}", train_root.display());
    info!("  - {}", val_root.display());
    if manifest.skipped > 0 {
        info!("  {} files already present, not copied", manifest.skipped);
    }

    Ok(manifest)
}

/// Copy `src` into `dir` under its own name; false if the target exists
fn copy_if_absent(src: &Path, dir: &Path) -> Result<bool> {
    let Some(name) = src.file_name() else {
        return Ok(false);
    };
    let dst = dir.join(name);
    if dst.exists() {
        return Ok(false);
    }
    std::fs::copy(src, &dst)?;
    Ok(true)
}
