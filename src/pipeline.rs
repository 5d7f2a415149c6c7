use ab_glyph::FontVec;
use anyhow::Result;
use image::{DynamicImage, ImageReader};
use std::path::Path;
use tracing::{info, warn};

use crate::detection::CoinCounter;
use crate::error::Error;
use crate::models::CountResult;
use crate::report;

/// Decode an image file, guessing the format from its content
pub fn load_image(path: &Path) -> Result<DynamicImage, Error> {
    let to_error = |source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| to_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| to_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(to_error)
}

/// Count the coins in `img`, print the summary and, when `output` is set,
/// write the annotated copy there.
///
/// Nothing is printed or written when no coin is detected.
pub fn process_image(
    counter: &CoinCounter,
    img: &DynamicImage,
    output: Option<&Path>,
    font: Option<&FontVec>,
) -> Result<Option<CountResult>> {
    let Some(result) = counter.count(img)? else {
        return Ok(None);
    };

    report::print_summary(&result);

    let overlaps = report::find_overlaps(&result.observations);
    if !overlaps.is_empty() {
        warn!("{} possible coin overlaps detected", overlaps.len());
    }

    if let Some(path) = output {
        let annotated = report::annotate(img, &result.observations, font);
        annotated
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
        info!("Annotated image saved to: {}", path.display());
    }

    Ok(Some(result))
}
