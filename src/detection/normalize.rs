use image::{DynamicImage, Rgb, RgbImage};

use crate::models::DetectedCircle;

/// Background the classifier saw around coins during training
pub const BACKGROUND_GRAY: Rgb<u8> = Rgb([180, 180, 180]);

/// The mask is slightly larger than the detected radius so the rim survives
pub const MASK_SCALE: f32 = 1.1;

/// Keep the pixels inside `radius * MASK_SCALE` of the circle center and paint
/// everything else `BACKGROUND_GRAY`. Output has the input's dimensions.
pub fn normalize_region(img: &DynamicImage, circle: &DetectedCircle) -> RgbImage {
    let source = img.to_rgb8();
    let (width, height) = source.dimensions();
    let mask_radius = circle.radius * MASK_SCALE;
    let mask_radius_sq = mask_radius * mask_radius;

    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - circle.x;
        let dy = y as f32 - circle.y;
        if dx * dx + dy * dy <= mask_radius_sq {
            *source.get_pixel(x, y)
        } else {
            BACKGROUND_GRAY
        }
    })
}

/// Square window of side `radius * factor` centered on the coin, clamped to
/// the image. Coins fill roughly the same share of it as in training images.
pub fn crop_coin_window(img: &RgbImage, circle: &DetectedCircle, factor: f32) -> RgbImage {
    let (width, height) = img.dimensions();
    let side = ((circle.radius * factor) as u32).max(1);

    // Window side and origin truncate toward zero
    let x = (circle.x - side as f32 / 2.0).max(0.0) as u32;
    let y = (circle.y - side as f32 / 2.0).max(0.0) as u32;
    let x = x.min(width.saturating_sub(1));
    let y = y.min(height.saturating_sub(1));
    let w = side.min(width - x);
    let h = side.min(height - y);
    let side = w.min(h).max(1);

    image::imageops::crop_imm(img, x, y, side, side).to_image()
}
