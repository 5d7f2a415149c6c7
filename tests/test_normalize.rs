//! Region normalization keeps the coin and paints the rest neutral gray.

mod common;

use common::*;
use image::{DynamicImage, Rgb, RgbImage};
use moedas::detection::normalize::{BACKGROUND_GRAY, MASK_SCALE, normalize_region};

fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 7])
    }))
}

#[test]
fn output_keeps_dimensions() {
    let img = gradient_image(173, 91);
    let circle = DetectedCircle::new(60.0, 45.0, 20.0);
    let normalized = normalize_region(&img, &circle);
    assert_eq!(normalized.dimensions(), (173, 91));
}

#[test]
fn pixels_outside_mask_are_gray() {
    let img = gradient_image(200, 150);
    let circle = DetectedCircle::new(100.0, 70.0, 30.0);
    let normalized = normalize_region(&img, &circle);
    let limit = circle.radius * MASK_SCALE;

    for (x, y, pixel) in normalized.enumerate_pixels() {
        let dx = x as f32 - circle.x;
        let dy = y as f32 - circle.y;
        if (dx * dx + dy * dy).sqrt() > limit {
            assert_eq!(*pixel, BACKGROUND_GRAY, "pixel ({}, {})", x, y);
        }
    }
    assert_eq!(BACKGROUND_GRAY, Rgb([180, 180, 180]));
}

#[test]
fn pixels_inside_radius_are_kept() {
    let img = gradient_image(200, 150);
    let source = img.to_rgb8();
    let circle = DetectedCircle::new(100.0, 70.0, 30.0);
    let normalized = normalize_region(&img, &circle);

    for (x, y, pixel) in normalized.enumerate_pixels() {
        let dx = x as f32 - circle.x;
        let dy = y as f32 - circle.y;
        if (dx * dx + dy * dy).sqrt() <= circle.radius {
            assert_eq!(pixel, source.get_pixel(x, y));
        }
    }
}

#[test]
fn circle_partly_outside_image() {
    let img = gradient_image(50, 50);
    let circle = DetectedCircle::new(0.0, 0.0, 30.0);
    let normalized = normalize_region(&img, &circle);
    assert_eq!(normalized.dimensions(), (50, 50));
    assert_eq!(normalized.get_pixel(0, 0), img.to_rgb8().get_pixel(0, 0));
    assert_eq!(*normalized.get_pixel(49, 49), BACKGROUND_GRAY);
}

#[test]
fn fractional_center_masks_from_exact_center() {
    let img = gradient_image(60, 40);
    let source = img.to_rgb8();
    let circle = DetectedCircle::new(20.5, 20.0, 10.0);
    let normalized = normalize_region(&img, &circle);
    let limit = circle.radius * MASK_SCALE;

    for (x, y, pixel) in normalized.enumerate_pixels() {
        let dx = x as f32 - circle.x;
        let dy = y as f32 - circle.y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > limit {
            assert_eq!(*pixel, BACKGROUND_GRAY, "pixel ({}, {})", x, y);
        } else if distance <= circle.radius {
            assert_eq!(pixel, source.get_pixel(x, y), "pixel ({}, {})", x, y);
        }
    }
}
