use image::{DynamicImage, GrayImage};

use crate::config::{HoughParams, RadiusBounds};
use crate::detection::preprocessing::{self, GradientImage};
use crate::detection::CircleDetector;
use crate::models::DetectedCircle;

/// Gradient Hough transform circle finder.
///
/// Every edge pixel votes along its gradient direction (both ways) for all
/// radii in the requested bounds. Accumulator peaks above the threshold are
/// center candidates, visited strongest first; each accepted center gets the
/// radius with the most edge support. Accumulator resolution equals the image
/// resolution.
#[derive(Debug, Clone, Default)]
pub struct HoughCircleDetector {
    pub params: HoughParams,
}

#[derive(Debug, Clone, Copy)]
struct EdgePoint {
    x: i32,
    y: i32,
    // Unit gradient direction
    dx: f32,
    dy: f32,
}

impl HoughCircleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: HoughParams) -> Self {
        Self { params }
    }

    /// Run the transform on an already smoothed grayscale image
    pub fn find_circles(&self, blurred: &GrayImage, bounds: RadiusBounds) -> Vec<DetectedCircle> {
        let (width, height) = blurred.dimensions();
        if width < 3 || height < 3 || bounds.max < bounds.min {
            return Vec::new();
        }

        let high = self.params.canny_threshold;
        let edges = preprocessing::detect_edges(blurred, high / 2.0, high);
        let (gx, gy) = preprocessing::gradients(blurred);
        let points = collect_edge_points(&edges, &gx, &gy);
        if points.is_empty() {
            return Vec::new();
        }

        let accumulator = accumulate(&points, width, height, bounds);
        let threshold = self.params.accumulator_threshold;
        let candidates = find_center_candidates(&accumulator, width, height, threshold);

        let min_dist_sq = self.params.min_center_distance * self.params.min_center_distance;
        let mut circles: Vec<DetectedCircle> = Vec::new();

        for index in candidates {
            let cx = (index % width as usize) as f32;
            let cy = (index / width as usize) as f32;

            let too_close = circles.iter().any(|c| {
                let dx = c.x - cx;
                let dy = c.y - cy;
                dx * dx + dy * dy < min_dist_sq
            });
            if too_close {
                continue;
            }

            if let Some(radius) = estimate_radius(cx, cy, &points, bounds, threshold) {
                circles.push(DetectedCircle::new(cx, cy, radius));
            }
        }

        circles
    }
}

impl CircleDetector for HoughCircleDetector {
    fn detect(&self, img: &DynamicImage, bounds: RadiusBounds) -> Vec<DetectedCircle> {
        if img.width() < 3 || img.height() < 3 {
            return Vec::new();
        }
        let gray = preprocessing::to_grayscale(img);
        let blurred = preprocessing::apply_blur(&gray, self.params.blur_sigma);
        self.find_circles(&blurred, bounds)
    }
}

fn collect_edge_points(edges: &GrayImage, gx: &GradientImage, gy: &GradientImage) -> Vec<EdgePoint> {
    let mut points = Vec::new();
    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        let vx = gx.get_pixel(x, y)[0] as f32;
        let vy = gy.get_pixel(x, y)[0] as f32;
        let magnitude = (vx * vx + vy * vy).sqrt();
        if magnitude == 0.0 {
            continue;
        }
        points.push(EdgePoint {
            x: x as i32,
            y: y as i32,
            dx: vx / magnitude,
            dy: vy / magnitude,
        });
    }
    points
}

fn accumulate(points: &[EdgePoint], width: u32, height: u32, bounds: RadiusBounds) -> Vec<u32> {
    let (w, h) = (width as i64, height as i64);
    let mut accumulator = vec![0u32; (width * height) as usize];

    for point in points {
        for sign in [1.0f32, -1.0] {
            let (sx, sy) = (point.dx * sign, point.dy * sign);
            for r in bounds.min.max(1)..=bounds.max {
                let cx = (point.x as f32 + sx * r as f32).round() as i64;
                let cy = (point.y as f32 + sy * r as f32).round() as i64;
                // The ray only moves further away once it leaves the image
                if cx < 0 || cy < 0 || cx >= w || cy >= h {
                    break;
                }
                accumulator[(cy * w + cx) as usize] += 1;
            }
        }
    }

    accumulator
}

/// Local accumulator maxima above `threshold`, strongest first
fn find_center_candidates(accumulator: &[u32], width: u32, height: u32, threshold: u32) -> Vec<usize> {
    let w = width as usize;
    let mut candidates = Vec::new();

    for y in 1..height as usize - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let votes = accumulator[i];
            // Strict on one side, non-strict on the other so plateaus yield one peak
            if votes > threshold
                && votes > accumulator[i - 1]
                && votes >= accumulator[i + 1]
                && votes > accumulator[i - w]
                && votes >= accumulator[i + w]
            {
                candidates.push((i, votes));
            }
        }
    }

    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    candidates.into_iter().map(|(i, _)| i).collect()
}

/// Radius with the most edge pixels within one pixel of it, refined to the
/// mean distance of those pixels
fn estimate_radius(
    cx: f32,
    cy: f32,
    points: &[EdgePoint],
    bounds: RadiusBounds,
    min_support: u32,
) -> Option<f32> {
    let reach = bounds.max as f32 + 1.0;
    let bins = bounds.max as usize + 2;
    let mut counts = vec![0u32; bins];
    let mut sums = vec![0f32; bins];

    for point in points {
        let dx = point.x as f32 - cx;
        let dy = point.y as f32 - cy;
        if dx.abs() > reach || dy.abs() > reach {
            continue;
        }
        let distance = (dx * dx + dy * dy).sqrt();
        let bin = distance.round() as usize;
        if bin < bins {
            counts[bin] += 1;
            sums[bin] += distance;
        }
    }

    let mut best: Option<(usize, u32)> = None;
    for r in bounds.min.max(1) as usize..=bounds.max as usize {
        let support = counts[r - 1] + counts[r] + counts[r + 1];
        // Ties go to the larger radius: the outer rim is the coin edge
        if best.is_none_or(|(_, s)| support >= s) {
            best = Some((r, support));
        }
    }

    let (r, support) = best?;
    if support < min_support || support == 0 {
        return None;
    }
    let distance_sum = sums[r - 1] + sums[r] + sums[r + 1];
    Some(distance_sum / support as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_are_sorted_by_votes() {
        let (w, h) = (7u32, 3u32);
        let mut acc = vec![0u32; (w * h) as usize];
        acc[w as usize + 1] = 40;
        acc[w as usize + 4] = 90;
        let candidates = find_center_candidates(&acc, w, h, 30);
        assert_eq!(candidates, vec![w as usize + 4, w as usize + 1]);
    }

    #[test]
    fn plateau_yields_single_candidate() {
        let (w, h) = (6u32, 3u32);
        let mut acc = vec![0u32; (w * h) as usize];
        acc[w as usize + 2] = 50;
        acc[w as usize + 3] = 50;
        let candidates = find_center_candidates(&acc, w, h, 30);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn radius_needs_enough_support() {
        let points: Vec<EdgePoint> = (0..10)
            .map(|i| EdgePoint { x: 50 + i, y: 25, dx: 0.0, dy: 1.0 })
            .collect();
        let bounds = RadiusBounds { min: 20, max: 40 };
        assert!(estimate_radius(50.0, 0.0, &points, bounds, 30).is_none());
    }
}
