use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_text_mut};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::models::{CoinObservation, CountResult};

const RULE: &str = "========================================";
const THIN_RULE: &str = "----------------------------------------";

/// Fonts tried for annotation labels when none is given
const FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Summary table: counts per denomination sorted by name, then totals
pub struct Summary<'a>(pub &'a CountResult);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "      RESUMO DA CONTAGEM DE MOEDAS")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Quantidade por denominação:")?;
        writeln!(f, "{}", THIN_RULE)?;
        for (name, count) in result.counts_by_name() {
            writeln!(f, "  {}: {} moeda(s)", name, count)?;
        }
        writeln!(f, "{}", THIN_RULE)?;
        writeln!(f, "Total de moedas: {}", result.coin_count())?;
        writeln!(f, "Valor total: R$ {:.2}", result.total_value())?;
        write!(f, "{}", RULE)
    }
}

pub fn format_summary(result: &CountResult) -> String {
    Summary(result).to_string()
}

pub fn print_summary(result: &CountResult) {
    println!("\n{}", Summary(result));
}

/// Index pairs of coins whose circles overlap by more than a 10% tolerance
pub fn find_overlaps(observations: &[CoinObservation]) -> Vec<(usize, usize)> {
    let mut overlaps = Vec::new();
    for i in 0..observations.len() {
        for j in i + 1..observations.len() {
            let a = &observations[i].circle;
            let b = &observations[j].circle;
            if a.distance_to(b) < (a.radius + b.radius) * 0.9 {
                overlaps.push((i, j));
            }
        }
    }
    overlaps
}

/// Copy of `img` with each coin outlined in its confidence color, a center
/// dot, and a `name (NN%)` label when a font is available
pub fn annotate(img: &DynamicImage, observations: &[CoinObservation], font: Option<&FontVec>) -> RgbImage {
    let mut canvas = img.to_rgb8();
    let dot = Rgb([255u8, 0, 0]);

    for observation in observations {
        let color = Rgb(observation.tier().rgb());
        let center = observation.circle.center();
        let radius = observation.circle.radius.round() as i32;

        // Two pixel outline
        draw_hollow_circle_mut(&mut canvas, center, radius, color);
        if radius > 1 {
            draw_hollow_circle_mut(&mut canvas, center, radius - 1, color);
        }
        draw_filled_circle_mut(&mut canvas, center, 3, dot);

        if let Some(font) = font {
            let label = format!("{} ({:.0}%)", observation.name(), observation.confidence * 100.0);
            let x = center.0 - 50;
            let y = center.1 - radius - 10;
            let scale = PxScale::from(16.0);
            draw_text_mut(&mut canvas, color, x, y, scale, font, &label);
            draw_text_mut(&mut canvas, color, x + 1, y, scale, font, &label);
        }
    }

    canvas
}

/// Font for annotation labels: `explicit` if given, else the first system
/// font found. `None` means labels are skipped.
pub fn load_label_font(explicit: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = explicit {
        let font = read_font(path);
        if font.is_none() {
            warn!("Could not load font {}, labels will be skipped", path.display());
        }
        return font;
    }

    let font = FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .filter(|p| p.exists())
        .find_map(read_font);
    if font.is_none() {
        debug!("No system font found, annotation labels will be skipped");
    }
    font
}

fn read_font(path: &Path) -> Option<FontVec> {
    let bytes = std::fs::read(path).ok()?;
    FontVec::try_from_vec(bytes).ok()
}
