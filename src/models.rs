use std::collections::BTreeMap;

/// A circle candidate returned by the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedCircle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl DetectedCircle {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    /// Center rounded to pixel coordinates
    pub fn center(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    pub fn distance_to(&self, other: &DetectedCircle) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Brazilian coin denominations known to the classifier, plus a fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Denomination {
    FiveCentavos,
    TenCentavos,
    TwentyFiveCentavos,
    FiftyCentavos,
    OneReal,
    Unknown,
}

impl Denomination {
    pub const KNOWN: [Denomination; 5] = [
        Denomination::FiveCentavos,
        Denomination::TenCentavos,
        Denomination::TwentyFiveCentavos,
        Denomination::FiftyCentavos,
        Denomination::OneReal,
    ];

    /// Map a classifier label to its denomination.
    ///
    /// Accepts the plain labels (`"50"`) as well as the suffixed
    /// (`"50_centavos"`) and zero-padded (`"050_50centavos"`) spellings that
    /// older datasets used for folder names.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "5" | "5_centavos" | "005_5centavos" => Denomination::FiveCentavos,
            "10" | "10_centavos" | "010_10centavos" => Denomination::TenCentavos,
            "25" | "25_centavos" | "025_25centavos" => Denomination::TwentyFiveCentavos,
            "50" | "50_centavos" | "050_50centavos" => Denomination::FiftyCentavos,
            "100" | "100_real" | "100_1real" => Denomination::OneReal,
            _ => Denomination::Unknown,
        }
    }

    /// Canonical label, as written by the dataset organizer
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Denomination::FiveCentavos => Some("5"),
            Denomination::TenCentavos => Some("10"),
            Denomination::TwentyFiveCentavos => Some("25"),
            Denomination::FiftyCentavos => Some("50"),
            Denomination::OneReal => Some("100"),
            Denomination::Unknown => None,
        }
    }

    pub fn centavos(&self) -> u32 {
        match self {
            Denomination::FiveCentavos => 5,
            Denomination::TenCentavos => 10,
            Denomination::TwentyFiveCentavos => 25,
            Denomination::FiftyCentavos => 50,
            Denomination::OneReal => 100,
            Denomination::Unknown => 0,
        }
    }

    /// Face value in reais
    pub fn face_value(&self) -> f64 {
        self.centavos() as f64 / 100.0
    }

    pub fn name(&self) -> &'static str {
        match self {
            Denomination::FiveCentavos => "5 centavos",
            Denomination::TenCentavos => "10 centavos",
            Denomination::TwentyFiveCentavos => "25 centavos",
            Denomination::FiftyCentavos => "50 centavos",
            Denomination::OneReal => "1 real",
            Denomination::Unknown => "Desconhecida",
        }
    }
}

/// Annotation color bucket for a classification confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.8 {
            ConfidenceTier::High
        } else if confidence >= 0.5 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        match self {
            ConfidenceTier::High => [0, 255, 0],
            ConfidenceTier::Medium => [255, 255, 0],
            ConfidenceTier::Low => [255, 0, 0],
        }
    }
}

/// Top-1 output of a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// One detected and classified coin
#[derive(Debug, Clone)]
pub struct CoinObservation {
    pub label: String,
    pub confidence: f32,
    pub denomination: Denomination,
    pub circle: DetectedCircle,
}

impl CoinObservation {
    pub fn new(circle: DetectedCircle, classification: Classification) -> Self {
        let denomination = Denomination::from_label(&classification.label);
        Self {
            label: classification.label,
            confidence: classification.confidence,
            denomination,
            circle,
        }
    }

    pub fn value(&self) -> f64 {
        self.denomination.face_value()
    }

    pub fn name(&self) -> &'static str {
        self.denomination.name()
    }

    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_confidence(self.confidence)
    }
}

/// All coins found in one image, in detection order
#[derive(Debug, Clone, Default)]
pub struct CountResult {
    pub observations: Vec<CoinObservation>,
}

impl CountResult {
    pub fn new(observations: Vec<CoinObservation>) -> Self {
        Self { observations }
    }

    pub fn coin_count(&self) -> usize {
        self.observations.len()
    }

    pub fn total_centavos(&self) -> u64 {
        self.observations
            .iter()
            .map(|o| o.denomination.centavos() as u64)
            .sum()
    }

    /// Total face value in reais
    pub fn total_value(&self) -> f64 {
        self.total_centavos() as f64 / 100.0
    }

    /// Coins per display name, sorted by name
    pub fn counts_by_name(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for observation in &self.observations {
            *counts.entry(observation.name()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(ConfidenceTier::from_confidence(0.8), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.79), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.5), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.49), ConfidenceTier::Low);
    }

    #[test]
    fn aliases_resolve_to_same_denomination() {
        for label in ["50", "50_centavos", "050_50centavos"] {
            assert_eq!(Denomination::from_label(label), Denomination::FiftyCentavos);
        }
        assert_eq!(Denomination::from_label("100_1real"), Denomination::OneReal);
        assert_eq!(Denomination::from_label(" 25 "), Denomination::TwentyFiveCentavos);
    }

    #[test]
    fn total_is_summed_in_centavos() {
        let circle = DetectedCircle::new(0.0, 0.0, 10.0);
        let observations = ["10", "10", "10"]
            .iter()
            .map(|l| CoinObservation::new(circle, Classification::new(*l, 1.0)))
            .collect();
        let result = CountResult::new(observations);
        assert_eq!(result.total_centavos(), 30);
        assert_eq!(result.total_value(), 0.30);
    }
}
