// ── Disease detection domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use super::ids::{CropId, DetectionId, FarmId};
use crate::error::CoreError;

/// Classifier confidence, always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub const ZERO: Self = Self(0.0);

    /// Clamp `raw` into [0, 1]. NaN is rejected.
    pub fn new(raw: f64) -> Result<Self, CoreError> {
        if raw.is_nan() {
            return Err(CoreError::invalid("confidence", "confidence is not a number"));
        }
        Ok(Self(raw.clamp(0.0, 1.0)))
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// Confidence as a percentage in [0, 100].
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.percent())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Severity {
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    /// Above 0.8 is high, above 0.6 medium, anything else low.
    pub fn from_confidence(confidence: Confidence) -> Self {
        match confidence.value() {
            c if c > 0.8 => Self::High,
            c if c > 0.6 => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// One disease classification of a crop photo.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Absent for a fresh detection; history rows carry one.
    pub id: Option<DetectionId>,
    pub farm_id: FarmId,
    pub crop_id: CropId,
    pub disease: String,
    pub confidence: Confidence,
    pub severity: Severity,
    pub detected_at: Option<DateTime<Utc>>,
    pub image_path: Option<String>,
    pub treatments: Vec<String>,
    pub prevention: Vec<String>,
}

impl Detection {
    pub fn is_healthy(&self) -> bool {
        self.disease.to_ascii_lowercase().contains("healthy")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(Confidence::new(1.7).unwrap().value(), 1.0);
        assert_eq!(Confidence::new(-0.2).unwrap().value(), 0.0);
        assert!(Confidence::new(f64::NAN).is_err());
    }

    #[test]
    fn percent_stays_in_range() {
        for raw in [0.0, 0.001, 0.25, 0.5, 0.999, 1.0, 3.0, -1.0, f64::INFINITY] {
            let pct = Confidence::new(raw).unwrap().percent();
            assert!((0.0..=100.0).contains(&pct), "{raw} -> {pct}");
        }
        assert_eq!(Confidence::new(0.873).unwrap().to_string(), "87.3%");
    }

    #[test]
    fn severity_thresholds() {
        let sev = |c: f64| Severity::from_confidence(Confidence::new(c).unwrap());
        assert_eq!(sev(0.81), Severity::High);
        assert_eq!(sev(0.8), Severity::Medium);
        assert_eq!(sev(0.61), Severity::Medium);
        assert_eq!(sev(0.6), Severity::Low);
        assert_eq!("High".parse::<Severity>().unwrap(), Severity::High);
    }

    #[test]
    fn healthy_label_is_detected() {
        let detection = |disease: &str| Detection {
            id: None,
            farm_id: FarmId::new(1),
            crop_id: CropId::new(2),
            disease: disease.into(),
            confidence: Confidence::ZERO,
            severity: Severity::Unknown,
            detected_at: None,
            image_path: None,
            treatments: Vec::new(),
            prevention: Vec::new(),
        };
        assert!(detection("Tomato___healthy").is_healthy());
        assert!(!detection("Leaf Rust").is_healthy());
    }
}
