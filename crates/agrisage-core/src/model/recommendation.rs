// ── Recommendation domain types ──
//
// Stored farm recommendations and computed per-crop advice share one
// shape. Computed advice has no id, starts pending at medium priority, and
// carries its structured numbers in `advice`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use super::ids::{CropId, FarmId, RecommendationId};
use crate::error::CoreError;

/// What a recommendation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RecommendationKind {
    Irrigation,
    Fertilizer,
    PestControl,
    /// General farm advice and anything unrecognized.
    Other,
}

impl RecommendationKind {
    /// Lenient parse of the server's value.
    pub fn from_server(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Other)
    }
}

/// Ordered most urgent first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Unknown priorities are treated as medium.
    pub fn from_server(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Medium)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RecommendationStatus {
    Pending,
    Applied,
    Dismissed,
}

impl RecommendationStatus {
    pub fn from_server(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Pending)
    }

    /// Applied and dismissed are final.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Dismissed)
    }
}

/// Structured numbers behind a crop-level recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Advice {
    Irrigation {
        water_litres: f64,
        frequency: String,
        best_time: String,
    },
    Fertilizer {
        product: String,
        kg_per_acre: f64,
        method: String,
        timing: String,
    },
}

/// The canonical Recommendation type.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Absent for advice computed on demand.
    pub id: Option<RecommendationId>,
    pub farm_id: FarmId,
    pub crop_id: Option<CropId>,
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub status: RecommendationStatus,
    pub title: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub advice: Option<Advice>,
}

impl Recommendation {
    /// Advice computed for one crop.
    pub fn from_advice(farm_id: FarmId, crop_id: CropId, advice: Advice, reason: String) -> Self {
        let (kind, title) = match &advice {
            Advice::Irrigation {
                water_litres,
                frequency,
                ..
            } => (
                RecommendationKind::Irrigation,
                format!("Irrigate {water_litres:.0} L, {}", frequency.replace('_', " ")),
            ),
            Advice::Fertilizer {
                product,
                kg_per_acre,
                ..
            } => (
                RecommendationKind::Fertilizer,
                format!("Apply {product} at {kg_per_acre:.1} kg/acre"),
            ),
        };
        Self {
            id: None,
            farm_id,
            crop_id: Some(crop_id),
            kind,
            priority: Priority::Medium,
            status: RecommendationStatus::Pending,
            title,
            description: reason,
            created_at: None,
            updated_at: None,
            advice: Some(advice),
        }
    }

    /// Move to `to`. Only pending recommendations may change status.
    pub fn transition(&mut self, to: RecommendationStatus) -> Result<(), CoreError> {
        if self.status != RecommendationStatus::Pending || to == RecommendationStatus::Pending {
            return Err(CoreError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn apply(&mut self) -> Result<(), CoreError> {
        self.transition(RecommendationStatus::Applied)
    }

    pub fn dismiss(&mut self) -> Result<(), CoreError> {
        self.transition(RecommendationStatus::Dismissed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn irrigation() -> Recommendation {
        Recommendation::from_advice(
            FarmId::new(1),
            CropId::new(2),
            Advice::Irrigation {
                water_litres: 250.0,
                frequency: "every_2_days".into(),
                best_time: "early morning".into(),
            },
            "Low rainfall expected".into(),
        )
    }

    #[test]
    fn computed_advice_is_pending_medium_without_id() {
        let rec = irrigation();
        assert!(rec.id.is_none());
        assert_eq!(rec.kind, RecommendationKind::Irrigation);
        assert_eq!(rec.priority, Priority::Medium);
        assert_eq!(rec.status, RecommendationStatus::Pending);
        assert_eq!(rec.title, "Irrigate 250 L, every 2 days");
    }

    #[test]
    fn general_and_unknown_kinds_are_other() {
        assert_eq!(RecommendationKind::from_server("general"), RecommendationKind::Other);
        assert_eq!(RecommendationKind::from_server("weather"), RecommendationKind::Other);
        assert_eq!(
            RecommendationKind::from_server("pest_control"),
            RecommendationKind::PestControl
        );
    }

    #[test]
    fn priority_orders_most_urgent_first() {
        let mut p = vec![Priority::Low, Priority::Urgent, Priority::Medium, Priority::High];
        p.sort();
        assert_eq!(p, [Priority::Urgent, Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn only_pending_can_transition() {
        let mut rec = irrigation();
        rec.apply().unwrap();
        assert_eq!(rec.status, RecommendationStatus::Applied);
        assert!(rec.status.is_terminal());

        let err = rec.dismiss().unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(
            err.to_string(),
            "Cannot change recommendation status from applied to dismissed"
        );

        let mut pending = irrigation();
        assert!(pending.transition(RecommendationStatus::Pending).is_err());
        pending.dismiss().unwrap();
        assert!(pending.apply().is_err());
    }
}
