// ── Crop domain types ──

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use super::ids::{CropId, FarmId};

/// Growth stage of a planted crop, in order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GrowthStage {
    Seedling,
    Vegetative,
    Flowering,
    Fruiting,
    Harvesting,
    Unknown,
}

/// A crop planted on a farm.
#[derive(Debug, Clone, Serialize)]
pub struct Crop {
    pub id: CropId,
    pub farm_id: FarmId,
    pub name: String,
    pub planting_date: DateTime<Utc>,
    pub expected_harvest_date: Option<DateTime<Utc>>,
    pub stage: GrowthStage,
    pub area_acres: f64,
    pub created_at: Option<DateTime<Utc>>,
}

impl Crop {
    /// Whole days until the expected harvest, negative once overdue.
    pub fn days_to_harvest(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expected_harvest_date
            .map(|harvest| (harvest - now).num_days())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stages_are_ordered() {
        assert!(GrowthStage::Seedling < GrowthStage::Harvesting);
        assert_eq!("FLOWERING".parse::<GrowthStage>().unwrap(), GrowthStage::Flowering);
    }

    #[test]
    fn days_to_harvest_counts_down() {
        let crop = Crop {
            id: CropId::new(1),
            farm_id: FarmId::new(1),
            name: "Maize".into(),
            planting_date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            expected_harvest_date: Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()),
            stage: GrowthStage::Vegetative,
            area_acres: 2.0,
            created_at: None,
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
        assert_eq!(crop.days_to_harvest(now), Some(10));
    }
}
