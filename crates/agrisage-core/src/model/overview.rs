// ── Overview aggregates ──
//
// Read-only totals assembled from cached reads: one across every farm of
// the signed-in farmer, one for a single farm.

use serde::Serialize;

use super::farm::Farm;
use super::ids::FarmId;
use super::recommendation::{Recommendation, RecommendationStatus};
use super::weather::Weather;

/// Per-farm line of the [`Dashboard`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmTotals {
    pub id: FarmId,
    pub name: String,
    pub size_acres: f64,
    pub crops: usize,
    pub planted_acres: f64,
}

/// Totals across all farms. Crop counts come from the crops embedded in
/// each farm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_farms: usize,
    pub total_crops: usize,
    pub total_acres: f64,
    pub farms: Vec<FarmTotals>,
}

impl Dashboard {
    pub fn from_farms(farms: &[Farm]) -> Self {
        let farms: Vec<FarmTotals> = farms
            .iter()
            .map(|f| FarmTotals {
                id: f.id,
                name: f.name.clone(),
                size_acres: f.size_acres,
                crops: f.crops.len(),
                planted_acres: f.planted_acres(),
            })
            .collect();
        Self {
            total_farms: farms.len(),
            total_crops: farms.iter().map(|f| f.crops).sum(),
            total_acres: farms.iter().map(|f| f.size_acres).sum(),
            farms,
        }
    }
}

/// Quick stats for one farm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmOverview {
    pub id: FarmId,
    pub name: String,
    pub size_acres: f64,
    pub crops: usize,
    pub recommendations: usize,
    pub pending_recommendations: usize,
    /// `None` when the weather lookup failed.
    pub temperature_c: Option<f64>,
}

impl FarmOverview {
    pub fn new(
        farm: &Farm,
        crops: usize,
        recommendations: &[Recommendation],
        weather: Option<&Weather>,
    ) -> Self {
        Self {
            id: farm.id,
            name: farm.name.clone(),
            size_acres: farm.size_acres,
            crops,
            recommendations: recommendations.len(),
            pending_recommendations: recommendations
                .iter()
                .filter(|r| r.status == RecommendationStatus::Pending)
                .count(),
            temperature_c: weather.map(|w| w.temperature_c),
        }
    }
}
