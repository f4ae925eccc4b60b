// ── Typed cache keys ──
//
// A key names one remote read: the entity kind plus the parameters that
// identify it. Keys are plain values, so two views asking for the same
// data build equal keys and share one cache entry.

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumIter};

use crate::model::{CropId, FarmId};

/// The kind of data behind a key, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum QueryKind {
    CurrentUser,
    Farms,
    Farm,
    FarmCrops,
    FarmWeather,
    FarmForecast,
    FarmRecommendations,
    DiseaseHistory,
    Irrigation,
    Fertilizer,
}

/// Identity of one cached remote read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryKey {
    CurrentUser,
    Farms,
    Farm(FarmId),
    FarmCrops(FarmId),
    FarmWeather(FarmId),
    FarmForecast { farm: FarmId, days: u8 },
    FarmRecommendations(FarmId),
    DiseaseHistory(FarmId),
    Irrigation { farm: FarmId, crop: CropId },
    Fertilizer { farm: FarmId, crop: CropId },
}

impl QueryKey {
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::CurrentUser => QueryKind::CurrentUser,
            Self::Farms => QueryKind::Farms,
            Self::Farm(_) => QueryKind::Farm,
            Self::FarmCrops(_) => QueryKind::FarmCrops,
            Self::FarmWeather(_) => QueryKind::FarmWeather,
            Self::FarmForecast { .. } => QueryKind::FarmForecast,
            Self::FarmRecommendations(_) => QueryKind::FarmRecommendations,
            Self::DiseaseHistory(_) => QueryKind::DiseaseHistory,
            Self::Irrigation { .. } => QueryKind::Irrigation,
            Self::Fertilizer { .. } => QueryKind::Fertilizer,
        }
    }

    /// The farm this key is scoped to, if any.
    pub const fn farm(&self) -> Option<FarmId> {
        match self {
            Self::CurrentUser | Self::Farms => None,
            Self::Farm(farm)
            | Self::FarmCrops(farm)
            | Self::FarmWeather(farm)
            | Self::FarmRecommendations(farm)
            | Self::DiseaseHistory(farm)
            | Self::FarmForecast { farm, .. }
            | Self::Irrigation { farm, .. }
            | Self::Fertilizer { farm, .. } => Some(*farm),
        }
    }
}

/// Renders the resource path the key reads, e.g. `farms/3/crops`.
impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentUser => f.write_str("auth/me"),
            Self::Farms => f.write_str("farms"),
            Self::Farm(id) => write!(f, "farms/{id}"),
            Self::FarmCrops(id) => write!(f, "farms/{id}/crops"),
            Self::FarmWeather(id) => write!(f, "farms/{id}/weather"),
            Self::FarmForecast { farm, days } => {
                write!(f, "farms/{farm}/weather/forecast?days={days}")
            }
            Self::FarmRecommendations(id) => write!(f, "farms/{id}/recommendations"),
            Self::DiseaseHistory(id) => write!(f, "farms/{id}/disease-history"),
            Self::Irrigation { farm, crop } => write!(f, "farms/{farm}/crops/{crop}/irrigation"),
            Self::Fertilizer { farm, crop } => write!(f, "farms/{farm}/crops/{crop}/fertilizer"),
        }
    }
}

/// A selector over keys, used by invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// Every key.
    All,
    /// Exactly this key.
    Exact(QueryKey),
    /// Every key of this kind, whatever its parameters.
    Kind(QueryKind),
    /// Every key scoped to this farm.
    Farm(FarmId),
}

impl KeyPattern {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::All => true,
            Self::Exact(k) => k == key,
            Self::Kind(kind) => key.kind() == *kind,
            Self::Farm(farm) => key.farm() == Some(*farm),
        }
    }
}

impl From<QueryKey> for KeyPattern {
    fn from(key: QueryKey) -> Self {
        Self::Exact(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_keys() -> Vec<QueryKey> {
        let farm = FarmId::new(3);
        let crop = CropId::new(8);
        vec![
            QueryKey::CurrentUser,
            QueryKey::Farms,
            QueryKey::Farm(farm),
            QueryKey::FarmCrops(farm),
            QueryKey::FarmWeather(farm),
            QueryKey::FarmForecast { farm, days: 5 },
            QueryKey::FarmRecommendations(farm),
            QueryKey::DiseaseHistory(farm),
            QueryKey::Irrigation { farm, crop },
            QueryKey::Fertilizer { farm, crop },
        ]
    }

    #[test]
    fn keys_render_as_resource_paths() {
        let rendered: Vec<String> = all_keys().iter().map(ToString::to_string).collect();
        insta::assert_snapshot!(rendered.join("\n"), @r"
        auth/me
        farms
        farms/3
        farms/3/crops
        farms/3/weather
        farms/3/weather/forecast?days=5
        farms/3/recommendations
        farms/3/disease-history
        farms/3/crops/8/irrigation
        farms/3/crops/8/fertilizer
        ");
    }

    #[test]
    fn farm_pattern_skips_unscoped_keys() {
        let pattern = KeyPattern::Farm(FarmId::new(3));
        let matched: Vec<QueryKind> = all_keys()
            .iter()
            .filter(|k| pattern.matches(k))
            .map(QueryKey::kind)
            .collect();
        assert_eq!(matched.len(), 8);
        assert!(!matched.contains(&QueryKind::Farms));
        assert!(!pattern.matches(&QueryKey::Farm(FarmId::new(4))));
    }

    #[test]
    fn kind_pattern_ignores_parameters() {
        let pattern = KeyPattern::Kind(QueryKind::FarmForecast);
        assert!(pattern.matches(&QueryKey::FarmForecast {
            farm: FarmId::new(1),
            days: 2
        }));
        assert!(!pattern.matches(&QueryKey::FarmWeather(FarmId::new(1))));
    }
}
