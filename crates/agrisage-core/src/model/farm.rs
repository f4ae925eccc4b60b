// ── Farm domain types ──

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

use super::crop::Crop;
use super::ids::{FarmId, FarmerId};
use crate::error::CoreError;

/// Soil classification of a farm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SoilType {
    Sandy,
    Loamy,
    Clay,
    Silty,
    /// A value this client does not know. Never sent back to the server.
    Unknown,
}

/// A validated geocoordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Latitude must lie in [-90, 90] and longitude in [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::invalid(
                "latitude",
                format!("latitude must be between -90 and 90, got {latitude}"),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::invalid(
                "longitude",
                format!("longitude must be between -180 and 180, got {longitude}"),
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Trust coordinates that came from the server as-is.
    pub(crate) const fn from_server(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// The canonical Farm type. Crops arrive embedded in every farm response.
#[derive(Debug, Clone, Serialize)]
pub struct Farm {
    pub id: FarmId,
    pub farmer_id: Option<FarmerId>,
    pub name: String,
    pub size_acres: f64,
    pub soil_type: SoilType,
    pub location: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub crops: Vec<Crop>,
}

impl Farm {
    /// Acres planted across all crops.
    pub fn planted_acres(&self) -> f64 {
        self.crops.iter().map(|c| c.area_acres).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_at_the_bounds_are_accepted() {
        assert!(GeoPoint::new(90.0, -180.0).is_ok());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn out_of_range_coordinates_name_the_field() {
        match GeoPoint::new(91.0, 0.0) {
            Err(CoreError::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("latitude")),
            other => panic!("expected validation error, got {other:?}"),
        }
        match GeoPoint::new(0.0, -180.5) {
            Err(CoreError::Validation { field, .. }) => {
                assert_eq!(field.as_deref(), Some("longitude"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn soil_type_parses_case_insensitively() {
        assert_eq!("Loamy".parse::<SoilType>().unwrap(), SoilType::Loamy);
        assert!("peat".parse::<SoilType>().is_err());
        assert_eq!(SoilType::Silty.to_string(), "silty");
    }
}
