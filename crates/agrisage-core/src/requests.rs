// ── Typed, validated mutation requests ──
//
// Each request checks its own invariants and only then turns into a wire
// body, so an invalid request never reaches the network.

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use agrisage_api::models::{CropBody, FarmBody, RegisterRequest};

use crate::error::CoreError;
use crate::model::{FarmId, GeoPoint, GrowthStage, SoilType};

fn require_name(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid(field, format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_positive(field: &str, value: f64) -> Result<(), CoreError> {
    // NaN fails this comparison too.
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::invalid(
            field,
            format!("{field} must be greater than zero, got {value}"),
        ))
    }
}

// ── Farm ───────────────────────────────────────────────────────────

/// Body of both farm creation and farm update (updates replace every field).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmRequest {
    pub name: String,
    pub size_acres: f64,
    pub soil_type: SoilType,
    pub latitude: f64,
    pub longitude: f64,
}

impl FarmRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_name("name", &self.name)?;
        require_positive("size_acres", self.size_acres)?;
        if self.soil_type == SoilType::Unknown {
            return Err(CoreError::invalid("soil_type", "soil type is required"));
        }
        GeoPoint::new(self.latitude, self.longitude)?;
        Ok(())
    }

    pub(crate) fn into_body(self) -> Result<FarmBody, CoreError> {
        self.validate()?;
        Ok(FarmBody {
            name: self.name.trim().to_owned(),
            size_acres: self.size_acres,
            soil_type: self.soil_type.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

// ── Crop ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCropRequest {
    pub farm: FarmId,
    pub name: String,
    pub planting_date: NaiveDate,
    pub expected_harvest_date: Option<NaiveDate>,
    pub stage: GrowthStage,
    pub area_acres: f64,
}

impl CreateCropRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_name("crop_name", &self.name)?;
        require_positive("area_planted", self.area_acres)?;
        if self.stage == GrowthStage::Unknown {
            return Err(CoreError::invalid("current_stage", "growth stage is required"));
        }
        if let Some(harvest) = self.expected_harvest_date {
            if harvest < self.planting_date {
                return Err(CoreError::invalid(
                    "expected_harvest_date",
                    format!(
                        "expected harvest {harvest} is before planting date {}",
                        self.planting_date
                    ),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn into_body(self) -> Result<CropBody, CoreError> {
        self.validate()?;
        Ok(CropBody {
            farm_id: self.farm.get(),
            crop_name: self.name.trim().to_owned(),
            planting_date: self.planting_date.and_time(chrono::NaiveTime::MIN),
            expected_harvest_date: self
                .expected_harvest_date
                .map(|d| d.and_time(chrono::NaiveTime::MIN)),
            current_stage: self.stage.to_string(),
            area_planted: self.area_acres,
        })
    }
}

// ── Account ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewFarmer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub password: SecretString,
}

impl NewFarmer {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_name("name", &self.name)?;
        require_name("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(CoreError::invalid("email", "email address is missing '@'"));
        }
        if self.password.expose_secret().is_empty() {
            return Err(CoreError::invalid("password", "password must not be empty"));
        }
        Ok(())
    }

    pub(crate) fn into_body(self) -> Result<RegisterRequest, CoreError> {
        self.validate()?;
        Ok(RegisterRequest {
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            phone: self.phone,
            location: self.location,
            password: self.password.expose_secret().to_owned(),
        })
    }
}
