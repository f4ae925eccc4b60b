// Wire types for the advisory API.
//
// These mirror the JSON the server sends and accepts, field for field.
// Enumerated values stay `String` here; `agrisage-core` parses them into
// domain enums so an unexpected value never fails a whole response.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Timestamps arrive either as RFC 3339 or as naive ISO-8601 (the server
/// serializes naive datetimes without an offset). Naive values are UTC.
pub mod timestamp {
    use super::{DateTime, Deserialize, Deserializer, NaiveDateTime, Utc};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use super::{DateTime, Deserialize, Deserializer, Utc};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            match raw {
                None => Ok(None),
                Some(s) => super::parse(&s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
            }
        }
    }
}

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".into()
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FarmerResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

// ── Farms ───────────────────────────────────────────────────────────

/// Body for both `POST /farms` and `PUT /farms/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmBody {
    pub name: String,
    pub size_acres: f64,
    pub soil_type: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FarmResponse {
    pub id: i64,
    #[serde(default)]
    pub farmer_id: Option<i64>,
    pub name: String,
    pub size_acres: f64,
    pub soil_type: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub crops: Vec<CropResponse>,
}

// ── Crops ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropBody {
    pub farm_id: i64,
    pub crop_name: String,
    pub planting_date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_harvest_date: Option<NaiveDateTime>,
    pub current_stage: String,
    pub area_planted: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CropResponse {
    pub id: i64,
    pub farm_id: i64,
    pub crop_name: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub planting_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub expected_harvest_date: Option<DateTime<Utc>>,
    pub current_stage: String,
    pub area_planted: f64,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

// ── Weather ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherResponse {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default)]
    pub pressure: Option<f64>,
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub rainfall: f64,
    #[serde(default)]
    pub description: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// `"mock_data"` when the server had no live weather provider.
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntryResponse {
    pub datetime: String,
    pub temperature: f64,
    pub humidity: f64,
    #[serde(default)]
    pub rainfall: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub forecast: Vec<ForecastEntryResponse>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

// ── Recommendations ─────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationResponse {
    pub id: i64,
    pub farm_id: i64,
    #[serde(default)]
    pub crop_id: Option<i64>,
    pub recommendation_type: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IrrigationResponse {
    /// Litres.
    pub recommended_water_amount: f64,
    pub frequency: String,
    pub best_time: String,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FertilizerResponse {
    pub fertilizer_type: String,
    /// Kilograms per acre.
    pub amount_per_acre: f64,
    pub application_method: String,
    pub timing: String,
    pub reason: String,
}

// ── Disease detection ───────────────────────────────────────────────

/// Result of `POST .../disease-detection`.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionResponse {
    pub disease_name: String,
    pub confidence: f64,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub treatment_recommendations: Vec<String>,
    #[serde(default)]
    pub prevention_tips: Vec<String>,
}

/// One row of `GET /farms/{id}/disease-history`.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionRecordResponse {
    pub id: i64,
    pub farm_id: i64,
    pub crop_id: i64,
    pub predicted_disease: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub detection_date: DateTime<Utc>,
}

// ── Misc ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// FastAPI error body: `{"detail": "..."}` or
/// `{"detail": [{"loc": [...], "msg": "...", "type": "..."}]}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldError {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl ErrorDetail {
    /// Flatten the detail into one human-readable line.
    pub(crate) fn into_message(self) -> String {
        match self {
            Self::Message(m) => m,
            Self::Fields(fields) => fields
                .into_iter()
                .map(|f| {
                    let loc = f
                        .loc
                        .iter()
                        .filter(|v| v.as_str() != Some("body"))
                        .map(|v| match v {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(".");
                    if loc.is_empty() {
                        f.msg
                    } else {
                        format!("{loc}: {}", f.msg)
                    }
                })
                .collect::<Vec<_>>()
                .join("; "),
            Self::Other(v) => v.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn naive_and_offset_timestamps_both_parse() {
        let a = timestamp::parse("2024-03-01T00:00:00").unwrap();
        let b = timestamp::parse("2024-03-01T00:00:00Z").unwrap();
        let c = timestamp::parse("2024-03-01 00:00:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn crop_without_optional_dates() {
        let crop: CropResponse = serde_json::from_value(json!({
            "id": 3,
            "farm_id": 1,
            "crop_name": "Maize",
            "planting_date": "2024-03-01T00:00:00",
            "current_stage": "vegetative",
            "area_planted": 1.5
        }))
        .unwrap();
        assert!(crop.expected_harvest_date.is_none());
        assert!(crop.created_at.is_none());
    }

    #[test]
    fn validation_detail_flattens_field_errors() {
        let body: ErrorBody = serde_json::from_value(json!({
            "detail": [
                {"loc": ["body", "latitude"], "msg": "field required", "type": "value_error.missing"},
                {"loc": ["body", "size_acres"], "msg": "value is not a valid float", "type": "type_error.float"}
            ]
        }))
        .unwrap();
        assert_eq!(
            body.detail.into_message(),
            "latitude: field required; size_acres: value is not a valid float"
        );
    }

    #[test]
    fn string_detail_is_verbatim() {
        let body: ErrorBody =
            serde_json::from_value(json!({"detail": "Email already registered"})).unwrap();
        assert_eq!(body.detail.into_message(), "Email already registered");
    }

    #[test]
    fn crop_body_skips_absent_harvest_date() {
        let body = CropBody {
            farm_id: 1,
            crop_name: "Wheat-A".into(),
            planting_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            expected_harvest_date: None,
            current_stage: "seedling".into(),
            area_planted: 2.5,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["planting_date"], "2024-03-01T00:00:00");
        assert!(v.get("expected_harvest_date").is_none());
    }
}
