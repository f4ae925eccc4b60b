// ── API-to-domain type conversions ──
//
// Bridges raw `agrisage_api::models` response types into canonical
// `agrisage_core::model` types. Enumerated strings are parsed leniently:
// an unexpected value degrades one field, never the whole response.

use chrono::DateTime;

use agrisage_api::models::{
    CropResponse, DetectionRecordResponse, DetectionResponse, FarmResponse, FarmerResponse,
    FertilizerResponse, ForecastEntryResponse, ForecastResponse, IrrigationResponse,
    RecommendationResponse, WeatherResponse, timestamp,
};

use crate::model::{
    Advice, Confidence, Crop, CropId, Detection, DetectionId, Farm, FarmId, Farmer, FarmerId,
    Forecast, ForecastEntry, GeoPoint, GrowthStage, Priority, Recommendation, RecommendationId,
    RecommendationKind, RecommendationStatus, Severity, SoilType, Weather, WeatherSource,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Server confidences are already in range; clamp anyway and treat an
/// unreadable value as zero.
fn confidence(raw: f64) -> Confidence {
    Confidence::new(raw).unwrap_or(Confidence::ZERO)
}

// ── Farms & crops ──────────────────────────────────────────────────

impl From<CropResponse> for Crop {
    fn from(c: CropResponse) -> Self {
        Self {
            id: CropId::new(c.id),
            farm_id: FarmId::new(c.farm_id),
            name: c.crop_name,
            planting_date: c.planting_date,
            expected_harvest_date: c.expected_harvest_date,
            stage: c.current_stage.parse().unwrap_or(GrowthStage::Unknown),
            area_acres: c.area_planted,
            created_at: c.created_at,
        }
    }
}

impl From<FarmResponse> for Farm {
    fn from(f: FarmResponse) -> Self {
        Self {
            id: FarmId::new(f.id),
            farmer_id: f.farmer_id.map(FarmerId::new),
            name: f.name,
            size_acres: f.size_acres,
            soil_type: f.soil_type.parse().unwrap_or(SoilType::Unknown),
            location: GeoPoint::from_server(f.latitude, f.longitude),
            created_at: f.created_at,
            crops: f.crops.into_iter().map(Crop::from).collect(),
        }
    }
}

impl From<FarmerResponse> for Farmer {
    fn from(f: FarmerResponse) -> Self {
        Self {
            id: FarmerId::new(f.id),
            name: f.name,
            email: f.email,
            phone: f.phone,
            location: f.location,
            active: f.is_active,
            created_at: f.created_at,
        }
    }
}

// ── Weather ────────────────────────────────────────────────────────

impl From<WeatherResponse> for Weather {
    fn from(w: WeatherResponse) -> Self {
        Self {
            temperature_c: w.temperature,
            humidity_pct: w.humidity,
            pressure_hpa: w.pressure,
            wind_speed_ms: w.wind_speed,
            wind_direction_deg: w.wind_direction,
            rainfall_mm: w.rainfall,
            description: w.description,
            observed_at: w.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            source: WeatherSource::from_server(w.source.as_deref()),
        }
    }
}

impl From<ForecastEntryResponse> for ForecastEntry {
    fn from(e: ForecastEntryResponse) -> Self {
        Self {
            time: timestamp::parse(&e.datetime),
            temperature_c: e.temperature,
            humidity_pct: e.humidity,
            rainfall_mm: e.rainfall,
            wind_speed_ms: e.wind_speed,
            description: e.description,
        }
    }
}

impl From<ForecastResponse> for Forecast {
    fn from(f: ForecastResponse) -> Self {
        Self {
            city: f.city,
            country: f.country,
            source: WeatherSource::from_server(f.source.as_deref()),
            entries: f.forecast.into_iter().map(ForecastEntry::from).collect(),
        }
    }
}

// ── Recommendations ────────────────────────────────────────────────

impl From<RecommendationResponse> for Recommendation {
    fn from(r: RecommendationResponse) -> Self {
        Self {
            id: Some(RecommendationId::new(r.id)),
            farm_id: FarmId::new(r.farm_id),
            crop_id: r.crop_id.map(CropId::new),
            kind: RecommendationKind::from_server(&r.recommendation_type),
            priority: Priority::from_server(&r.priority),
            status: RecommendationStatus::from_server(&r.status),
            title: r.title,
            description: r.description,
            created_at: Some(r.created_at),
            updated_at: r.updated_at,
            advice: None,
        }
    }
}

pub(crate) fn irrigation_recommendation(
    farm: FarmId,
    crop: CropId,
    r: IrrigationResponse,
) -> Recommendation {
    let advice = Advice::Irrigation {
        water_litres: r.recommended_water_amount,
        frequency: r.frequency,
        best_time: r.best_time,
    };
    Recommendation::from_advice(farm, crop, advice, r.reason)
}

pub(crate) fn fertilizer_recommendation(
    farm: FarmId,
    crop: CropId,
    r: FertilizerResponse,
) -> Recommendation {
    let advice = Advice::Fertilizer {
        product: r.fertilizer_type,
        kg_per_acre: r.amount_per_acre,
        method: r.application_method,
        timing: r.timing,
    };
    Recommendation::from_advice(farm, crop, advice, r.reason)
}

// ── Disease detection ──────────────────────────────────────────────

/// A fresh detection. The response does not echo the farm or crop.
pub(crate) fn detection_result(farm: FarmId, crop: CropId, r: DetectionResponse) -> Detection {
    let confidence = confidence(r.confidence);
    let severity = r
        .severity
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| Severity::from_confidence(confidence));

    Detection {
        id: None,
        farm_id: farm,
        crop_id: crop,
        disease: r.disease_name,
        confidence,
        severity,
        detected_at: Some(chrono::Utc::now()),
        image_path: None,
        treatments: r.treatment_recommendations,
        prevention: r.prevention_tips,
    }
}

impl From<DetectionRecordResponse> for Detection {
    fn from(r: DetectionRecordResponse) -> Self {
        let confidence = confidence(r.confidence_score);
        Self {
            id: Some(DetectionId::new(r.id)),
            farm_id: FarmId::new(r.farm_id),
            crop_id: CropId::new(r.crop_id),
            disease: r.predicted_disease,
            confidence,
            severity: Severity::from_confidence(confidence),
            detected_at: Some(r.detection_date),
            image_path: r.image_path,
            treatments: Vec::new(),
            prevention: Vec::new(),
        }
    }
}
