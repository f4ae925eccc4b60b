// ── Weather domain types ──

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

/// Where the server got its weather from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeatherSource {
    Live,
    /// Synthesized by the server because no weather provider is configured.
    Mock,
}

impl WeatherSource {
    pub fn from_server(raw: Option<&str>) -> Self {
        match raw {
            Some("mock_data" | "mock") => Self::Mock,
            _ => Self::Live,
        }
    }
}

/// Current conditions at a farm.
#[derive(Debug, Clone, Serialize)]
pub struct Weather {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub pressure_hpa: Option<f64>,
    pub wind_speed_ms: f64,
    pub wind_direction_deg: Option<f64>,
    pub rainfall_mm: f64,
    pub description: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
    pub source: WeatherSource,
}

/// One three-hour forecast slot.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastEntry {
    /// `None` when the server sent a time this client could not read.
    pub time: Option<DateTime<Utc>>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub rainfall_mm: f64,
    pub wind_speed_ms: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub city: Option<String>,
    pub country: Option<String>,
    pub source: WeatherSource,
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    /// Total rain expected over the forecast window.
    pub fn total_rainfall_mm(&self) -> f64 {
        self.entries.iter().map(|e| e.rainfall_mm).sum()
    }
}
