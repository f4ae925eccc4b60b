use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ForecastResponse, HealthResponse, WeatherResponse};

impl ApiClient {
    /// Current conditions at the farm's coordinates.
    pub async fn farm_weather(&self, farm_id: i64) -> Result<WeatherResponse, Error> {
        self.get(&format!("farms/{farm_id}/weather")).await
    }

    /// Three-hourly forecast covering `days` days.
    pub async fn farm_forecast(&self, farm_id: i64, days: u8) -> Result<ForecastResponse, Error> {
        self.get_with_params(
            &format!("farms/{farm_id}/weather/forecast"),
            &[("days", days.to_string())],
        )
        .await
    }

    /// Liveness probe; does not require a token.
    pub async fn health(&self) -> Result<HealthResponse, Error> {
        self.get("health").await
    }
}
