// Recommendation endpoints
//
// Farm-level recommendations are stored records; irrigation and fertilizer
// advice are computed per crop on every call and have no identity.

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{FertilizerResponse, IrrigationResponse, RecommendationResponse};

impl ApiClient {
    /// Stored recommendations for a farm. The server may generate the day's
    /// automatic recommendations as a side effect of this call.
    pub async fn farm_recommendations(
        &self,
        farm_id: i64,
    ) -> Result<Vec<RecommendationResponse>, Error> {
        self.get(&format!("farms/{farm_id}/recommendations")).await
    }

    pub async fn irrigation_advice(
        &self,
        farm_id: i64,
        crop_id: i64,
    ) -> Result<IrrigationResponse, Error> {
        self.get(&format!("farms/{farm_id}/crops/{crop_id}/irrigation"))
            .await
    }

    pub async fn fertilizer_advice(
        &self,
        farm_id: i64,
        crop_id: i64,
    ) -> Result<FertilizerResponse, Error> {
        self.get(&format!("farms/{farm_id}/crops/{crop_id}/fertilizer"))
            .await
    }
}
