use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{CropBody, CropResponse};

impl ApiClient {
    pub async fn farm_crops(&self, farm_id: i64) -> Result<Vec<CropResponse>, Error> {
        self.get(&format!("farms/{farm_id}/crops")).await
    }

    /// Create a crop. The owning farm travels in the body, not the path.
    pub async fn create_crop(&self, body: &CropBody) -> Result<CropResponse, Error> {
        self.post("crops", body).await
    }
}
