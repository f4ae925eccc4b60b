use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{FarmBody, FarmResponse};

impl ApiClient {
    /// All farms of the current farmer, each with its crops embedded.
    pub async fn list_farms(&self) -> Result<Vec<FarmResponse>, Error> {
        self.get("farms").await
    }

    pub async fn get_farm(&self, farm_id: i64) -> Result<FarmResponse, Error> {
        self.get(&format!("farms/{farm_id}")).await
    }

    pub async fn create_farm(&self, body: &FarmBody) -> Result<FarmResponse, Error> {
        self.post("farms", body).await
    }

    /// Replace every editable field of a farm.
    pub async fn update_farm(&self, farm_id: i64, body: &FarmBody) -> Result<FarmResponse, Error> {
        self.put(&format!("farms/{farm_id}"), body).await
    }
}
