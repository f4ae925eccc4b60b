// Disease detection endpoints
//
// Detection uploads one image as the multipart field `image`; history is
// a plain JSON listing of past detections for a farm.

use std::path::Path;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{DetectionRecordResponse, DetectionResponse};

/// An image ready for upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: &'static str,
    pub data: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name);
        Self {
            file_name,
            mime_type,
            data: data.into(),
        }
    }

    /// Read an image from disk.
    pub async fn from_path(path: &Path) -> Result<Self, Error> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image.jpg".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// MIME type from the extension; the server only needs it to be an image.
fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

impl ApiClient {
    /// Submit a crop photo for classification.
    pub async fn detect_disease(
        &self,
        farm_id: i64,
        crop_id: i64,
        image: ImageUpload,
    ) -> Result<DetectionResponse, Error> {
        debug!(
            file = %image.file_name,
            bytes = image.len(),
            "uploading image for disease detection"
        );
        let part = Part::bytes(image.data.to_vec())
            .file_name(image.file_name)
            .mime_str(image.mime_type)?;
        let form = Form::new().part("image", part);

        self.post_multipart(
            &format!("farms/{farm_id}/crops/{crop_id}/disease-detection"),
            form,
        )
        .await
    }

    /// Past detections recorded for a farm.
    pub async fn disease_history(&self, farm_id: i64) -> Result<Vec<DetectionRecordResponse>, Error> {
        self.get(&format!("farms/{farm_id}/disease-history")).await
    }
}
