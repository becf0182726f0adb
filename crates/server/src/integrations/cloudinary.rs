use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::{check_response, FileHost, IntegrationError};
use crate::config::CloudinaryConfig;

const SERVICE: &str = "Cloudinary";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(alias = "secure_url")]
    pub url: String,
    #[serde(alias = "public_id")]
    pub public_id: String,
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(http: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl FileHost for CloudinaryClient {
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadedFile, IntegrationError> {
        let (cloud_name, preset) = match (&self.config.cloud_name, &self.config.upload_preset) {
            (Some(cloud), Some(preset)) => (cloud, preset),
            _ => return Err(IntegrationError::NotConfigured(SERVICE)),
        };

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", preset.clone());

        let url = format!(
            "{}/v1_1/{}/auto/upload",
            self.config.api_base.trim_end_matches('/'),
            cloud_name
        );
        let response = self.http.post(url).multipart(form).send().await?;
        let uploaded = check_response(SERVICE, response).await?.json().await?;
        Ok(uploaded)
    }
}
