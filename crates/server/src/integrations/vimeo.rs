use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{check_response, IntegrationError, VideoHost};
use crate::config::VimeoConfig;

const SERVICE: &str = "Vimeo";
const ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    /// `/videos/{id}` of the reserved video
    pub uri: String,
    /// tus endpoint the bytes are PATCHed to
    pub upload_link: String,
}

#[derive(Debug, Deserialize)]
struct CreateVideoResponse {
    uri: String,
    upload: UploadSection,
}

#[derive(Debug, Deserialize)]
struct UploadSection {
    upload_link: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VimeoVideo {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub duration: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VimeoVideoPage {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub data: Vec<VimeoVideo>,
}

#[derive(Debug, Deserialize)]
struct PictureResource {
    uri: String,
    link: String,
}

pub struct VimeoClient {
    http: reqwest::Client,
    config: VimeoConfig,
}

impl VimeoClient {
    pub fn new(http: reqwest::Client, config: VimeoConfig) -> Self {
        Self { http, config }
    }

    fn token(&self) -> Result<&str, IntegrationError> {
        self.config
            .access_token
            .as_deref()
            .ok_or(IntegrationError::NotConfigured(SERVICE))
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl VideoHost for VimeoClient {
    async fn create_upload(
        &self,
        name: &str,
        description: Option<&str>,
        size: u64,
    ) -> Result<UploadTicket, IntegrationError> {
        let response = self
            .http
            .post(self.url("/me/videos"))
            .bearer_auth(self.token()?)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .json(&json!({
                "upload": { "approach": "tus", "size": size },
                "name": name,
                "description": description.unwrap_or_default(),
            }))
            .send()
            .await?;
        let created: CreateVideoResponse = check_response(SERVICE, response).await?.json().await?;
        Ok(UploadTicket {
            uri: created.uri,
            upload_link: created.upload.upload_link,
        })
    }

    async fn list_videos(&self, page: u32, per_page: u32) -> Result<VimeoVideoPage, IntegrationError> {
        let response = self
            .http
            .get(self.url("/me/videos"))
            .bearer_auth(self.token()?)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("fields", "uri,name,description,link,duration".to_string()),
            ])
            .send()
            .await?;
        let page = check_response(SERVICE, response).await?.json().await?;
        Ok(page)
    }

    async fn upload_thumbnail(
        &self,
        video_uri: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, IntegrationError> {
        let token = self.token()?;

        // 1. Reserve a picture resource
        let response = self
            .http
            .post(self.url(&format!("{}/pictures", video_uri)))
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await?;
        let picture: PictureResource = check_response(SERVICE, response).await?.json().await?;

        // 2. Send the image bytes to the upload link
        let response = self
            .http
            .put(&picture.link)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        check_response(SERVICE, response).await?;

        // 3. Make it the active thumbnail
        let response = self
            .http
            .patch(self.url(&picture.uri))
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .json(&json!({ "active": true }))
            .send()
            .await?;
        let activated: PictureResource = check_response(SERVICE, response).await?.json().await?;

        Ok(activated.link)
    }

    async fn delete_video(&self, video_uri: &str) -> Result<(), IntegrationError> {
        let response = self
            .http
            .delete(self.url(video_uri))
            .bearer_auth(self.token()?)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await?;
        check_response(SERVICE, response).await?;
        Ok(())
    }
}
