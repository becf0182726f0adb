//! Thin REST client for the wandelen server

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::{
    CheckoutSummary, MessageResponse, OtpRequest, OtpVerifyRequest, Page, SessionResponse,
    UserSummary, UserType, VerifyCheckoutRequest, VideoInfo,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session expired or invalid, please log in again")]
    Unauthorized,

    #[error("{message} ({status})")]
    Server { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base: &str, token: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = match resp.json::<ErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
            };
            return Err(ApiError::Server { status, message });
        }
        Ok(resp.json().await?)
    }

    pub async fn request_otp(&self, email: &str, user_type: UserType) -> Result<MessageResponse, ApiError> {
        let body = OtpRequest {
            email: email.to_string(),
            user_type,
        };
        self.send(self.request(Method::POST, "/utils/otp/request").json(&body))
            .await
    }

    pub async fn verify_otp(
        &self,
        email: &str,
        user_type: UserType,
        otp: &str,
    ) -> Result<SessionResponse, ApiError> {
        let body = OtpVerifyRequest {
            email: email.to_string(),
            user_type,
            otp: otp.to_string(),
        };
        self.send(self.request(Method::POST, "/utils/otp/verify").json(&body))
            .await
    }

    pub async fn me(&self) -> Result<UserSummary, ApiError> {
        self.send(self.request(Method::GET, "/utils/me")).await
    }

    pub async fn logout(&self) -> Result<MessageResponse, ApiError> {
        self.send(self.request(Method::POST, "/utils/logout")).await
    }

    /// Videos visible to the logged-in role
    pub async fn videos(&self, user_type: UserType, query: &VideoQuery) -> Result<Page<VideoInfo>, ApiError> {
        let path = match user_type {
            UserType::Admin => "/admin/videos",
            UserType::Client => "/client/videos",
            UserType::Volunteer => "/volunteer/videos",
            UserType::Organization => {
                return Err(ApiError::Server {
                    status: StatusCode::FORBIDDEN,
                    message: "Organizations have no video library".to_string(),
                })
            }
        };
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn verify_checkout(&self, session_id: &str, email: &str) -> Result<CheckoutSummary, ApiError> {
        let body = VerifyCheckoutRequest {
            session_id: session_id.to_string(),
            email: email.to_string(),
        };
        self.send(self.request(Method::POST, "/utils/verify-checkout").json(&body))
            .await
    }
}
