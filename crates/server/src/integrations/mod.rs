//! Clients for the hosted services the platform leans on.
//!
//! Handlers only see the traits below, so tests swap in the fakes from
//! [`fake`] and a deployment without credentials still boots; every call then
//! fails with [`IntegrationError::NotConfigured`].

use async_trait::async_trait;
use thiserror::Error;

pub mod cloudinary;
pub mod stripe;
pub mod vimeo;

#[cfg(test)]
pub mod fake;

pub use cloudinary::{CloudinaryClient, UploadedFile};
pub use stripe::{CheckoutSession, NewCheckout, StripeClient, Subscription};
pub use vimeo::{UploadTicket, VimeoClient, VimeoVideoPage};

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Caller-supplied id that is not a well-formed object id
    #[error("Invalid {service} id: {id}")]
    InvalidId { service: &'static str, id: String },

    #[error("{service} returned {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
}

/// Stripe Checkout and Billing
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, checkout: &NewCheckout) -> Result<CheckoutSession, IntegrationError>;

    async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, IntegrationError>;

    async fn retrieve_subscription(&self, id: &str) -> Result<Subscription, IntegrationError>;
}

/// Vimeo account that stores the walk videos
#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Reserve a tus upload; the client sends the bytes straight to Vimeo
    async fn create_upload(
        &self,
        name: &str,
        description: Option<&str>,
        size: u64,
    ) -> Result<UploadTicket, IntegrationError>;

    async fn list_videos(&self, page: u32, per_page: u32) -> Result<VimeoVideoPage, IntegrationError>;

    /// Upload and activate a thumbnail, returning its public link
    async fn upload_thumbnail(
        &self,
        video_uri: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, IntegrationError>;

    async fn delete_video(&self, video_uri: &str) -> Result<(), IntegrationError>;
}

/// Cloudinary unsigned uploads for photos and documents
#[async_trait]
pub trait FileHost: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadedFile, IntegrationError>;
}

/// Turn a non-2xx response into an [`IntegrationError::Api`], keeping the
/// provider's own message when the body carries one
pub(crate) async fn check_response(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value["error"]["message"]
                .as_str()
                .or_else(|| value["error"].as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    Err(IntegrationError::Api {
        service,
        status: status.as_u16(),
        message,
    })
}
