use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::MessageResponse;
use thiserror::Error;

use crate::integrations::IntegrationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    AuthError(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Payment not completed")]
    PaymentIncomplete { payment_status: String },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),

    #[error("Upstream error: {0}")]
    Upstream(IntegrationError),
}

impl From<IntegrationError> for AppError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::NotConfigured(service) => AppError::NotConfigured(service),
            invalid @ IntegrationError::InvalidId { .. } => AppError::BadRequest(invalid.to_string()),
            other => AppError::Upstream(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::PaymentIncomplete { .. } => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) | AppError::Database(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = match &self {
            AppError::PaymentIncomplete { payment_status } => json!({
                "success": false,
                "message": self.to_string(),
                "paymentStatus": payment_status,
            }),
            // Internal details stay in the log
            AppError::Database(_) => json!(MessageResponse::error("Internal server error")),
            _ => json!(MessageResponse::error(self.to_string())),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let (status, body) = body_json(AppError::BadRequest("Email mismatch".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Email mismatch");
    }

    #[tokio::test]
    async fn test_payment_incomplete_echoes_status() {
        let (status, body) = body_json(AppError::PaymentIncomplete {
            payment_status: "unpaid".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["paymentStatus"], "unpaid");
    }

    #[tokio::test]
    async fn test_database_error_is_hidden() {
        let (status, body) = body_json(AppError::Database(anyhow::anyhow!("no such table: users"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn test_not_configured_integration_maps_to_503() {
        let err: AppError = IntegrationError::NotConfigured("Stripe").into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Stripe is not configured");
    }

    #[test]
    fn test_invalid_object_id_is_bad_request() {
        let err: AppError = IntegrationError::InvalidId {
            service: "Stripe",
            id: "../customers".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_failure_maps_to_500() {
        let err: AppError = IntegrationError::Api {
            service: "Vimeo",
            status: 502,
            message: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
