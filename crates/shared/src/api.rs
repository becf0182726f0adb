use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Roles and statuses
// ============================================================================

/// Kind of account a session belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Admin,
    Client,
    Organization,
    Volunteer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "admin",
            UserType::Client => "client",
            UserType::Organization => "organization",
            UserType::Volunteer => "volunteer",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for UserType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserType::Admin),
            "client" => Ok(UserType::Client),
            "organization" | "org" => Ok(UserType::Organization),
            "volunteer" => Ok(UserType::Volunteer),
            other => Err(ParseEnumError {
                kind: "user type",
                value: other.to_string(),
            }),
        }
    }
}

/// Moderation state of an uploaded video
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Approved => "approved",
            VideoStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for VideoStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VideoStatus::Pending),
            "approved" => Ok(VideoStatus::Approved),
            "rejected" => Ok(VideoStatus::Rejected),
            other => Err(ParseEnumError {
                kind: "video status",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle of a signup waiting on payment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignupStatus {
    Pending,
    Completed,
    Expired,
}

impl SignupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignupStatus::Pending => "pending",
            SignupStatus::Completed => "completed",
            SignupStatus::Expired => "expired",
        }
    }
}

impl FromStr for SignupStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SignupStatus::Pending),
            "completed" => Ok(SignupStatus::Completed),
            "expired" => Ok(SignupStatus::Expired),
            other => Err(ParseEnumError {
                kind: "signup status",
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    pub email: String,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyRequest {
    pub email: String,
    pub user_type: UserType,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// Minimal description of the logged-in account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub user_type: UserType,
}

/// Returned by every endpoint that opens a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub session_id: String,
    pub user_type: UserType,
    pub user_id: String,
    pub user: UserSummary,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Checkout
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCheckoutRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub email: String,
}

/// Flat summary of a paid Checkout Session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub success: bool,
    pub session_id: String,
    pub email: String,
    pub payment_status: String,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupCheckoutRequest {
    pub email: String,
    pub plan: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupCheckoutResponse {
    pub success: bool,
    /// Hosted Stripe page the browser is sent to
    pub checkout_url: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub plan: Option<String>,
    pub status: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub in_trial: bool,
}

// ============================================================================
// Content
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub vimeo_uri: Option<String>,
    pub thumbnail_url: Option<String>,
    pub uploaded_by: String,
    pub uploader_type: UserType,
    pub status: VideoStatus,
    pub views: i64,
    pub created_at: Option<String>,
}

/// One page of a filtered, sorted listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

// ============================================================================
// Envelopes
// ============================================================================

/// `{ success, message }` body used for acknowledgements and errors alike
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_serialization() {
        let json = serde_json::to_string(&UserType::Organization).unwrap();
        assert_eq!(json, "\"organization\"");

        let parsed: UserType = serde_json::from_str("\"volunteer\"").unwrap();
        assert_eq!(parsed, UserType::Volunteer);
    }

    #[test]
    fn test_user_type_from_str_accepts_org_alias() {
        assert_eq!("org".parse::<UserType>().unwrap(), UserType::Organization);
        assert_eq!("admin".parse::<UserType>().unwrap(), UserType::Admin);

        let err = "guest".parse::<UserType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown user type: guest");
    }

    #[test]
    fn test_video_status_default_is_pending() {
        assert_eq!(VideoStatus::default(), VideoStatus::Pending);
        assert_eq!("approved".parse::<VideoStatus>().unwrap(), VideoStatus::Approved);
        assert!("published".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn test_signup_status_strings() {
        for status in [SignupStatus::Pending, SignupStatus::Completed, SignupStatus::Expired] {
            assert_eq!(status.as_str().parse::<SignupStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_otp_verify_request_uses_camel_case() {
        let json = r#"{"email":"a@b.nl","userType":"client","otp":"123456"}"#;
        let req: OtpVerifyRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.user_type, UserType::Client);
        assert_eq!(req.otp, "123456");
    }

    #[test]
    fn test_verify_checkout_request_fields_default_to_empty() {
        let req: VerifyCheckoutRequest = serde_json::from_str("{}").unwrap();
        assert!(req.session_id.is_empty());
        assert!(req.email.is_empty());
    }

    #[test]
    fn test_checkout_summary_serialization() {
        let summary = CheckoutSummary {
            success: true,
            session_id: "cs_test_1".to_string(),
            email: "walker@example.nl".to_string(),
            payment_status: "paid".to_string(),
            customer_id: Some("cus_1".to_string()),
            subscription_id: None,
            amount_total: Some(999),
            currency: Some("eur".to_string()),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"paymentStatus\":\"paid\""));
        assert!(json.contains("\"amountTotal\":999"));
    }

    #[test]
    fn test_message_response_helpers() {
        let err = MessageResponse::error("Session expired");
        assert!(!err.success);
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"Session expired"}"#);
        assert!(MessageResponse::ok("done").success);
    }
}
