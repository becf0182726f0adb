use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{UserSummary, UserType, VideoInfo};
use sqlx::types::Json;
use sqlx::FromRow;

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub ip_addresses: Json<Vec<String>>,
    pub org_ids: Json<Vec<String>>,
    pub client_ids: Json<Vec<String>>,
    pub videos_uploaded: Json<Vec<String>>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub org_id: Option<String>,
    pub plan: Option<String>,
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default = "default_subscription_status")]
    pub subscription_status: String,
    #[serde(skip)]
    pub stripe_customer_id: Option<String>,
    #[serde(skip)]
    pub stripe_subscription_id: Option<String>,
    #[serde(skip)]
    pub trial_ends_at: Option<DateTime<Utc>>,
}

fn default_subscription_status() -> String {
    "none".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub org_id: Option<String>,
    pub plan: Option<String>,
    pub subscription_status: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub email: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrganization {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVolunteer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl Admin {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            email: self.email.clone(),
            name: None,
            user_type: UserType::Admin,
        }
    }
}

impl Client {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            email: self.email.clone(),
            name: Some(format!("{} {}", self.first_name, self.last_name)),
            user_type: UserType::Client,
        }
    }
}

impl Organization {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            email: self.email.clone(),
            name: Some(self.name.clone()),
            user_type: UserType::Organization,
        }
    }
}

impl Volunteer {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            email: self.email.clone(),
            name: Some(format!("{} {}", self.first_name, self.last_name)),
            user_type: UserType::Volunteer,
        }
    }
}

// ============================================================================
// Content
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub vimeo_uri: Option<String>,
    pub thumbnail_url: Option<String>,
    pub uploaded_by: String,
    pub uploader_type: String,
    pub status: String,
    pub views: i64,
    pub created_at: Option<String>,
}

impl Video {
    pub fn info(&self) -> VideoInfo {
        VideoInfo {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            vimeo_uri: self.vimeo_uri.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            uploaded_by: self.uploaded_by.clone(),
            uploader_type: self.uploader_type.parse().unwrap_or(UserType::Volunteer),
            status: self.status.parse().unwrap_or_default(),
            views: self.views,
            created_at: self.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub vimeo_uri: Option<String>,
    pub uploaded_by: String,
    pub uploader_type: UserType,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_name: String,
    pub comment_text: String,
    pub stars: i64,
    pub user_id: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub photo_url: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedia {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub photo_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub text: String,
    pub photo_url: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestimonial {
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialUpdate {
    pub name: Option<String>,
    pub text: Option<String>,
    pub photo_url: Option<String>,
}

// ============================================================================
// Sessions and signups
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct StoredSession {
    pub session_id: String,
    pub email: String,
    pub user_type: String,
    pub user_id: String,
    pub active: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSignup {
    pub id: String,
    pub email: String,
    pub plan: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub stripe_checkout_session_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub status: String,
    pub created_at: Option<String>,
}
