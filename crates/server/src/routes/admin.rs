//! Back-office endpoints; every route here except `/login` sits behind an
//! admin session.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shared::{MessageResponse, Page, UserSummary, VideoInfo, VideoStatus};

use crate::{
    db::{
        AdminRecord, Client, ClientUpdate, Comment, CountedTable, Media, MediaUpdate, NewClient, NewMedia,
        NewOrganization, NewTestimonial, NewVideo, NewVolunteer, Organization, OrganizationUpdate, Testimonial,
        TestimonialUpdate, VideoUpdate, Volunteer, VolunteerUpdate,
    },
    error::AppError,
    integrations::VimeoVideoPage,
    listing::ListQuery,
    middleware::AuthSession,
    routes::auth::hash_password,
    session::normalize_email,
    state::AppState,
};

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

fn deleted(what: &str, found: bool) -> Result<Json<MessageResponse>, AppError> {
    if found {
        Ok(Json(MessageResponse::ok(format!("{} deleted", what))))
    } else {
        Err(not_found(what))
    }
}

fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

// ============================================================================
// Admins
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NewAdminRequest {
    pub email: String,
    pub password: String,
}

/// POST /admin/admins
pub async fn create_admin(
    State(state): State<AppState>,
    Json(req): Json<NewAdminRequest>,
) -> Result<Json<UserSummary>, AppError> {
    let email = normalize_email(&req.email);
    require(&email, "email")?;
    if req.password.len() < 8 {
        return Err(AppError::BadRequest("Password must be at least 8 characters".to_string()));
    }
    if state.db.get_admin_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }

    let admin = state.db.create_admin(&email, &hash_password(&req.password)?).await?;
    tracing::info!("Admin account created for {}", admin.email);
    Ok(Json(admin.summary()))
}

// ============================================================================
// Clients
// ============================================================================

/// GET /admin/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Client>>, AppError> {
    Ok(Json(query.apply(state.db.list_clients().await?)))
}

/// POST /admin/clients
pub async fn create_client(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(mut req): Json<NewClient>,
) -> Result<Json<Client>, AppError> {
    req.email = normalize_email(&req.email);
    require(&req.email, "email")?;
    if state.db.get_client_by_email(&req.email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }
    require_organization(&state, req.org_id.as_deref()).await?;

    let client = state.db.create_client(&req).await?;
    state
        .db
        .record_admin_creation(&session.user_id, AdminRecord::Client, &client.id)
        .await?;
    Ok(Json(client))
}

/// GET /admin/clients/:id
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Client>, AppError> {
    let client = state.db.get_client_by_id(&id).await?.ok_or_else(|| not_found("Client"))?;
    Ok(Json(client))
}

/// PATCH /admin/clients/:id
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ClientUpdate>,
) -> Result<Json<Client>, AppError> {
    require_organization(&state, update.org_id.as_deref()).await?;
    let client = state
        .db
        .update_client(&id, &update)
        .await?
        .ok_or_else(|| not_found("Client"))?;
    Ok(Json(client))
}

/// DELETE /admin/clients/:id
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let found = state.db.delete_client(&id).await?;
    if found {
        state.db.forget_admin_record(AdminRecord::Client, &id).await?;
    }
    deleted("Client", found)
}

async fn require_organization(state: &AppState, org_id: Option<&str>) -> Result<(), AppError> {
    if let Some(org_id) = org_id {
        state
            .db
            .get_organization_by_id(org_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Unknown organization".to_string()))?;
    }
    Ok(())
}

// ============================================================================
// Organizations
// ============================================================================

/// GET /admin/organizations
pub async fn list_organizations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Organization>>, AppError> {
    Ok(Json(query.apply(state.db.list_organizations().await?)))
}

/// POST /admin/organizations
pub async fn create_organization(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(mut req): Json<NewOrganization>,
) -> Result<Json<Organization>, AppError> {
    req.email = normalize_email(&req.email);
    require(&req.email, "email")?;
    require(&req.name, "name")?;
    if state.db.get_organization_by_email(&req.email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }

    let org = state.db.create_organization(&req).await?;
    state
        .db
        .record_admin_creation(&session.user_id, AdminRecord::Organization, &org.id)
        .await?;
    Ok(Json(org))
}

/// GET /admin/organizations/:id
pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Organization>, AppError> {
    let org = state
        .db
        .get_organization_by_id(&id)
        .await?
        .ok_or_else(|| not_found("Organization"))?;
    Ok(Json(org))
}

/// PATCH /admin/organizations/:id
pub async fn update_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<OrganizationUpdate>,
) -> Result<Json<Organization>, AppError> {
    let org = state
        .db
        .update_organization(&id, &update)
        .await?
        .ok_or_else(|| not_found("Organization"))?;
    Ok(Json(org))
}

/// DELETE /admin/organizations/:id
pub async fn delete_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let found = state.db.delete_organization(&id).await?;
    if found {
        state.db.forget_admin_record(AdminRecord::Organization, &id).await?;
    }
    deleted("Organization", found)
}

// ============================================================================
// Volunteers
// ============================================================================

/// GET /admin/volunteers
pub async fn list_volunteers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Volunteer>>, AppError> {
    Ok(Json(query.apply(state.db.list_volunteers().await?)))
}

/// POST /admin/volunteers
pub async fn create_volunteer(
    State(state): State<AppState>,
    Json(mut req): Json<NewVolunteer>,
) -> Result<Json<Volunteer>, AppError> {
    req.email = normalize_email(&req.email);
    require(&req.email, "email")?;
    if state.db.get_volunteer_by_email(&req.email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }
    Ok(Json(state.db.create_volunteer(&req).await?))
}

/// GET /admin/volunteers/:id
pub async fn get_volunteer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Volunteer>, AppError> {
    let volunteer = state
        .db
        .get_volunteer_by_id(&id)
        .await?
        .ok_or_else(|| not_found("Volunteer"))?;
    Ok(Json(volunteer))
}

/// PATCH /admin/volunteers/:id
pub async fn update_volunteer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<VolunteerUpdate>,
) -> Result<Json<Volunteer>, AppError> {
    let volunteer = state
        .db
        .update_volunteer(&id, &update)
        .await?
        .ok_or_else(|| not_found("Volunteer"))?;
    Ok(Json(volunteer))
}

/// DELETE /admin/volunteers/:id
pub async fn delete_volunteer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    deleted("Volunteer", state.db.delete_volunteer(&id).await?)
}

// ============================================================================
// Videos
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub vimeo_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoStatusRequest {
    pub status: VideoStatus,
}

/// GET /admin/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<VideoInfo>>, AppError> {
    let videos = state.db.list_videos().await?.iter().map(|v| v.info()).collect();
    Ok(Json(query.apply(videos)))
}

/// Videos added by an admin skip moderation
/// POST /admin/videos
pub async fn create_video(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<AdminVideoRequest>,
) -> Result<Json<VideoInfo>, AppError> {
    require(&req.title, "title")?;
    let video = state
        .db
        .create_video(&NewVideo {
            title: req.title,
            description: req.description,
            location: req.location,
            vimeo_uri: req.vimeo_uri,
            uploaded_by: session.user_id.clone(),
            uploader_type: session.user_type,
        })
        .await?;
    state.db.set_video_status(&video.id, VideoStatus::Approved).await?;
    state
        .db
        .record_admin_creation(&session.user_id, AdminRecord::Video, &video.id)
        .await?;

    let video = state.db.get_video(&video.id).await?.ok_or_else(|| not_found("Video"))?;
    Ok(Json(video.info()))
}

/// GET /admin/videos/:id
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoInfo>, AppError> {
    let video = state.db.get_video(&id).await?.ok_or_else(|| not_found("Video"))?;
    Ok(Json(video.info()))
}

/// PATCH /admin/videos/:id
pub async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<VideoUpdate>,
) -> Result<Json<VideoInfo>, AppError> {
    let video = state
        .db
        .update_video(&id, &update)
        .await?
        .ok_or_else(|| not_found("Video"))?;
    Ok(Json(video.info()))
}

/// POST /admin/videos/:id/status
pub async fn set_video_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VideoStatusRequest>,
) -> Result<Json<VideoInfo>, AppError> {
    if !state.db.set_video_status(&id, req.status).await? {
        return Err(not_found("Video"));
    }
    tracing::info!("Video {} marked {}", id, req.status.as_str());
    let video = state.db.get_video(&id).await?.ok_or_else(|| not_found("Video"))?;
    Ok(Json(video.info()))
}

/// Removes the row and, when present, the Vimeo copy
/// DELETE /admin/videos/:id
pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let video = state.db.get_video(&id).await?.ok_or_else(|| not_found("Video"))?;
    if let Some(uri) = &video.vimeo_uri {
        if let Err(e) = state.videos.delete_video(uri).await {
            tracing::warn!("Could not delete {} from Vimeo: {}", uri, e);
        }
    }
    let found = state.db.delete_video(&id).await?;
    if found {
        state.db.forget_admin_record(AdminRecord::Video, &id).await?;
    }
    deleted("Video", found)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VimeoListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    25
}

/// GET /admin/vimeo/videos
pub async fn list_vimeo_videos(
    State(state): State<AppState>,
    Query(query): Query<VimeoListQuery>,
) -> Result<Json<VimeoVideoPage>, AppError> {
    let page = state
        .videos
        .list_videos(query.page.max(1), query.per_page.clamp(1, 100))
        .await?;
    Ok(Json(page))
}

// ============================================================================
// Media, testimonials, comments
// ============================================================================

/// GET /admin/media
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Media>>, AppError> {
    Ok(Json(query.apply(state.db.list_media().await?)))
}

/// POST /admin/media
pub async fn create_media(
    State(state): State<AppState>,
    Json(req): Json<NewMedia>,
) -> Result<Json<Media>, AppError> {
    require(&req.title, "title")?;
    require(&req.photo_url, "photoUrl")?;
    Ok(Json(state.db.create_media(&req).await?))
}

/// GET /admin/media/:id
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Media>, AppError> {
    let media = state.db.get_media(&id).await?.ok_or_else(|| not_found("Media"))?;
    Ok(Json(media))
}

/// PATCH /admin/media/:id
pub async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<MediaUpdate>,
) -> Result<Json<Media>, AppError> {
    let media = state
        .db
        .update_media(&id, &update)
        .await?
        .ok_or_else(|| not_found("Media"))?;
    Ok(Json(media))
}

/// DELETE /admin/media/:id
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    deleted("Media", state.db.delete_media(&id).await?)
}

/// GET /admin/testimonials
pub async fn list_testimonials(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Testimonial>>, AppError> {
    Ok(Json(query.apply(state.db.list_testimonials().await?)))
}

/// POST /admin/testimonials
pub async fn create_testimonial(
    State(state): State<AppState>,
    Json(req): Json<NewTestimonial>,
) -> Result<Json<Testimonial>, AppError> {
    require(&req.name, "name")?;
    require(&req.text, "text")?;
    Ok(Json(state.db.create_testimonial(&req).await?))
}

/// GET /admin/testimonials/:id
pub async fn get_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Testimonial>, AppError> {
    let testimonial = state
        .db
        .get_testimonial(&id)
        .await?
        .ok_or_else(|| not_found("Testimonial"))?;
    Ok(Json(testimonial))
}

/// PATCH /admin/testimonials/:id
pub async fn update_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<TestimonialUpdate>,
) -> Result<Json<Testimonial>, AppError> {
    let testimonial = state
        .db
        .update_testimonial(&id, &update)
        .await?
        .ok_or_else(|| not_found("Testimonial"))?;
    Ok(Json(testimonial))
}

/// DELETE /admin/testimonials/:id
pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    deleted("Testimonial", state.db.delete_testimonial(&id).await?)
}

/// GET /admin/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Comment>>, AppError> {
    Ok(Json(query.apply(state.db.list_comments().await?)))
}

/// DELETE /admin/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    deleted("Comment", state.db.delete_comment(&id).await?)
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub clients: i64,
    pub organizations: i64,
    pub volunteers: i64,
    pub videos: i64,
    pub comments: i64,
}

/// GET /admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, AppError> {
    let db = &state.db;
    Ok(Json(Stats {
        clients: db.count(CountedTable::Clients).await?,
        organizations: db.count(CountedTable::Organizations).await?,
        volunteers: db.count(CountedTable::Volunteers).await?,
        videos: db.count(CountedTable::Videos).await?,
        comments: db.count(CountedTable::Comments).await?,
    }))
}
