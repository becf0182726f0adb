use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shared::{Page, VideoInfo};

use crate::{
    db::{NewVideo, Volunteer, VolunteerUpdate, VideoUpdate},
    error::AppError,
    listing::ListQuery,
    middleware::AuthSession,
    routes::upload::{read_file, IMAGE_TYPES},
    state::AppState,
};

/// Largest single upload accepted
const MAX_VIDEO_SIZE: u64 = 5 * 1024 * 1024 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Bytes the client is about to send to Vimeo
    pub size: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub video: VideoInfo,
    pub upload_link: String,
}

/// GET /volunteer/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<Volunteer>, AppError> {
    let volunteer = state
        .db
        .get_volunteer_by_id(&session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Volunteer not found".to_string()))?;
    Ok(Json(volunteer))
}

/// PATCH /volunteer/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(update): Json<VolunteerUpdate>,
) -> Result<Json<Volunteer>, AppError> {
    let volunteer = state
        .db
        .update_volunteer(&session.user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Volunteer not found".to_string()))?;
    Ok(Json(volunteer))
}

/// The volunteer's own uploads, whatever their status
/// GET /volunteer/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<VideoInfo>>, AppError> {
    let videos = state
        .db
        .list_videos_by_uploader(&session.user_id)
        .await?
        .iter()
        .map(|v| v.info())
        .collect();
    Ok(Json(query.apply(videos)))
}

/// Reserve a Vimeo upload and record the video as pending review
/// POST /volunteer/videos/upload
pub async fn create_upload(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if req.size == 0 || req.size > MAX_VIDEO_SIZE {
        return Err(AppError::BadRequest("Invalid video size".to_string()));
    }

    let ticket = state
        .videos
        .create_upload(title, req.description.as_deref(), req.size)
        .await?;

    let video = state
        .db
        .create_video(&NewVideo {
            title: title.to_string(),
            description: req.description,
            location: req.location,
            vimeo_uri: Some(ticket.uri.clone()),
            uploaded_by: session.user_id.clone(),
            uploader_type: session.user_type,
        })
        .await?;

    tracing::info!(
        "Volunteer {} reserved Vimeo upload {} for video {}",
        session.user_id,
        ticket.uri,
        video.id
    );

    Ok(Json(UploadResponse {
        video: video.info(),
        upload_link: ticket.upload_link,
    }))
}

/// POST /volunteer/videos/:id/thumbnail
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoInfo>, AppError> {
    let video = state
        .db
        .get_video(&id)
        .await?
        .filter(|v| v.uploaded_by == session.user_id)
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
    let vimeo_uri = video
        .vimeo_uri
        .clone()
        .ok_or_else(|| AppError::BadRequest("Video has no Vimeo upload yet".to_string()))?;

    let file = read_file(&mut multipart, IMAGE_TYPES).await?;
    let link = state
        .videos
        .upload_thumbnail(&vimeo_uri, file.bytes, file.content_type)
        .await?;

    let video = state
        .db
        .update_video(
            &id,
            &VideoUpdate {
                thumbnail_url: Some(link),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
    Ok(Json(video.info()))
}
