use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{Page, SubscriptionInfo, VideoInfo, VideoStatus};

use crate::{
    db::{Client, ClientUpdate, Comment},
    error::AppError,
    listing::ListQuery,
    middleware::AuthSession,
    state::AppState,
};

/// Fields a client may change on their own account
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentRequest {
    pub comment_text: String,
    pub stars: i64,
}

async fn current_client(state: &AppState, session: &AuthSession) -> Result<Client, AppError> {
    state
        .db
        .get_client_by_id(&session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))
}

/// GET /client/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(current_client(&state, &session).await?))
}

/// PATCH /client/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<Client>, AppError> {
    let update = ClientUpdate {
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        ..Default::default()
    };
    let client = state
        .db
        .update_client(&session.user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;
    Ok(Json(client))
}

/// Approved videos only
/// GET /client/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<VideoInfo>>, AppError> {
    let videos = state
        .db
        .list_videos_by_status(VideoStatus::Approved)
        .await?
        .iter()
        .map(|v| v.info())
        .collect();
    Ok(Json(query.apply(videos)))
}

/// Counts as a view
/// GET /client/videos/:id
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoInfo>, AppError> {
    let not_found = || AppError::NotFound("Video not found".to_string());

    let video = state.db.get_video(&id).await?.ok_or_else(not_found)?;
    if video.info().status != VideoStatus::Approved {
        return Err(not_found());
    }

    state.db.increment_video_views(&id).await?;
    let mut info = video.info();
    info.views += 1;
    Ok(Json(info))
}

/// POST /client/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<NewCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    if !(1..=5).contains(&req.stars) {
        return Err(AppError::BadRequest("Stars must be between 1 and 5".to_string()));
    }
    let text = req.comment_text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Comment text is required".to_string()));
    }

    let client = current_client(&state, &session).await?;
    let user_name = format!("{} {}", client.first_name, client.last_name);
    let comment = state
        .db
        .create_comment(&client.id, user_name.trim(), text, req.stars)
        .await?;
    Ok(Json(comment))
}

/// GET /client/subscription
pub async fn subscription(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<SubscriptionInfo>, AppError> {
    let client = current_client(&state, &session).await?;
    let in_trial = client.trial_ends_at.map_or(false, |end| end > Utc::now());
    Ok(Json(SubscriptionInfo {
        plan: client.plan,
        status: client.subscription_status,
        trial_ends_at: client.trial_ends_at,
        in_trial,
    }))
}
