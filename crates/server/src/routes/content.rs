use axum::{
    extract::{Query, State},
    Json,
};
use shared::Page;

use crate::{
    db::{Comment, Media, Testimonial},
    error::AppError,
    listing::ListQuery,
    state::AppState,
};

/// GET /utils/testimonials
pub async fn list_testimonials(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Testimonial>>, AppError> {
    let testimonials = state.db.list_testimonials().await?;
    Ok(Json(query.apply(testimonials)))
}

/// GET /utils/media
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Media>>, AppError> {
    let media = state.db.list_media().await?;
    Ok(Json(query.apply(media)))
}

/// GET /utils/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Comment>>, AppError> {
    let comments = state.db.list_comments().await?;
    Ok(Json(query.apply(comments)))
}
