use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use shared::Page;

use crate::{
    db::{Client, NewClient, Organization, OrganizationUpdate},
    error::AppError,
    listing::ListQuery,
    middleware::AuthSession,
    session::normalize_email,
    state::AppState,
};

/// A client enrolled by their organization
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgClientRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// GET /org/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<Organization>, AppError> {
    let org = state
        .db
        .get_organization_by_id(&session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(Json(org))
}

/// PATCH /org/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(update): Json<OrganizationUpdate>,
) -> Result<Json<Organization>, AppError> {
    let org = state
        .db
        .update_organization(&session.user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(Json(org))
}

/// GET /org/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Client>>, AppError> {
    let clients = state.db.list_clients_for_org(&session.user_id).await?;
    Ok(Json(query.apply(clients)))
}

/// POST /org/clients
pub async fn create_client(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<OrgClientRequest>,
) -> Result<Json<Client>, AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }
    if state.db.get_client_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }

    let client = state
        .db
        .create_client(&NewClient {
            email,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            org_id: Some(session.user_id.clone()),
            subscription_status: "organization".to_string(),
            ..Default::default()
        })
        .await?;

    tracing::info!("Organization {} enrolled client {}", session.user_id, client.id);
    Ok(Json(client))
}
