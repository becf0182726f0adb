use std::net::SocketAddr;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use shared::{
    AdminLoginRequest, MessageResponse, OtpRequest, OtpVerifyRequest, SessionResponse, UserSummary, UserType,
};

use crate::{
    error::AppError,
    mailer,
    middleware::AuthSession,
    session::{normalize_email, open_session, OtpCheck},
    state::AppState,
};

const OTP_SENT: &str = "If the account exists, a login code has been sent.";

/// Email a login code
/// POST /utils/otp/request
pub async fn otp_request(
    State(state): State<AppState>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.user_type == UserType::Admin {
        return Err(AppError::BadRequest("Admins sign in with a password".to_string()));
    }

    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    // Same answer for unknown accounts so account emails stay private
    if state.db.find_account(req.user_type, &email).await?.is_none() {
        tracing::info!("Login code requested for unknown {} {}", req.user_type, email);
        return Ok(Json(MessageResponse::ok(OTP_SENT)));
    }

    let code = state.otp.issue(req.user_type, &email, Utc::now());
    let ttl_minutes = state.config.session.otp_ttl_minutes;

    if state.config.smtp.enabled {
        if let Err(e) = mailer::send_otp_email(&state.config.smtp, &email, &code, ttl_minutes).await {
            tracing::error!("Failed to send login code to {}: {}", email, e);
        } else {
            tracing::info!("Login code sent to {}", email);
        }
    } else {
        tracing::warn!("SMTP not configured, login code {} for {}", code, email);
    }

    Ok(Json(MessageResponse::ok(OTP_SENT)))
}

/// Exchange a login code for a session
/// POST /utils/otp/verify
pub async fn otp_verify(
    State(state): State<AppState>,
    Json(req): Json<OtpVerifyRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = normalize_email(&req.email);

    match state.otp.verify(req.user_type, &email, &req.otp, Utc::now()) {
        OtpCheck::Valid => {}
        OtpCheck::Invalid => return Err(AppError::BadRequest("Invalid code".to_string())),
        OtpCheck::Unavailable => {
            return Err(AppError::BadRequest(
                "Code expired or not requested, ask for a new one".to_string(),
            ))
        }
    }

    let user = state
        .db
        .find_account(req.user_type, &email)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid code".to_string()))?;

    let session = open_session(&state.db, user, state.config.session.ttl_hours).await?;
    Ok(Json(session))
}

/// Password login for admins
/// POST /admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let invalid = || AppError::AuthError("Invalid email or password".to_string());

    let admin = state
        .db
        .get_admin_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    let parsed_hash =
        PasswordHash::new(&admin.password_hash).map_err(|e| AppError::Internal(e.to_string()))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid())?;

    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    state.db.record_admin_ip(&admin.id, &ip).await?;
    tracing::info!("Admin {} signed in from {}", admin.email, ip);

    let session = open_session(&state.db, admin.summary(), state.config.session.ttl_hours).await?;
    Ok(Json(session))
}

/// POST /utils/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<MessageResponse>, AppError> {
    state.db.deactivate_session(&session.session_id).await?;
    tracing::info!("Session closed for {} {}", session.user_type, session.email);
    Ok(Json(MessageResponse::ok("Logged out")))
}

/// GET /utils/me
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<UserSummary>, AppError> {
    let user = state
        .db
        .get_account(session.user_type, &session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account no longer exists".to_string()))?;
    Ok(Json(user))
}

/// First hop of `X-Forwarded-For` when behind a proxy, else the socket peer
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let peer: Option<SocketAddr> = Some("10.0.0.9:5000".parse().unwrap());
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer), "10.0.0.9");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers, peer), "203.0.113.7");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_hash_password_verifies() {
        let hash = hash_password("wandel123").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"wandel123", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }
}
