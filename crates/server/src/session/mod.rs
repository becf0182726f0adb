//! Login sessions: one-time codes, the session table, and the expiry sweep

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use rand::Rng;
use shared::{SessionResponse, UserSummary};

use crate::db::Database;
use crate::error::AppError;

mod otp;

pub use otp::{normalize_email, OtpCheck, OtpStore};

const SESSION_ID_LEN: usize = 48;

pub fn generate_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Persist a new session for `user` and build the login response
pub async fn open_session(
    db: &Database,
    user: UserSummary,
    ttl_hours: i64,
) -> Result<SessionResponse, AppError> {
    let session_id = generate_session_id();
    let expires_at = Utc::now() + Duration::hours(ttl_hours);

    db.create_stored_session(
        &session_id,
        &user.email,
        user.user_type,
        &user.id,
        serde_json::to_value(&user).map_err(|e| AppError::Internal(e.to_string()))?,
        expires_at,
    )
    .await?;

    tracing::info!("Opened {} session for {}", user.user_type, user.id);

    Ok(SessionResponse {
        success: true,
        session_id,
        user_type: user.user_type,
        user_id: user.id.clone(),
        user,
        expires_at,
    })
}

/// Periodically delete expired sessions, pending signups and OTP codes
pub fn spawn_sweeper(db: Database, otp: Arc<OtpStore>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(StdDuration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            sweep(&db, &otp).await;
        }
    })
}

async fn sweep(db: &Database, otp: &OtpStore) {
    let now = Utc::now();
    match db.delete_expired_sessions(now).await {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Swept {} expired sessions", n),
        Err(e) => tracing::error!("Session sweep failed: {}", e),
    }
    match db.delete_expired_signups(now).await {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Swept {} expired pending signups", n),
        Err(e) => tracing::error!("Signup sweep failed: {}", e),
    }
    let purged = otp.purge_expired(now);
    if purged > 0 {
        tracing::debug!("Purged {} expired login codes", purged);
    }
}
