use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use shared::UserType;

use crate::{error::AppError, state::AppState};

/// The caller's session, attached to the request by [`require_session`]
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: String,
    pub user_id: String,
    pub email: String,
    pub user_type: UserType,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reject requests without a live session row for their bearer token
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))?;

    let stored = state
        .db
        .get_stored_session(token)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid session".to_string()))?;

    if !stored.active {
        return Err(AppError::AuthError("Session is no longer active".to_string()));
    }
    if stored.expires_at <= Utc::now() {
        return Err(AppError::AuthError("Session expired".to_string()));
    }

    let user_type = stored
        .user_type
        .parse()
        .map_err(|_| AppError::AuthError("Invalid session".to_string()))?;

    req.extensions_mut().insert(AuthSession {
        session_id: stored.session_id,
        user_id: stored.user_id,
        email: stored.email,
        user_type,
    });

    Ok(next.run(req).await)
}

/// Must run inside [`require_session`]
pub async fn require_role(role: UserType, req: Request, next: Next) -> Result<Response, AppError> {
    let session = req
        .extensions()
        .get::<AuthSession>()
        .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))?;

    if session.user_type != role {
        tracing::warn!(
            "{} session {} tried to reach a {} route",
            session.user_type,
            session.user_id,
            role
        );
        return Err(AppError::Forbidden(format!("Only {} accounts can access this", role)));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::fake::FakePayments;
    use crate::session::open_session;
    use crate::state::test_support::test_state;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Extension, Router,
    };
    use shared::UserSummary;
    use tower::ServiceExt;

    async fn whoami(Extension(session): Extension<AuthSession>) -> String {
        session.user_id
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/private", get(whoami))
            .route_layer(from_fn(|req: Request, next: Next| {
                require_role(UserType::Client, req, next)
            }))
            .route_layer(from_fn_with_state(state.clone(), require_session))
            .with_state(state)
    }

    fn summary(user_type: UserType) -> UserSummary {
        UserSummary {
            id: "user-1".to_string(),
            email: "u@example.nl".to_string(),
            name: None,
            user_type,
        }
    }

    async fn call(state: &AppState, token: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri("/private");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let res = app(state.clone())
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let state = test_state(FakePayments::default()).await;
        assert_eq!(call(&state, None).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let state = test_state(FakePayments::default()).await;
        assert_eq!(call(&state, Some("nope")).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_session_reaches_handler() {
        let state = test_state(FakePayments::default()).await;
        let session = open_session(&state.db, summary(UserType::Client), 24).await.unwrap();
        let (status, body) = call(&state, Some(&session.session_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user-1");
    }

    #[tokio::test]
    async fn test_inactive_session_is_unauthorized() {
        let state = test_state(FakePayments::default()).await;
        let session = open_session(&state.db, summary(UserType::Client), 24).await.unwrap();
        state.db.deactivate_session(&session.session_id).await.unwrap();
        assert_eq!(call(&state, Some(&session.session_id)).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_session_is_unauthorized() {
        let state = test_state(FakePayments::default()).await;
        let session = open_session(&state.db, summary(UserType::Client), -1).await.unwrap();
        assert_eq!(call(&state, Some(&session.session_id)).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let state = test_state(FakePayments::default()).await;
        let session = open_session(&state.db, summary(UserType::Volunteer), 24).await.unwrap();
        assert_eq!(call(&state, Some(&session.session_id)).await.0, StatusCode::FORBIDDEN);
    }
}
