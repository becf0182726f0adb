use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::Serialize;
use shared::{
    CheckoutSummary, SessionResponse, SignupCheckoutRequest, SignupCheckoutResponse, SignupStatus,
    VerifyCheckoutRequest,
};

use crate::{
    billing::{compute_trial_end, verify_checkout as verify, verify_signup_checkout},
    db::{Client, NewClient},
    error::AppError,
    integrations::NewCheckout,
    session::{normalize_email, open_session},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct SignupCompleteResponse {
    pub success: bool,
    pub client: Client,
    pub session: SessionResponse,
}

/// Confirm a Checkout Session was paid by the given email
/// POST /utils/verify-checkout
pub async fn verify_checkout(
    State(state): State<AppState>,
    Json(req): Json<VerifyCheckoutRequest>,
) -> Result<Json<CheckoutSummary>, AppError> {
    let (_, summary) = verify(state.payments.as_ref(), &req).await?;
    tracing::info!("Checkout {} verified for {}", summary.session_id, summary.email);
    Ok(Json(summary))
}

/// Start a paid signup
/// POST /utils/signup/checkout
pub async fn signup_checkout(
    State(state): State<AppState>,
    Json(req): Json<SignupCheckoutRequest>,
) -> Result<Json<SignupCheckoutResponse>, AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }
    if state.db.get_client_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }

    let stripe = &state.config.stripe;
    let price_id = stripe
        .prices
        .get(&req.plan)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown plan: {}", req.plan)))?;

    let signup = state
        .db
        .upsert_pending_signup(
            &email,
            &req.plan,
            req.first_name.as_deref(),
            req.last_name.as_deref(),
            Utc::now() + Duration::hours(stripe.signup_ttl_hours),
        )
        .await?;

    let public_url = state.config.server.public_url.trim_end_matches('/');
    let checkout = state
        .payments
        .create_checkout_session(&NewCheckout {
            email: email.clone(),
            price_id: price_id.clone(),
            plan: req.plan.clone(),
            trial_days: stripe.trial_days,
            success_url: format!("{}/signup/success?session_id={{CHECKOUT_SESSION_ID}}", public_url),
            cancel_url: format!("{}/signup/cancel", public_url),
        })
        .await?;

    let checkout_url = checkout
        .url
        .clone()
        .ok_or_else(|| AppError::Internal("Checkout session has no URL".to_string()))?;
    state.db.set_pending_signup_checkout(&signup.id, &checkout.id).await?;

    tracing::info!("Signup checkout {} started for {} ({})", checkout.id, email, req.plan);

    Ok(Json(SignupCheckoutResponse {
        success: true,
        checkout_url,
        session_id: checkout.id,
    }))
}

/// Turn a paid or trial-started pending signup into a client and log them in
/// POST /utils/signup/complete
pub async fn signup_complete(
    State(state): State<AppState>,
    Json(req): Json<VerifyCheckoutRequest>,
) -> Result<Json<SignupCompleteResponse>, AppError> {
    let (checkout, summary) = verify_signup_checkout(state.payments.as_ref(), &req).await?;
    let email = normalize_email(&summary.email);
    let now = Utc::now();

    let signup = state
        .db
        .get_pending_signup_by_email(&email)
        .await?
        .ok_or_else(|| AppError::BadRequest("No pending signup for this email".to_string()))?;

    match signup.status.parse::<SignupStatus>() {
        Ok(SignupStatus::Pending) => {}
        Ok(SignupStatus::Completed) => {
            return Err(AppError::BadRequest("Signup is already completed".to_string()))
        }
        _ => return Err(AppError::BadRequest("Signup has expired".to_string())),
    }

    if signup.expires_at <= now {
        state.db.set_pending_signup_status(&signup.id, SignupStatus::Expired).await?;
        tracing::info!("Pending signup for {} expired before completion", email);
        return Err(AppError::BadRequest("Signup has expired".to_string()));
    }

    if signup.stripe_checkout_session_id.as_deref() != Some(checkout.id.as_str()) {
        return Err(AppError::BadRequest(
            "Checkout session does not belong to this signup".to_string(),
        ));
    }

    if state.db.get_client_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }

    let subscription = match checkout.subscription.as_deref() {
        Some(id) => Some(state.payments.retrieve_subscription(id).await?),
        None => None,
    };
    let trial_ends_at = compute_trial_end(subscription.as_ref(), now);
    let subscription_status = match subscription.as_ref().map(|sub| sub.status.as_str()) {
        Some(status) if !status.is_empty() => status.to_string(),
        _ if trial_ends_at > now => "trialing".to_string(),
        _ => "active".to_string(),
    };

    let client = state
        .db
        .create_client(&NewClient {
            email: email.clone(),
            first_name: signup.first_name.clone().unwrap_or_default(),
            last_name: signup.last_name.clone().unwrap_or_default(),
            plan: Some(signup.plan.clone()),
            subscription_status,
            stripe_customer_id: checkout.customer.clone(),
            stripe_subscription_id: subscription.map(|sub| sub.id).or_else(|| checkout.subscription.clone()),
            trial_ends_at: Some(trial_ends_at),
            ..Default::default()
        })
        .await?;
    state.db.set_pending_signup_status(&signup.id, SignupStatus::Completed).await?;

    tracing::info!("Signup completed for {} (trial ends {})", email, trial_ends_at);

    let session = open_session(&state.db, client.summary(), state.config.session.ttl_hours).await?;
    Ok(Json(SignupCompleteResponse {
        success: true,
        client,
        session,
    }))
}
