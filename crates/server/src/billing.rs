use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{CheckoutSummary, VerifyCheckoutRequest};

use crate::error::AppError;
use crate::integrations::{stripe::is_object_id, CheckoutSession, PaymentGateway, Subscription};

const FALLBACK_TRIAL_DAYS: i64 = 7;

/// When a new client's trial ends.
///
/// Stripe's own `trial_end` wins. A subscription without one gets a day past
/// its current period, and with no subscription at all the trial runs a week
/// from `now`.
pub fn compute_trial_end(subscription: Option<&Subscription>, now: DateTime<Utc>) -> DateTime<Utc> {
    let from_stripe = subscription.and_then(|sub| {
        sub.trial_end
            .or_else(|| sub.current_period_end.map(|end| end + Duration::days(1).num_seconds()))
    });

    from_stripe
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(|| now + Duration::days(FALLBACK_TRIAL_DAYS))
}

/// Confirm that a Checkout Session was paid by the person claiming it
pub async fn verify_checkout(
    payments: &dyn PaymentGateway,
    req: &VerifyCheckoutRequest,
) -> Result<(CheckoutSession, CheckoutSummary), AppError> {
    let (session, email) = claimed_session(payments, req).await?;
    if session.payment_status != "paid" {
        return Err(AppError::PaymentIncomplete {
            payment_status: session.payment_status.clone(),
        });
    }
    let summary = summarize(&session, email);
    Ok((session, summary))
}

/// Like [`verify_checkout`], but a finished checkout that opened a trial
/// subscription counts as settled too
pub async fn verify_signup_checkout(
    payments: &dyn PaymentGateway,
    req: &VerifyCheckoutRequest,
) -> Result<(CheckoutSession, CheckoutSummary), AppError> {
    let (session, email) = claimed_session(payments, req).await?;
    if session.payment_status != "paid" && !session.started_trial() {
        return Err(AppError::PaymentIncomplete {
            payment_status: session.payment_status.clone(),
        });
    }
    let summary = summarize(&session, email);
    Ok((session, summary))
}

/// Fetch the session and check it belongs to `req.email`
async fn claimed_session<'a>(
    payments: &dyn PaymentGateway,
    req: &'a VerifyCheckoutRequest,
) -> Result<(CheckoutSession, &'a str), AppError> {
    let session_id = req.session_id.trim();
    let email = req.email.trim();
    if session_id.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest("sessionId and email are required".to_string()));
    }
    if !is_object_id(session_id, "cs_") {
        return Err(AppError::BadRequest("Invalid sessionId".to_string()));
    }

    let session = payments.retrieve_checkout_session(session_id).await?;

    let matches = session
        .customer_email()
        .map(|paid_by| paid_by.eq_ignore_ascii_case(email))
        .unwrap_or(false);
    if !matches {
        tracing::warn!("Checkout {} email does not match {}", session_id, email);
        return Err(AppError::BadRequest("Email mismatch".to_string()));
    }
    Ok((session, email))
}

fn summarize(session: &CheckoutSession, email: &str) -> CheckoutSummary {
    CheckoutSummary {
        success: true,
        session_id: session.id.clone(),
        email: email.to_string(),
        payment_status: session.payment_status.clone(),
        customer_id: session.customer.clone(),
        subscription_id: session.subscription.clone(),
        amount_total: session.amount_total,
        currency: session.currency.clone(),
    }
}
