use async_trait::async_trait;
use serde::Deserialize;

use super::{check_response, IntegrationError, PaymentGateway};
use crate::config::StripeConfig;

const SERVICE: &str = "Stripe";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
}

/// The parts of a Checkout Session the platform reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub payment_status: String,
    /// `open`, `complete` or `expired`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CheckoutSession {
    pub fn customer_email(&self) -> Option<&str> {
        self.customer_details.as_ref()?.email.as_deref()
    }

    /// A finished subscription checkout whose first invoice is covered by a
    /// trial. Stripe reports these as `no_payment_required` instead of `paid`.
    pub fn started_trial(&self) -> bool {
        self.payment_status == "no_payment_required"
            && self.status.as_deref() == Some("complete")
            && self.subscription.is_some()
    }
}

/// Whether `id` looks like a Stripe object id with the given prefix, e.g. `cs_`
pub fn is_object_id(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(false)
}

fn checked_id<'a>(id: &'a str, prefix: &str) -> Result<&'a str, IntegrationError> {
    if is_object_id(id, prefix) {
        Ok(id)
    } else {
        Err(IntegrationError::InvalidId {
            service: SERVICE,
            id: id.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: String,
    /// Unix seconds
    #[serde(default)]
    pub trial_end: Option<i64>,
    /// Unix seconds
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub email: String,
    pub price_id: String,
    pub plan: String,
    pub trial_days: u32,
    pub success_url: String,
    pub cancel_url: String,
}

impl NewCheckout {
    fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("mode", "subscription".to_string()),
            ("customer_email", self.email.clone()),
            ("line_items[0][price]", self.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("metadata[plan]", self.plan.clone()),
        ];
        if self.trial_days > 0 {
            form.push(("subscription_data[trial_period_days]", self.trial_days.to_string()));
        }
        form
    }
}

pub struct StripeClient {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(http: reqwest::Client, config: StripeConfig) -> Self {
        Self { http, config }
    }

    fn secret_key(&self) -> Result<&str, IntegrationError> {
        self.config
            .secret_key
            .as_deref()
            .ok_or(IntegrationError::NotConfigured(SERVICE))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(&self, checkout: &NewCheckout) -> Result<CheckoutSession, IntegrationError> {
        let response = self
            .http
            .post(self.url("checkout/sessions"))
            .bearer_auth(self.secret_key()?)
            .form(&checkout.form())
            .send()
            .await?;
        let session = check_response(SERVICE, response).await?.json().await?;
        Ok(session)
    }

    async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, IntegrationError> {
        let id = checked_id(id, "cs_")?;
        let response = self
            .http
            .get(self.url(&format!("checkout/sessions/{}", id)))
            .bearer_auth(self.secret_key()?)
            .send()
            .await?;
        let session = check_response(SERVICE, response).await?.json().await?;
        Ok(session)
    }

    async fn retrieve_subscription(&self, id: &str) -> Result<Subscription, IntegrationError> {
        let id = checked_id(id, "sub_")?;
        let response = self
            .http
            .get(self.url(&format!("subscriptions/{}", id)))
            .bearer_auth(self.secret_key()?)
            .send()
            .await?;
        let subscription = check_response(SERVICE, response).await?.json().await?;
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_session_deserializes_stripe_payload() {
        let json = r#"{
            "id": "cs_test_a1",
            "object": "checkout.session",
            "payment_status": "paid",
            "customer": "cus_123",
            "subscription": "sub_456",
            "customer_details": {"email": "walker@example.nl", "name": "Walker", "phone": null},
            "amount_total": 1295,
            "currency": "eur",
            "url": null
        }"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.customer_email(), Some("walker@example.nl"));
        assert_eq!(session.subscription.as_deref(), Some("sub_456"));
        assert!(session.url.is_none());
        assert!(!session.started_trial());
    }

    #[test]
    fn test_trial_checkout_needs_no_payment() {
        let json = r#"{
            "id": "cs_test_b2",
            "payment_status": "no_payment_required",
            "status": "complete",
            "subscription": "sub_789",
            "customer_details": {"email": "walker@example.nl"}
        }"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert!(session.started_trial());

        let open = CheckoutSession {
            status: Some("open".to_string()),
            ..session.clone()
        };
        assert!(!open.started_trial());

        let one_off = CheckoutSession {
            subscription: None,
            ..session
        };
        assert!(!one_off.started_trial());
    }

    #[test]
    fn test_object_id_shape() {
        assert!(is_object_id("cs_test_a1B2", "cs_"));
        assert!(is_object_id("sub_1", "sub_"));
        assert!(!is_object_id("cs_", "cs_"));
        assert!(!is_object_id("sub_1", "cs_"));
        assert!(!is_object_id("../../customers/cus_x", "cs_"));
        assert!(!is_object_id("cs_1/../../customers/cus_x", "cs_"));
        assert!(!is_object_id("cs_1?expand[]=customer", "cs_"));
        assert!(!is_object_id("cs_1#frag", "cs_"));
    }

    #[tokio::test]
    async fn test_path_like_ids_never_reach_stripe() {
        let config = StripeConfig {
            secret_key: Some("sk_test_123".to_string()),
            api_base: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let client = StripeClient::new(reqwest::Client::new(), config);

        let err = client
            .retrieve_checkout_session("../../customers/cus_x")
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidId { service: "Stripe", .. }));

        let err = client.retrieve_subscription("sub_1/../../charges").await.unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidId { .. }));
    }

    #[test]
    fn test_checkout_form_includes_trial() {
        let checkout = NewCheckout {
            email: "a@b.nl".to_string(),
            price_id: "price_1".to_string(),
            plan: "monthly".to_string(),
            trial_days: 7,
            success_url: "http://localhost/ok".to_string(),
            cancel_url: "http://localhost/cancel".to_string(),
        };
        let form = checkout.form();
        assert!(form.contains(&("mode", "subscription".to_string())));
        assert!(form.contains(&("subscription_data[trial_period_days]", "7".to_string())));

        let no_trial = NewCheckout { trial_days: 0, ..checkout };
        assert!(!no_trial
            .form()
            .iter()
            .any(|(key, _)| *key == "subscription_data[trial_period_days]"));
    }

    #[tokio::test]
    async fn test_missing_secret_key_is_not_configured() {
        let client = StripeClient::new(reqwest::Client::new(), StripeConfig::default());
        let err = client.retrieve_checkout_session("cs_1").await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured("Stripe")));
    }
}
