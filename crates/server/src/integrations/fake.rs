//! In-process stand-ins for the hosted services

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::vimeo::VimeoVideo;
use super::*;

#[derive(Default)]
pub struct FakePayments {
    pub sessions: Mutex<HashMap<String, CheckoutSession>>,
    pub subscriptions: Mutex<HashMap<String, Subscription>>,
    pub created: Mutex<Vec<NewCheckout>>,
}

impl FakePayments {
    pub fn with_session(self, session: CheckoutSession) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
        self
    }

    /// Simulate the customer finishing a hosted checkout that starts with a
    /// trial; like Stripe, nothing is charged yet
    pub fn complete_with_trial(&self, id: &str, subscription_id: &str) {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(id) {
            session.payment_status = "no_payment_required".to_string();
            session.status = Some("complete".to_string());
            session.customer = Some("cus_1".to_string());
            session.subscription = Some(subscription_id.to_string());
        }
    }

    pub fn with_subscription(self, subscription: Subscription) -> Self {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id.clone(), subscription);
        self
    }
}

/// A paid session for `email` tied to customer `cus_1` and subscription `sub_1`
pub fn paid_session(id: &str, email: &str) -> CheckoutSession {
    CheckoutSession {
        id: id.to_string(),
        url: None,
        payment_status: "paid".to_string(),
        status: Some("complete".to_string()),
        customer: Some("cus_1".to_string()),
        subscription: Some("sub_1".to_string()),
        customer_details: Some(stripe::CustomerDetails {
            email: Some(email.to_string()),
        }),
        amount_total: Some(999),
        currency: Some("eur".to_string()),
    }
}

fn missing(kind: &str, id: &str) -> IntegrationError {
    IntegrationError::Api {
        service: "Stripe",
        status: 404,
        message: format!("No such {}: '{}'", kind, id),
    }
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_checkout_session(&self, checkout: &NewCheckout) -> Result<CheckoutSession, IntegrationError> {
        let mut created = self.created.lock().unwrap();
        created.push(checkout.clone());
        let session = CheckoutSession {
            id: format!("cs_fake_{}", created.len()),
            url: Some(format!("https://checkout.stripe.test/{}", created.len())),
            payment_status: "unpaid".to_string(),
            status: Some("open".to_string()),
            customer_details: Some(stripe::CustomerDetails {
                email: Some(checkout.email.clone()),
            }),
            ..Default::default()
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, IntegrationError> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| missing("checkout.session", id))
    }

    async fn retrieve_subscription(&self, id: &str) -> Result<Subscription, IntegrationError> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| missing("subscription", id))
    }
}

#[derive(Default)]
pub struct FakeVideoHost {
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl VideoHost for FakeVideoHost {
    async fn create_upload(
        &self,
        _name: &str,
        _description: Option<&str>,
        _size: u64,
    ) -> Result<UploadTicket, IntegrationError> {
        Ok(UploadTicket {
            uri: "/videos/1001".to_string(),
            upload_link: "https://files.tus.vimeo.test/1001".to_string(),
        })
    }

    async fn list_videos(&self, page: u32, per_page: u32) -> Result<VimeoVideoPage, IntegrationError> {
        Ok(VimeoVideoPage {
            total: 1,
            page,
            per_page,
            data: vec![VimeoVideo {
                uri: "/videos/1001".to_string(),
                name: "Duinpad".to_string(),
                ..Default::default()
            }],
        })
    }

    async fn upload_thumbnail(
        &self,
        video_uri: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, IntegrationError> {
        Ok(format!("https://i.vimeocdn.test{}/thumb.jpg", video_uri))
    }

    async fn delete_video(&self, video_uri: &str) -> Result<(), IntegrationError> {
        self.deleted.lock().unwrap().push(video_uri.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeFileHost;

#[async_trait]
impl FileHost for FakeFileHost {
    async fn upload(
        &self,
        file_name: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<UploadedFile, IntegrationError> {
        Ok(UploadedFile {
            url: format!("https://res.cloudinary.test/{}", file_name),
            public_id: format!("wandelen/{}", file_name),
        })
    }
}
