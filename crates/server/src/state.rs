use crate::{
    config::Config,
    db::Database,
    integrations::{CloudinaryClient, FileHost, PaymentGateway, StripeClient, VideoHost, VimeoClient},
    session::OtpStore,
};
use chrono::Duration;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub otp: Arc<OtpStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub videos: Arc<dyn VideoHost>,
    pub files: Arc<dyn FileHost>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        let http = reqwest::Client::new();
        let payments = Arc::new(StripeClient::new(http.clone(), config.stripe.clone()));
        let videos = Arc::new(VimeoClient::new(http.clone(), config.vimeo.clone()));
        let files = Arc::new(CloudinaryClient::new(http, config.cloudinary.clone()));

        Self::with_integrations(db, config, payments, videos, files)
    }

    pub fn with_integrations(
        db: Database,
        config: Config,
        payments: Arc<dyn PaymentGateway>,
        videos: Arc<dyn VideoHost>,
        files: Arc<dyn FileHost>,
    ) -> Self {
        let otp = OtpStore::new(
            Duration::minutes(config.session.otp_ttl_minutes),
            config.session.otp_max_attempts,
        );

        Self {
            db,
            config: Arc::new(config),
            otp: Arc::new(otp),
            payments,
            videos,
            files,
        }
    }
}
