use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub vimeo: VimeoConfig,
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin of the web app, used for Stripe redirect URLs
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: default_public_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./data/wandelen.db?mode=rwc".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl_hours")]
    pub ttl_hours: i64,
    #[serde(default = "default_otp_ttl_minutes")]
    pub otp_ttl_minutes: i64,
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: u32,
    /// How often expired sessions and signups are swept
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_session_ttl_hours(),
            otp_ttl_minutes: default_otp_ttl_minutes(),
            otp_max_attempts: default_otp_max_attempts(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub enabled: bool,
    /// Use local sendmail binary instead of SMTP server
    #[serde(default = "default_true")]
    pub use_sendmail: bool,
    /// SMTP server host (only used if use_sendmail is false)
    #[serde(default)]
    pub host: String,
    /// SMTP server port (only used if use_sendmail is false)
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username (only used if use_sendmail is false)
    #[serde(default)]
    pub username: String,
    /// SMTP password (only used if use_sendmail is false)
    #[serde(default)]
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            use_sendmail: true,
            host: "".to_string(),
            port: 587,
            username: "".to_string(),
            password: "".to_string(),
            from_email: "noreply@virtueelwandelen.nl".to_string(),
            from_name: "Virtual Wandelen".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    /// Never set in source; comes from the config file or STRIPE_SECRET_KEY
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,
    #[serde(default = "default_signup_ttl_hours")]
    pub signup_ttl_hours: i64,
    /// Plan name -> Stripe price id
    #[serde(default)]
    pub prices: BTreeMap<String, String>,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_base: default_stripe_api_base(),
            trial_days: default_trial_days(),
            signup_ttl_hours: default_signup_ttl_hours(),
            prices: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VimeoConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_vimeo_api_base")]
    pub api_base: String,
}

impl Default for VimeoConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base: default_vimeo_api_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    #[serde(default)]
    pub cloud_name: Option<String>,
    #[serde(default)]
    pub upload_preset: Option<String>,
    #[serde(default = "default_cloudinary_api_base")]
    pub api_base: String,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            upload_preset: None,
            api_base: default_cloudinary_api_base(),
        }
    }
}

fn default_true() -> bool { true }
fn default_smtp_port() -> u16 { 587 }
fn default_public_url() -> String { "http://localhost:3000".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_session_ttl_hours() -> i64 { 24 }
fn default_otp_ttl_minutes() -> i64 { 10 }
fn default_otp_max_attempts() -> u32 { 5 }
fn default_sweep_interval_secs() -> u64 { 60 }
fn default_trial_days() -> u32 { 7 }
fn default_signup_ttl_hours() -> i64 { 24 }
fn default_stripe_api_base() -> String { "https://api.stripe.com".to_string() }
fn default_vimeo_api_base() -> String { "https://api.vimeo.com".to_string() }
fn default_cloudinary_api_base() -> String { "https://api.cloudinary.com".to_string() }

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        // Try to load from environment variable
        if let Ok(path) = std::env::var("WANDELEN_CONFIG") {
            return Self::load_from_path(&PathBuf::from(path));
        }

        // Try to load from default locations
        let default_paths = vec![
            PathBuf::from("wandelen-server.toml"),
            PathBuf::from("config/wandelen-server.toml"),
            PathBuf::from("/etc/wandelen/server.toml"),
        ];

        for path in default_paths {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        // Return default config if no file found
        tracing::warn!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Environment wins over the file for deployment-specific values and secrets
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!("Ignoring invalid PORT {}: {}", port, e),
            }
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(key) = lookup("STRIPE_SECRET_KEY").filter(|k| !k.is_empty()) {
            self.stripe.secret_key = Some(key);
        }
        if let Some(token) = lookup("VIMEO_ACCESS_TOKEN").filter(|t| !t.is_empty()) {
            self.vimeo.access_token = Some(token);
        }
        if let Some(name) = lookup("CLOUDINARY_CLOUD_NAME").filter(|n| !n.is_empty()) {
            self.cloudinary.cloud_name = Some(name);
        }
        if let Some(preset) = lookup("CLOUDINARY_UPLOAD_PRESET").filter(|p| !p.is_empty()) {
            self.cloudinary.upload_preset = Some(preset);
        }
    }
}
