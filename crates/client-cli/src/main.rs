use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::UserType;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod config;

use api::{ApiClient, VideoQuery};

// Default server URL
const DEFAULT_SERVER: &str = "http://localhost:8080";

#[derive(Parser)]
#[command(name = "wandelen")]
#[command(about = "Command-line client for the Virtual Wandelen API")]
#[command(version = env!("WANDELEN_VERSION"))]
struct Cli {
    /// Server URL (overrides config)
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Log in with a code sent by email
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
        /// Account kind: client, organization or volunteer
        #[arg(long = "as", default_value = "client", value_parser = parse_user_type)]
        user_type: UserType,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show current login status
    Whoami,
    /// List videos visible to the logged-in account
    Videos {
        /// Case-insensitive title/description search
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<usize>,
    },
    /// Check that a Stripe checkout was paid
    VerifyPayment {
        /// Checkout Session id (cs_...)
        #[arg(long)]
        session_id: String,
        #[arg(long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (server)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Show all configuration
    Show,
    /// Get the config file path
    Path,
}

fn parse_user_type(value: &str) -> Result<UserType, String> {
    value.parse::<UserType>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wandelen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = config::Config::load()?;
    let server = cli
        .server
        .or_else(|| config.remote.server.clone())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());

    match cli.command {
        Commands::Config { action } => handle_config_command(&mut config, action)?,
        Commands::Login { email, user_type } => {
            auth::login(&mut config, &server, email, user_type).await?
        }
        Commands::Logout => auth::logout(&mut config, &server).await?,
        Commands::Whoami => auth::whoami(&mut config, &server).await?,
        Commands::Videos { search, page } => {
            let (Some(token), Some(user_type)) = (config.token(), config.auth.user_type) else {
                eprintln!("\x1b[33m🔐 Not logged in.\x1b[0m");
                eprintln!("   Run '\x1b[1mwandelen login\x1b[0m' to authenticate.");
                return Ok(());
            };
            let api = ApiClient::new(&server, Some(token));
            let result = api.videos(user_type, &VideoQuery { search, page }).await;
            let videos = auth::forget_on_unauthorized(&mut config, result)?;

            println!("{} video(s), page {}", videos.total, videos.page);
            for video in videos.items {
                println!(
                    "  {}  {:<40} {:>9}  {} views",
                    video.id,
                    video.title,
                    video.status.as_str(),
                    video.views
                );
            }
        }
        Commands::VerifyPayment { session_id, email } => {
            let api = ApiClient::new(&server, None);
            let summary = api.verify_checkout(&session_id, &email).await?;
            println!("\x1b[32m✓ Payment {}\x1b[0m", summary.payment_status);
            if let (Some(amount), Some(currency)) = (summary.amount_total, &summary.currency) {
                println!("Amount:       {:.2} {}", amount as f64 / 100.0, currency.to_uppercase());
            }
            if let Some(subscription) = &summary.subscription_id {
                println!("Subscription: {}", subscription);
            }
        }
    }

    Ok(())
}

fn handle_config_command(config: &mut config::Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            match key.as_str() {
                "server" => config.remote.server = Some(value),
                _ => anyhow::bail!("Unknown config key: {}. Valid keys: server", key),
            }
            config.save()?;
            println!("Configuration saved");
        }
        ConfigAction::Get { key } => {
            let value = match key.as_str() {
                "server" => config.remote.server.clone().unwrap_or_default(),
                "session" => config.token().map(|_| "****").unwrap_or_default().to_string(),
                _ => anyhow::bail!("Unknown config key: {}", key),
            };
            println!("{}", value);
        }
        ConfigAction::Show => {
            println!("server: {}", config.remote.server.clone().unwrap_or_default());
            println!("session: {}", config.token().map(|_| "****").unwrap_or_default());
            if let Some(user) = &config.auth.user {
                println!("user: {} ({})", user.email, user.user_type);
            }
        }
        ConfigAction::Path => {
            let path = config::Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
