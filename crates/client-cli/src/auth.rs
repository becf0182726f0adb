//! CLI authentication - email code login and stored session handling

use anyhow::{bail, Result};
use shared::UserType;
use std::io::{self, BufRead, Write};

use crate::api::{ApiClient, ApiError};
use crate::config::Config;

/// Drop the stored session when the server no longer accepts it
pub fn forget_on_unauthorized<T>(config: &mut Config, result: Result<T, ApiError>) -> Result<T> {
    match result {
        Err(ApiError::Unauthorized) => {
            if config.clear_auth() {
                config.save()?;
            }
            bail!(ApiError::Unauthorized)
        }
        other => Ok(other?),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Request a code by email, then exchange it for a session
pub async fn login(config: &mut Config, server_url: &str, email: Option<String>, user_type: UserType) -> Result<()> {
    if user_type == UserType::Admin {
        bail!("Admins log in through the web dashboard with a password");
    }

    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    if email.is_empty() {
        bail!("Email is required");
    }

    let api = ApiClient::new(server_url, None);
    let sent = api.request_otp(&email, user_type).await?;
    println!("\x1b[90m{}\x1b[0m", sent.message);

    let code = prompt("Login code: ")?;
    let session = api.verify_otp(&email, user_type, &code).await?;

    config.store_session(&session);
    config.save()?;

    println!();
    println!("\x1b[1;32m✅ Login successful!\x1b[0m");
    println!("\x1b[90mLogged in as {} ({})\x1b[0m", session.user.email, session.user_type);
    Ok(())
}

/// Close the server session and clear the stored one
pub async fn logout(config: &mut Config, server_url: &str) -> Result<()> {
    if let Some(token) = config.token() {
        let api = ApiClient::new(server_url, Some(token));
        match api.logout().await {
            Ok(_) | Err(ApiError::Unauthorized) => {}
            Err(e) => tracing::warn!("Server logout failed: {}", e),
        }
    }
    config.clear_auth();
    config.save()?;
    println!("\x1b[32m✅ Logged out successfully\x1b[0m");
    Ok(())
}

/// Show current login status, checked against the server
pub async fn whoami(config: &mut Config, server_url: &str) -> Result<()> {
    let Some(token) = config.token() else {
        println!("\x1b[33m✗ Not logged in\x1b[0m");
        println!("Run '\x1b[1mwandelen login\x1b[0m' to authenticate");
        return Ok(());
    };

    let api = ApiClient::new(server_url, Some(token));
    let result = api.me().await;
    let user = forget_on_unauthorized(config, result)?;

    println!("\x1b[32m✓ Logged in\x1b[0m");
    println!("Server: {}", server_url);
    println!("Email:  {}", user.email);
    if let Some(name) = &user.name {
        println!("Name:   {}", name);
    }
    println!("Role:   {}", user.user_type);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthState;
    use reqwest::StatusCode;

    fn temp_config() -> (std::path::PathBuf, Config) {
        let path = std::env::temp_dir().join(format!("wandelen-auth-{}.toml", uuid::Uuid::new_v4()));
        let mut config = Config::load_from(&path).unwrap();
        config.auth.session_id = Some("tok".to_string());
        config.auth.user_type = Some(UserType::Client);
        config.save().unwrap();
        (path, config)
    }

    #[test]
    fn test_unauthorized_clears_stored_session() {
        let (path, mut config) = temp_config();

        let result: Result<(), ApiError> = Err(ApiError::Unauthorized);
        let err = forget_on_unauthorized(&mut config, result).unwrap_err();
        assert!(err.to_string().contains("log in again"));
        assert_eq!(config.auth, AuthState::default());

        let reloaded = Config::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(reloaded.token().is_none());
    }

    #[test]
    fn test_other_errors_keep_session() {
        let (path, mut config) = temp_config();
        std::fs::remove_file(&path).unwrap();

        let result: Result<(), ApiError> = Err(ApiError::Server {
            status: StatusCode::FORBIDDEN,
            message: "Forbidden".to_string(),
        });
        assert!(forget_on_unauthorized(&mut config, result).is_err());
        assert_eq!(config.token(), Some("tok"));

        let value = forget_on_unauthorized(&mut config, Ok::<_, ApiError>(7)).unwrap();
        assert_eq!(value, 7);
        assert_eq!(config.token(), Some("tok"));
    }
}
