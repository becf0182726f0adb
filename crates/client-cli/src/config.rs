use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use shared::{SessionResponse, UserSummary, UserType};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub auth: AuthState,
    /// File this config was read from; `save` writes back to it
    #[serde(skip)]
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub server: Option<String>,
}

/// What the server told us at login, kept until logout or a 401
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub session_id: Option<String>,
    pub user_type: Option<UserType>,
    pub user_id: Option<String>,
    pub user: Option<UserSummary>,
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("nl", "virtueelwandelen", "wandelen")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => self.save_to(&Self::config_path()?),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Self::default()
        };
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.auth.session_id.as_deref()
    }

    pub fn store_session(&mut self, session: &SessionResponse) {
        self.auth = AuthState {
            session_id: Some(session.session_id.clone()),
            user_type: Some(session.user_type),
            user_id: Some(session.user_id.clone()),
            user: Some(session.user.clone()),
        };
    }

    /// Forget the session; returns whether there was one
    pub fn clear_auth(&mut self) -> bool {
        let had_session = self.auth.session_id.is_some();
        self.auth = AuthState::default();
        had_session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session() -> SessionResponse {
        SessionResponse {
            success: true,
            session_id: "tok123".to_string(),
            user_type: UserType::Volunteer,
            user_id: "v1".to_string(),
            user: UserSummary {
                id: "v1".to_string(),
                email: "henk@wandelen.test".to_string(),
                name: Some("Henk Smit".to_string()),
                user_type: UserType::Volunteer,
            },
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_and_clear_session() {
        let mut config = Config::default();
        assert!(!config.clear_auth());

        config.store_session(&session());
        assert_eq!(config.token(), Some("tok123"));
        assert_eq!(config.auth.user_type, Some(UserType::Volunteer));

        assert!(config.clear_auth());
        assert_eq!(config.auth, AuthState::default());
        assert_eq!(config.token(), None);
    }

    #[test]
    fn test_save_and_load_keeps_auth() {
        let path = std::env::temp_dir().join(format!("wandelen-{}.toml", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.remote.server = Some("http://localhost:8080".to_string());
        config.store_session(&session());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.remote.server.as_deref(), Some("http://localhost:8080"));
        assert_eq!(loaded.auth, config.auth);

        let missing = Config::load_from(&path).unwrap();
        assert!(missing.token().is_none());
    }
}
