use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;

mod accounts;
mod content;
mod models;
mod sessions;

pub use accounts::AdminRecord;
pub use content::CountedTable;
pub use models::*;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id TEXT PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        ip_addresses TEXT NOT NULL DEFAULT '[]',
        org_ids TEXT NOT NULL DEFAULT '[]',
        client_ids TEXT NOT NULL DEFAULT '[]',
        videos_uploaded TEXT NOT NULL DEFAULT '[]',
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id TEXT PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        name TEXT NOT NULL,
        contact_person TEXT,
        phone TEXT,
        address TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id TEXT PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        phone TEXT,
        org_id TEXT REFERENCES organizations(id) ON DELETE SET NULL,
        plan TEXT,
        subscription_status TEXT NOT NULL DEFAULT 'none',
        stripe_customer_id TEXT,
        stripe_subscription_id TEXT,
        trial_ends_at TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS volunteers (
        id TEXT PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        phone TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS videos (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        location TEXT,
        vimeo_uri TEXT,
        thumbnail_url TEXT,
        uploaded_by TEXT NOT NULL,
        uploader_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'approved', 'rejected')),
        views INTEGER NOT NULL DEFAULT 0,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        user_name TEXT NOT NULL,
        comment_text TEXT NOT NULL,
        stars INTEGER NOT NULL CHECK (stars BETWEEN 1 AND 5),
        user_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS media (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        photo_url TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS testimonials (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        text TEXT NOT NULL,
        photo_url TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pending_signups (
        id TEXT PRIMARY KEY,
        email TEXT UNIQUE NOT NULL,
        plan TEXT NOT NULL,
        first_name TEXT,
        last_name TEXT,
        stripe_checkout_session_id TEXT,
        expires_at TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'completed', 'expired')),
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS session_store (
        session_id TEXT PRIMARY KEY,
        email TEXT NOT NULL,
        user_type TEXT NOT NULL,
        user_id TEXT NOT NULL,
        data TEXT NOT NULL DEFAULT '{}',
        active BOOLEAN NOT NULL DEFAULT 1,
        expires_at TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_session_store_expires_at ON session_store(expires_at)",
    "CREATE INDEX IF NOT EXISTS idx_pending_signups_expires_at ON pending_signups(expires_at)",
    "CREATE INDEX IF NOT EXISTS idx_videos_uploaded_by ON videos(uploaded_by)",
    "CREATE INDEX IF NOT EXISTS idx_clients_org_id ON clients(org_id)",
];

impl Database {
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        // Ensure the directory of a file-backed database exists
        if let Some(path) = url
            .strip_prefix("sqlite:")
            .map(|rest| rest.trim_start_matches("//"))
            .map(|rest| rest.split('?').next().unwrap_or(rest))
            .filter(|path| !path.is_empty() && *path != ":memory:")
        {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    /// Single-connection in-memory database; every pooled connection would
    /// otherwise see its own empty database.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::info!("Database migrations completed");
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        db.ping().await.unwrap();
    }
}
