use anyhow::Result;
use chrono::{DateTime, Utc};
use shared::{SignupStatus, UserType};
use sqlx::types::Json;

use super::{new_id, Database, PendingSignup, StoredSession};

const SESSION_COLUMNS: &str = "session_id, email, user_type, user_id, active, expires_at";
const SIGNUP_COLUMNS: &str = "id, email, plan, first_name, last_name, stripe_checkout_session_id, \
    expires_at, status, created_at";

impl Database {
    // Session store operations
    pub async fn create_stored_session(
        &self,
        session_id: &str,
        email: &str,
        user_type: UserType,
        user_id: &str,
        data: serde_json::Value,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_store (session_id, email, user_type, user_id, data, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session_id)
        .bind(email)
        .bind(user_type.as_str())
        .bind(user_id)
        .bind(Json(data))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_stored_session(&self, session_id: &str) -> Result<Option<StoredSession>> {
        let session = sqlx::query_as::<_, StoredSession>(&format!(
            "SELECT {} FROM session_store WHERE session_id = ?",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn deactivate_session(&self, session_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE session_store SET active = 0 WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session_store WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // Pending signup operations
    /// A repeated checkout for the same email restarts the signup
    pub async fn upsert_pending_signup(
        &self,
        email: &str,
        plan: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<PendingSignup> {
        sqlx::query(
            r#"
            INSERT INTO pending_signups (id, email, plan, first_name, last_name, expires_at, status)
            VALUES (?, ?, ?, ?, ?, ?, 'pending')
            ON CONFLICT(email) DO UPDATE SET
                plan = excluded.plan,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                expires_at = excluded.expires_at,
                stripe_checkout_session_id = NULL,
                status = 'pending'
            "#,
        )
        .bind(new_id())
        .bind(email)
        .bind(plan)
        .bind(first_name)
        .bind(last_name)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        self.get_pending_signup_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("pending signup for {} vanished after insert", email))
    }

    pub async fn get_pending_signup_by_email(&self, email: &str) -> Result<Option<PendingSignup>> {
        let signup = sqlx::query_as::<_, PendingSignup>(&format!(
            "SELECT {} FROM pending_signups WHERE email = ?",
            SIGNUP_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(signup)
    }

    pub async fn set_pending_signup_checkout(&self, id: &str, checkout_session_id: &str) -> Result<()> {
        sqlx::query("UPDATE pending_signups SET stripe_checkout_session_id = ? WHERE id = ?")
            .bind(checkout_session_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_pending_signup_status(&self, id: &str, status: SignupStatus) -> Result<()> {
        sqlx::query("UPDATE pending_signups SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_expired_signups(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pending_signups WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_session_roundtrip_and_deactivate() {
        let db = Database::in_memory().await.unwrap();
        let expires_at = Utc::now() + Duration::hours(24);
        db.create_stored_session(
            "sess-1",
            "anna@example.nl",
            UserType::Client,
            "client-1",
            serde_json::json!({ "name": "Anna" }),
            expires_at,
        )
        .await
        .unwrap();

        let session = db.get_stored_session("sess-1").await.unwrap().unwrap();
        assert!(session.active);
        assert_eq!(session.user_type, "client");
        assert_eq!(session.expires_at.timestamp(), expires_at.timestamp());
        let (data,): (Json<serde_json::Value>,) =
            sqlx::query_as("SELECT data FROM session_store WHERE session_id = ?")
                .bind("sess-1")
                .fetch_one(&db.pool)
                .await
                .unwrap();
        assert_eq!(data.0["name"], "Anna");

        assert!(db.deactivate_session("sess-1").await.unwrap());
        let session = db.get_stored_session("sess-1").await.unwrap().unwrap();
        assert!(!session.active);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_sessions() {
        let db = Database::in_memory().await.unwrap();
        let now = Utc::now();
        for (id, offset) in [("old", -2), ("fresh", 2)] {
            db.create_stored_session(
                id,
                "x@example.nl",
                UserType::Volunteer,
                "vol-1",
                serde_json::json!({}),
                now + Duration::hours(offset),
            )
            .await
            .unwrap();
        }

        assert_eq!(db.delete_expired_sessions(now).await.unwrap(), 1);
        assert!(db.get_stored_session("old").await.unwrap().is_none());
        assert!(db.get_stored_session("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pending_signup_upsert_resets_checkout() {
        let db = Database::in_memory().await.unwrap();
        let expires_at = Utc::now() + Duration::hours(24);

        let signup = db
            .upsert_pending_signup("new@example.nl", "monthly", Some("Jan"), None, expires_at)
            .await
            .unwrap();
        assert_eq!(signup.status, "pending");
        db.set_pending_signup_checkout(&signup.id, "cs_test_1").await.unwrap();
        db.set_pending_signup_status(&signup.id, SignupStatus::Expired).await.unwrap();

        let again = db
            .upsert_pending_signup("new@example.nl", "yearly", Some("Jan"), None, expires_at)
            .await
            .unwrap();
        assert_eq!(again.id, signup.id);
        assert_eq!(again.plan, "yearly");
        assert_eq!(again.status, "pending");
        assert!(again.stripe_checkout_session_id.is_none());
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_signups() {
        let db = Database::in_memory().await.unwrap();
        let now = Utc::now();
        db.upsert_pending_signup("late@example.nl", "monthly", None, None, now - Duration::minutes(1))
            .await
            .unwrap();
        db.upsert_pending_signup("ok@example.nl", "monthly", None, None, now + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(db.delete_expired_signups(now).await.unwrap(), 1);
        assert!(db.get_pending_signup_by_email("ok@example.nl").await.unwrap().is_some());
    }
}
