use crate::db::Db;
use crate::error::Res;
use crate::identity::{hash_password, normalize_email, validate_credentials, verify_password, Identity};
use crate::utils::generate_id;
use anyhow::{bail, Context};
use chrono::Utc;
use tracing::debug;

#[async_trait::async_trait]
impl Identity for Db {
    async fn register(&self, email: &str, password: &str) -> Res<String> {
        validate_credentials(email, password)?;
        let email = normalize_email(email);
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM accounts WHERE email = ?")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await
                .context("Unable to look up the account")?;
        if existing.is_some() {
            bail!("An account already exists for {email}");
        }

        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("The password hashing task failed")??;
        let user_id = generate_id();
        sqlx::query(
            "INSERT INTO accounts (user_id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user_id)
        .bind(&email)
        .bind(hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to create an account for {email}"))?;
        debug!("Registered {email} as {user_id}");
        Ok(user_id)
    }

    async fn login(&self, email: &str, password: &str) -> Res<String> {
        let email = normalize_email(email);
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT user_id, password_hash FROM accounts WHERE email = ?")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await
                .context("Unable to look up the account")?;
        // Unknown email and wrong password produce the same message
        let Some((user_id, hash)) = row else {
            bail!("Invalid email or password");
        };
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .context("The password verification task failed")?;
        if !valid {
            bail!("Invalid email or password");
        }
        Ok(user_id)
    }

    async fn logout(&self) -> Res<()> {
        // Nothing is held server side, the CLI forgets its session file
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_register_and_login() {
        let dir = TempDir::new().unwrap();
        let db = Db::init(&dir.path().join("spendly.sqlite")).await.unwrap();
        let user_id = db.register("ann@example.com", "secret1").await.unwrap();
        assert_eq!(db.login("ANN@example.com ", "secret1").await.unwrap(), user_id);

        let wrong = db.login("ann@example.com", "secret2").await.unwrap_err();
        let unknown = db.login("bob@example.com", "secret1").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let dir = TempDir::new().unwrap();
        let db = Db::init(&dir.path().join("spendly.sqlite")).await.unwrap();
        db.register("ann@example.com", "secret1").await.unwrap();
        assert!(db.register("ann@example.com", "secret1").await.is_err());
        assert!(db.register("bob", "secret1").await.is_err());
        assert!(db.register("bob@example.com", "123").await.is_err());
    }
}
