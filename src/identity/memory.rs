use crate::error::Res;
use crate::identity::{normalize_email, validate_credentials, Identity};
use crate::utils::generate_id;
use anyhow::{bail, Context};
use std::collections::HashMap;
use tokio::sync::Mutex;

struct Account {
    user_id: String,
    password: String,
}

/// An `Identity` that keeps accounts in memory. Passwords are compared as given.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Identity for MemoryIdentity {
    async fn register(&self, email: &str, password: &str) -> Res<String> {
        validate_credentials(email, password)?;
        let email = normalize_email(email);
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&email) {
            bail!("An account already exists for {email}");
        }
        let user_id = generate_id();
        accounts.insert(
            email,
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        Ok(user_id)
    }

    async fn login(&self, email: &str, password: &str) -> Res<String> {
        let email = normalize_email(email);
        let accounts = self.accounts.lock().await;
        let account = accounts
            .get(&email)
            .filter(|a| a.password == password)
            .context("Invalid email or password")?;
        Ok(account.user_id.clone())
    }

    async fn logout(&self) -> Res<()> {
        Ok(())
    }
}
