//! Registration, login and logout.
//!
//! A successful register or login records the user in `session.json` so that later commands can
//! resume the session without credentials. Logout removes it.

use crate::args::CredentialArgs;
use crate::commands::{open_session, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::UserStats;
use crate::session::Session;
use crate::{Config, Result};
use anyhow::Context;
use chrono::Utc;
use tracing::debug;

/// Creates an account, seeds the default categories and logs in.
pub async fn register(config: &Config, args: &CredentialArgs) -> Result<Out<UserStats>> {
    let mut session = Session::register(
        config.store(),
        config.identity(),
        args.email(),
        args.password(),
        Utc::now(),
    )
    .await
    .context("Registration failed")
    .pub_result(ErrorType::Auth)?;
    session.flush().await;
    config
        .save_session(session.user().id(), args.email())
        .await
        .pub_result(ErrorType::Session)?;
    let stats = *session.stats();
    Ok(Out::new(
        format!(
            "Welcome to spendly, {}! Your streak starts today.",
            session.user().username()
        ),
        stats,
    ))
}

/// Logs in, applying the daily streak.
pub async fn login(config: &Config, args: &CredentialArgs) -> Result<Out<UserStats>> {
    if let Some(current) = config
        .load_session()
        .await
        .pub_result(ErrorType::Session)?
    {
        debug!("Replacing the session of {}", current.email);
    }
    let mut session = Session::login(
        config.store(),
        config.identity(),
        args.email(),
        args.password(),
        Utc::now(),
    )
    .await
    .context("Login failed")
    .pub_result(ErrorType::Auth)?;
    session.flush().await;
    config
        .save_session(session.user().id(), args.email())
        .await
        .pub_result(ErrorType::Session)?;
    let stats = *session.stats();
    Ok(Out::new(
        format!(
            "Logged in as {}. Level {}, {} day streak.",
            session.user().username(),
            stats.level,
            stats.daily_streak
        ),
        stats,
    ))
}

/// Saves the session's progress and forgets the logged-in user.
pub async fn logout(config: &Config) -> Result<Out<()>> {
    let session = open_session(config).await?;
    let username = session.user().username().to_string();
    session
        .logout()
        .await
        .pub_result(ErrorType::Session)?;
    config
        .clear_session()
        .await
        .pub_result(ErrorType::Session)?;
    Ok(format!("Logged out {username}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_register_login_logout() {
        let env = TestEnv::new().await;
        let config = env.config();
        let creds = CredentialArgs::new("ann@example.com", "secret1");

        let out = register(&config, &creds).await.unwrap();
        assert_eq!(out.structure().unwrap().daily_streak, 1);
        assert!(config.load_session().await.unwrap().is_some());

        logout(&config).await.unwrap();
        assert!(config.load_session().await.unwrap().is_none());

        // Logging in again on the same day keeps the streak
        let out = login(&config, &creds).await.unwrap();
        let stats = out.structure().unwrap();
        assert_eq!(stats.daily_streak, 1);
        assert_eq!(stats.xp, 10);
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let env = TestEnv::new().await;
        let config = env.config();
        register(&config, &CredentialArgs::new("ann@example.com", "secret1"))
            .await
            .unwrap();
        let err = login(&config, &CredentialArgs::new("ann@example.com", "nope-nope"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Auth);
    }

    #[tokio::test]
    async fn test_logout_without_session() {
        let env = TestEnv::new().await;
        let err = logout(&env.config()).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Auth);
    }
}
