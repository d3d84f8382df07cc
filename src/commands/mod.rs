//! Command handlers for the spendly CLI.
//!
//! Every handler that acts for a user resumes the session recorded in `session.json`. Handlers that
//! change anything flush the session's pending writes before returning.

mod auth;
mod delete;
mod export;
mod init;
mod insert;
mod query;
mod report;

use crate::config::Config;
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{find_category, Category};
use crate::session::Session;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use auth::{login, logout, register};
pub use delete::{delete_budget, delete_transaction};
pub use export::export;
pub use init::init;
pub use insert::{add_budget, add_category, add_transaction};
pub use query::{list_budgets, list_categories, list_transactions, BudgetRow, TransactionRow};
pub use report::{progress, summary, ProgressReport, SummaryReport};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Resumes the session of whoever is logged in on this machine.
async fn open_session(config: &Config) -> Result<Session> {
    let saved = config
        .load_session()
        .await
        .context("Unable to read the saved session")
        .pub_result(ErrorType::Session)?;
    let Some(saved) = saved else {
        return Err(anyhow::anyhow!("Nobody is logged in, run 'spendly login' first"))
            .pub_result(ErrorType::Auth);
    };
    debug!("Resuming the session of {}", saved.email);
    Session::resume(config.store(), config.identity(), &saved.user_id)
        .await
        .context("Unable to resume the saved session")
        .pub_result(ErrorType::Session)
}

/// Resolves a category given by ID or name, failing with a request error if there is none.
fn resolve_category(session: &Session, id_or_name: &str) -> Result<Category> {
    let res: Res<Category> = find_category(session.categories(), id_or_name)
        .cloned()
        .with_context(|| format!("There is no category named '{}'", id_or_name.trim()));
    res.pub_result(ErrorType::Request)
}

/// Pluralizes `noun` for `count`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else if let Some(stem) = noun.strip_suffix('y') {
        format!("{count} {stem}ies")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "budget"), "1 budget");
        assert_eq!(plural(0, "budget"), "0 budgets");
        assert_eq!(plural(3, "category"), "3 categories");
    }

    #[test]
    fn test_out() {
        let out: Out<u32> = "done".into();
        assert_eq!(out.message(), "done");
        assert!(out.structure().is_none());
        let out = Out::new("with data", 7u32);
        assert_eq!(out.structure(), Some(&7));
    }
}
