//! Delete command handlers.
//!
//! Deleting an ID that the user does not have is not an error; the output says that nothing was
//! deleted. No XP is taken away.

use crate::commands::{open_session, Out};
use crate::{Config, Result};

/// Deletes one of the logged-in user's transactions.
pub async fn delete_transaction(config: &Config, id: &str) -> Result<Out<bool>> {
    let mut session = open_session(config).await?;
    let deleted = session.delete_transaction(id.trim());
    session.flush().await;
    Ok(outcome("transaction", id, deleted))
}

/// Deletes one of the logged-in user's budgets.
pub async fn delete_budget(config: &Config, id: &str) -> Result<Out<bool>> {
    let mut session = open_session(config).await?;
    let deleted = session.delete_budget(id.trim());
    session.flush().await;
    Ok(outcome("budget", id, deleted))
}

fn outcome(kind: &str, id: &str, deleted: bool) -> Out<bool> {
    let message = if deleted {
        format!("Deleted {kind} {}", id.trim())
    } else {
        format!("No {kind} with ID {} was found, nothing was deleted", id.trim())
    };
    Out::new(message, deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{AddBudgetArgs, AddTransactionArgs};
    use crate::commands::{add_budget, add_transaction};
    use crate::model::TransactionType;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_delete_transaction() {
        let env = TestEnv::logged_in().await;
        let args = AddTransactionArgs::new("12", TransactionType::Expense, "Bills", "", None);
        let out = add_transaction(&env.config(), &args).await.unwrap();
        let id = out.structure().unwrap().id().to_string();

        let out = delete_transaction(&env.config(), &id).await.unwrap();
        assert_eq!(out.structure(), Some(&true));
        assert!(env.session().await.transactions().is_empty());

        let out = delete_transaction(&env.config(), &id).await.unwrap();
        assert_eq!(out.structure(), Some(&false));
        assert!(out.message().contains("nothing was deleted"));
    }

    #[tokio::test]
    async fn test_delete_budget_keeps_xp() {
        let env = TestEnv::logged_in().await;
        let args = AddBudgetArgs::new("Savings", "0", "1000", None, None, None);
        let out = add_budget(&env.config(), &args).await.unwrap();
        let id = out.structure().unwrap().id().to_string();
        let xp = env.session().await.stats().xp;

        delete_budget(&env.config(), &id).await.unwrap();
        let session = env.session().await;
        assert!(session.budgets().is_empty());
        assert_eq!(session.stats().xp, xp);
    }
}
