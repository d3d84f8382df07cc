//! Handlers for `spendly list`.

use crate::aggregate::{self, BudgetProgress};
use crate::commands::{open_session, plural, resolve_category, Out};
use crate::model::{Budget, Category, Transaction};
use crate::{Config, Result};
use serde::Serialize;
use tracing::info;

/// A transaction with its category resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRow {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: String,
}

/// A budget with its progress.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetRow {
    #[serde(flatten)]
    pub budget: Budget,
    pub category: String,
    pub progress: BudgetProgress,
}

/// Lists the logged-in user's transactions, newest first, optionally only those in one category.
pub async fn list_transactions(
    config: &Config,
    category: Option<&str>,
) -> Result<Out<Vec<TransactionRow>>> {
    let session = open_session(config).await?;
    let category_id = match category {
        Some(c) => Some(resolve_category(&session, c)?.id().to_string()),
        None => None,
    };
    let selected: Vec<&Transaction> = match &category_id {
        Some(id) => aggregate::transactions_by_category(session.transactions(), id),
        None => session.transactions().iter().collect(),
    };
    let symbol = config.currency_symbol();
    let rows: Vec<TransactionRow> = selected
        .into_iter()
        .map(|tx| TransactionRow {
            category: session.category_label(tx.category_id()).to_string(),
            transaction: tx.clone(),
        })
        .collect();
    for row in &rows {
        let tx = &row.transaction;
        info!(
            "{}  {:<8} {:>12}  {:<20} {}  [{}]",
            tx.date().format("%Y-%m-%d"),
            tx.r#type(),
            tx.amount().display_with(symbol),
            row.category,
            tx.description(),
            tx.id()
        );
    }
    Ok(Out::new(
        format!("Listed {}", plural(rows.len(), "transaction")),
        rows,
    ))
}

/// Lists the logged-in user's budgets with what has been spent against each, optionally only
/// those for one month.
pub async fn list_budgets(
    config: &Config,
    month: Option<(i32, u32)>,
) -> Result<Out<Vec<BudgetRow>>> {
    let session = open_session(config).await?;
    let budgets = session.budgets();
    let selected: Vec<&Budget> = match month {
        Some((year, month)) => aggregate::budgets_for_month(&budgets, year, month),
        None => budgets.iter().collect(),
    };
    let symbol = config.currency_symbol();
    let rows: Vec<BudgetRow> = selected
        .into_iter()
        .map(|b| BudgetRow {
            category: session.category_label(b.category_id()).to_string(),
            progress: aggregate::budget_progress(b),
            budget: b.clone(),
        })
        .collect();
    for row in &rows {
        let b = &row.budget;
        info!(
            "{}-{:02}  {:<20} {:<16} spent {} of {} to {} ({:.0}%)  [{}]",
            b.year(),
            b.month(),
            row.category,
            b.title(),
            b.spent().display_with(symbol),
            b.minimum().display_with(symbol),
            b.maximum().display_with(symbol),
            row.progress.ratio * 100.0,
            b.id()
        );
    }
    Ok(Out::new(format!("Listed {}", plural(rows.len(), "budget")), rows))
}

/// Lists the logged-in user's categories.
pub async fn list_categories(config: &Config) -> Result<Out<Vec<Category>>> {
    let session = open_session(config).await?;
    let categories = session.categories().to_vec();
    for c in &categories {
        info!("{} {:<20} {}  [{}]", c.icon(), c.name(), c.color(), c.id());
    }
    Ok(Out::new(
        format!("Listed {}", plural(categories.len(), "category")),
        categories,
    ))
}
