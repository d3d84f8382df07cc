//! Pure aggregation over transactions, categories and budgets.
//!
//! Nothing in here has side effects or error conditions. Empty input produces zero sums and the
//! result never depends on the order of the input collection.

use crate::model::{Amount, Budget, Category, Transaction, TransactionType};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Income, expenses and their difference over some set of transactions.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub income: Amount,
    pub expenses: Amount,
    pub balance: Amount,
}

/// Restricts which expenses count towards `spending_by_category`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SpendingFilter {
    /// Only transactions dated at or after this instant are counted.
    since: DateTime<Utc>,
    /// When `None`, every category is selected.
    selected: Option<BTreeSet<String>>,
}

impl SpendingFilter {
    /// Every category, every date.
    pub fn all() -> Self {
        Self {
            since: DateTime::<Utc>::UNIX_EPOCH,
            selected: None,
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = since;
        self
    }

    /// Restricts the filter to the given category IDs.
    pub fn selected<I, S>(mut self, category_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = Some(category_ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_selected(&self, category_id: &str) -> bool {
        match &self.selected {
            None => true,
            Some(set) => set.contains(category_id),
        }
    }

    fn matches(&self, tx: &Transaction) -> bool {
        tx.date() >= self.since && self.is_selected(tx.category_id())
    }
}

impl Default for SpendingFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// The look-back windows offered for spending charts.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Last7,
    #[default]
    Last30,
    Last90,
}

serde_plain::derive_display_from_serialize!(Period);
serde_plain::derive_fromstr_from_deserialize!(Period);

impl Period {
    pub fn days(&self) -> i64 {
        match self {
            Period::Last7 => 7,
            Period::Last30 => 30,
            Period::Last90 => 90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Period::Last7 => "Last 7 Days",
            Period::Last30 => "Last 30 Days",
            Period::Last90 => "Last 90 Days",
        }
    }

    /// The start of this period when looking back from `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

/// How much of a budget has been used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub spent: Amount,
    /// `maximum - spent`, negative when overspent.
    pub remaining: Amount,
    /// `spent / maximum` clamped to `[0, 1]`; zero when `maximum` is zero.
    pub ratio: f64,
}

/// One row of the dashboard chart: actual spending next to the budget range for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOverview {
    pub category_id: String,
    pub label: String,
    pub actual: Amount,
    pub minimum: Amount,
    pub maximum: Amount,
}

fn sum_of(txs: &[Transaction], r#type: TransactionType) -> Amount {
    txs.iter()
        .filter(|tx| tx.r#type() == r#type)
        .map(Transaction::amount)
        .sum()
}

/// Sum of all income amounts.
pub fn income(txs: &[Transaction]) -> Amount {
    sum_of(txs, TransactionType::Income)
}

/// Sum of all expense amounts.
pub fn expenses(txs: &[Transaction]) -> Amount {
    sum_of(txs, TransactionType::Expense)
}

/// Income minus expenses.
pub fn balance(txs: &[Transaction]) -> Amount {
    income(txs) - expenses(txs)
}

pub fn summary(txs: &[Transaction]) -> Summary {
    let income = income(txs);
    let expenses = expenses(txs);
    Summary {
        income,
        expenses,
        balance: income - expenses,
    }
}

/// Income and expenses for transactions dated in the given calendar month.
pub fn monthly_summary(txs: &[Transaction], year: i32, month: u32) -> Summary {
    let in_month: Vec<Transaction> = txs
        .iter()
        .filter(|tx| tx.date().year() == year && tx.date().month() == month)
        .cloned()
        .collect();
    summary(&in_month)
}

/// Maps category ID to the total of expenses matching `filter`. Categories with no matching
/// expenses are absent from the map.
pub fn spending_by_category(txs: &[Transaction], filter: &SpendingFilter) -> BTreeMap<String, Amount> {
    let mut totals = BTreeMap::new();
    for tx in txs.iter().filter(|tx| tx.is_expense() && filter.matches(tx)) {
        *totals
            .entry(tx.category_id().to_string())
            .or_insert(Amount::ZERO) += tx.amount();
    }
    totals
}

pub fn transactions_by_category<'a>(
    txs: &'a [Transaction],
    category_id: &str,
) -> Vec<&'a Transaction> {
    txs.iter().filter(|tx| tx.category_id() == category_id).collect()
}

/// Everything spent in the budget's category.
pub fn budget_spent(budget: &Budget, txs: &[Transaction]) -> Amount {
    txs.iter()
        .filter(|tx| tx.is_expense() && tx.category_id() == budget.category_id())
        .map(Transaction::amount)
        .sum()
}

/// Returns copies of `budgets` with `spent` derived from `txs`.
pub fn with_spent(budgets: &[Budget], txs: &[Transaction]) -> Vec<Budget> {
    budgets
        .iter()
        .map(|b| b.with_spent(budget_spent(b, txs)))
        .collect()
}

pub fn budgets_for_month(budgets: &[Budget], year: i32, month: u32) -> Vec<&Budget> {
    budgets
        .iter()
        .filter(|b| b.is_for_month(year, month))
        .collect()
}

pub fn budget_progress(budget: &Budget) -> BudgetProgress {
    let spent = budget.spent();
    let maximum = budget.maximum();
    let ratio = if maximum.is_zero() {
        0.0
    } else {
        use rust_decimal::prelude::ToPrimitive;
        // An overflowing quotient is far past the maximum
        match spent.value().checked_div(maximum.value()) {
            Some(ratio) => ratio.to_f64().unwrap_or_default().clamp(0.0, 1.0),
            None => 1.0,
        }
    };
    BudgetProgress {
        spent,
        remaining: maximum - spent,
        ratio,
    }
}

/// For each selected category, the spending matching `filter` alongside the range of that
/// category's budget in the given month. Categories without a budget get a zero range.
pub fn category_overview(
    categories: &[Category],
    budgets: &[Budget],
    txs: &[Transaction],
    filter: &SpendingFilter,
    year: i32,
    month: u32,
) -> Vec<CategoryOverview> {
    let spending = spending_by_category(txs, filter);
    let month_budgets = budgets_for_month(budgets, year, month);
    categories
        .iter()
        .filter(|c| filter.is_selected(c.id()))
        .map(|c| {
            let budget = month_budgets.iter().find(|b| b.category_id() == c.id());
            CategoryOverview {
                category_id: c.id().to_string(),
                label: crate::model::CategoryLabel::from(c).to_string(),
                actual: spending.get(c.id()).copied().unwrap_or(Amount::ZERO),
                minimum: budget.map(|b| b.minimum()).unwrap_or(Amount::ZERO),
                maximum: budget.map(|b| b.maximum()).unwrap_or(Amount::ZERO),
            }
        })
        .collect()
}
