//! Handlers for `spendly summary` and `spendly progress`.

use crate::aggregate::{self, CategoryOverview, Period, SpendingFilter, Summary};
use crate::args::SummaryArgs;
use crate::commands::{open_session, resolve_category, Out};
use crate::model::{Amount, CategoryLabel, UserStats};
use crate::{Config, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::info;

/// The dashboard: overall totals, this month's totals and spending per category over a period.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub period: Period,
    pub since: DateTime<Utc>,
    pub totals: Summary,
    pub this_month: Summary,
    /// Spending in the period next to this month's budget range, one row per selected category.
    pub categories: Vec<CategoryOverview>,
    /// Spending in the period against categories that no longer exist.
    pub unknown: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    #[serde(flatten)]
    pub stats: UserStats,
    pub level_progress: f64,
    pub total_xp: u64,
}

/// Summarizes the logged-in user's finances.
///
/// # Errors
/// - Returns a request error if a `--category` does not exist.
pub async fn summary(config: &Config, args: &SummaryArgs) -> Result<Out<SummaryReport>> {
    let session = open_session(config).await?;
    let period = args.period().unwrap_or_else(|| config.default_period());
    let now = Utc::now();
    let since = period.since(now);

    let mut filter = SpendingFilter::all().since(since);
    if !args.categories().is_empty() {
        let mut ids = Vec::new();
        for c in args.categories() {
            ids.push(resolve_category(&session, c)?.id().to_string());
        }
        filter = filter.selected(ids);
    }

    let txs = session.transactions();
    let categories = session.categories();
    let rows = aggregate::category_overview(
        categories,
        &session.budgets(),
        txs,
        &filter,
        now.year(),
        now.month(),
    );
    let unknown = if args.categories().is_empty() {
        aggregate::spending_by_category(txs, &filter)
            .into_iter()
            .filter(|(id, _)| categories.iter().all(|c| c.id() != id))
            .map(|(_, amount)| amount)
            .sum()
    } else {
        Amount::ZERO
    };

    let report = SummaryReport {
        period,
        since,
        totals: session.summary(),
        this_month: aggregate::monthly_summary(txs, now.year(), now.month()),
        categories: rows,
        unknown,
    };

    let symbol = config.currency_symbol();
    info!(
        "Income {}  Expenses {}  Balance {}",
        report.totals.income.display_with(symbol),
        report.totals.expenses.display_with(symbol),
        report.totals.balance.display_with(symbol)
    );
    info!("Spending, {}:", period.label());
    for row in &report.categories {
        let range = if row.maximum.is_zero() {
            "no budget".to_string()
        } else {
            format!(
                "budget {} to {}",
                row.minimum.display_with(symbol),
                row.maximum.display_with(symbol)
            )
        };
        info!(
            "  {:<22} {:>12}  ({range})",
            row.label,
            row.actual.display_with(symbol)
        );
    }
    if !report.unknown.is_zero() {
        info!(
            "  {:<22} {:>12}",
            CategoryLabel::unknown().to_string(),
            report.unknown.display_with(symbol)
        );
    }

    let message = format!(
        "Balance {} ({} this month)",
        report.totals.balance.display_with(symbol),
        report.this_month.balance.display_with(symbol)
    );
    Ok(Out::new(message, report))
}

/// Shows the logged-in user's level, XP and streak.
pub async fn progress(config: &Config) -> Result<Out<ProgressReport>> {
    let session = open_session(config).await?;
    let stats = *session.stats();
    let report = ProgressReport {
        stats,
        level_progress: stats.level_progress(),
        total_xp: stats.total_xp(),
    };
    let message = format!(
        "Level {} ({}/{} XP), {} day streak (longest {}), {} goals completed",
        stats.level,
        stats.xp,
        stats.xp_to_next_level,
        stats.daily_streak,
        stats.longest_streak,
        stats.goals_completed
    );
    Ok(Out::new(message, report))
}
