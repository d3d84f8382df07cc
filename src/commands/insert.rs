//! Handlers for `spendly add`. Input is validated here, before anything reaches the session.

use crate::args::{AddBudgetArgs, AddCategoryArgs, AddTransactionArgs};
use crate::commands::{open_session, resolve_category, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{find_category, Amount, Budget, Category, Transaction};
use crate::{Config, Result};
use anyhow::{anyhow, ensure};
use chrono::{Datelike, NaiveTime, Utc};
use std::str::FromStr;

/// Records a transaction for the logged-in user and awards its XP.
///
/// # Errors
/// - Returns a request error if the amount is not a non-negative number or the category does not
///   exist.
pub async fn add_transaction(config: &Config, args: &AddTransactionArgs) -> Result<Out<Transaction>> {
    let amount = parse_amount("amount", args.amount())?;
    let mut session = open_session(config).await?;
    let category = resolve_category(&session, args.category())?;
    let date = match args.date() {
        Some(day) => day.and_time(NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    };
    let tx = Transaction::new(
        amount,
        args.r#type(),
        category.id(),
        args.description().trim(),
        date,
    );
    let gain = session.add_transaction(tx.clone());
    session.flush().await;
    Ok(Out::new(
        format!(
            "Added {} of {} in {} (+{} XP)",
            tx.r#type(),
            amount.display_with(config.currency_symbol()),
            session.category_label(category.id()),
            gain.amount
        ),
        tx,
    ))
}

/// Sets a budget for the logged-in user and awards its XP.
///
/// # Errors
/// - Returns a request error if either bound is not a non-negative number, `minimum > maximum`, the
///   month is not 1 through 12, or the category does not exist.
pub async fn add_budget(config: &Config, args: &AddBudgetArgs) -> Result<Out<Budget>> {
    let minimum = parse_amount("minimum", args.minimum())?;
    let maximum = parse_amount("maximum", args.maximum())?;
    let now = Utc::now();
    let month = args.month().unwrap_or_else(|| now.month());
    let year = args.year().unwrap_or_else(|| now.year());
    validate(|| {
        ensure!(
            minimum <= maximum,
            "The minimum ({minimum}) must not be more than the maximum ({maximum})"
        );
        ensure!(
            (1..=12).contains(&month),
            "The month must be between 1 and 12, got {month}"
        );
        Ok(())
    })?;

    let mut session = open_session(config).await?;
    let category = resolve_category(&session, args.category())?;
    let title = match args.title().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => category.name().to_string(),
    };
    let budget = Budget::new(category.id(), title, minimum, maximum, month, year, now);
    let gain = session.add_budget(budget.clone());
    session.flush().await;
    Ok(Out::new(
        format!(
            "Added a {year}-{month:02} budget of {} to {} for {} (+{} XP)",
            minimum.display_with(config.currency_symbol()),
            maximum.display_with(config.currency_symbol()),
            session.category_label(category.id()),
            gain.amount
        ),
        budget,
    ))
}

/// Creates a category for the logged-in user.
///
/// # Errors
/// - Returns a request error if the name is blank or already used, or the color is not of the form
///   `#RRGGBB`.
pub async fn add_category(config: &Config, args: &AddCategoryArgs) -> Result<Out<Category>> {
    let name = args.name().trim();
    let color = args.color().trim();
    validate(|| {
        ensure!(!name.is_empty(), "The category name must not be blank");
        ensure!(
            is_hex_color(color),
            "'{color}' is not a color, expected something like #4CAF50"
        );
        Ok(())
    })?;

    let mut session = open_session(config).await?;
    if let Some(existing) = find_category(session.categories(), name) {
        return Err(anyhow!(
            "A category named '{}' already exists",
            existing.name()
        ))
        .pub_result(ErrorType::Request);
    }
    let category = Category::new(name, args.icon().trim(), color);
    session.add_category(category.clone());
    session.flush().await;
    Ok(Out::new(
        format!("Added the category {}", session.category_label(category.id())),
        category,
    ))
}

fn validate(check: impl FnOnce() -> anyhow::Result<()>) -> Result<()> {
    check().pub_result(ErrorType::Request)
}

fn parse_amount(field: &str, input: &str) -> Result<Amount> {
    validate(|| {
        ensure!(!input.trim().is_empty(), "The {field} is required");
        Ok(())
    })?;
    let amount = Amount::from_str(input)
        .map_err(|e| anyhow!("Invalid {field}: {e}"))
        .pub_result(ErrorType::Request)?;
    validate(|| {
        ensure!(!amount.is_negative(), "The {field} must not be negative");
        Ok(())
    })?;
    Ok(amount)
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s.chars().skip(1).all(|c| c.is_ascii_hexdigit())
}
