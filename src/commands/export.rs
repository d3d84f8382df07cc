use crate::commands::{open_session, plural, Out};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::Transaction;
use crate::session::Session;
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

/// One line of the exported CSV.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    date: String,
    #[serde(rename = "type")]
    r#type: String,
    amount: String,
    category: String,
    description: &'a str,
}

impl<'a> ExportRow<'a> {
    fn new(session: &Session, tx: &'a Transaction) -> Self {
        Self {
            id: tx.id(),
            date: tx.date().format("%Y-%m-%d").to_string(),
            r#type: tx.r#type().to_string(),
            // Plain decimal so that spreadsheets read it as a number
            amount: tx.amount().value().normalize().to_string(),
            category: session.category_label(tx.category_id()).name,
            description: tx.description(),
        }
    }
}

/// Writes the logged-in user's transactions, newest first, to a CSV file at `out`. Transactions in
/// categories that no longer exist are exported under the placeholder category name.
pub async fn export(config: &Config, out: &Path) -> Result<Out<usize>> {
    let session = open_session(config).await?;
    let data = to_csv(&session).pub_result(ErrorType::Request)?;
    utils::write(out, data)
        .await
        .pub_result(ErrorType::Request)?;
    let count = session.transactions().len();
    Ok(Out::new(
        format!(
            "Exported {} to {}",
            plural(count, "transaction"),
            out.display()
        ),
        count,
    ))
}

fn to_csv(session: &Session) -> Res<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for tx in session.transactions() {
        writer
            .serialize(ExportRow::new(session, tx))
            .with_context(|| format!("Unable to write transaction {} as CSV", tx.id()))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish the CSV data: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AddTransactionArgs;
    use crate::commands::add_transaction;
    use crate::model::TransactionType;
    use crate::test::TestEnv;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_export() {
        let env = TestEnv::logged_in().await;
        let args = AddTransactionArgs::new(
            "R1,250.50",
            TransactionType::Income,
            "Savings",
            "Bonus, finally",
            NaiveDate::from_ymd_opt(2025, 4, 1),
        );
        add_transaction(&env.config(), &args).await.unwrap();

        let path = env.config().root().join("out.csv");
        let out = export(&env.config(), &path).await.unwrap();
        assert_eq!(out.structure(), Some(&1));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["id", "date", "type", "amount", "category", "description"]
        );
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "2025-04-01");
        assert_eq!(&record[2], "income");
        assert_eq!(&record[3], "1250.5");
        assert_eq!(&record[4], "Savings");
        assert_eq!(&record[5], "Bonus, finally");
    }

    #[tokio::test]
    async fn test_export_empty() {
        let env = TestEnv::logged_in().await;
        let path = env.config().root().join("empty.csv");
        let out = export(&env.config(), &path).await.unwrap();
        assert_eq!(out.structure(), Some(&0));
        assert!(path.is_file());
    }
}
