use crate::model::Amount;
use crate::sync::{Collection, Record};
use crate::utils::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether money came in or went out.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A single income or expense entry.
///
/// Transactions are immutable once created; the only way to change one is to delete it. The
/// `category_id` is a loose reference: nothing guarantees that the category still exists.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) amount: Amount,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub(crate) r#type: TransactionType,
    #[serde(default)]
    pub(crate) category_id: String,
}

impl Transaction {
    /// Creates a transaction with a freshly generated ID.
    pub fn new(
        amount: Amount,
        r#type: TransactionType,
        category_id: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self::with_id(generate_id(), amount, r#type, category_id, description, date)
    }

    /// Creates a transaction with a known ID, e.g. one that was loaded from a store.
    pub fn with_id(
        id: impl Into<String>,
        amount: Amount,
        r#type: TransactionType,
        category_id: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            description: description.into(),
            date,
            r#type,
            category_id: category_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn r#type(&self) -> TransactionType {
        self.r#type
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn is_income(&self) -> bool {
        self.r#type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.r#type == TransactionType::Expense
    }
}

impl Record for Transaction {
    const COLLECTION: Collection = Collection::Transactions;
    const SCHEMA_VERSION: u32 = 1;
}
