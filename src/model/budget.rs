use crate::model::Amount;
use crate::sync::{Collection, Record};
use crate::utils::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A spending goal for one category in one calendar month.
///
/// `minimum <= maximum` is checked when a budget is created from user input, nowhere else.
/// `spent` is derived from transactions every time budgets are read, the stored value is not
/// authoritative.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Budget {
    pub(crate) id: String,
    pub(crate) category_id: String,
    #[serde(default)]
    pub(crate) title: String,
    pub(crate) minimum: Amount,
    pub(crate) maximum: Amount,
    #[serde(default)]
    pub(crate) spent: Amount,
    /// Calendar month, 1 through 12.
    pub(crate) month: u32,
    pub(crate) year: i32,
    pub(crate) created: DateTime<Utc>,
}

impl Budget {
    /// Creates a budget with a freshly generated ID and nothing spent.
    pub fn new(
        category_id: impl Into<String>,
        title: impl Into<String>,
        minimum: Amount,
        maximum: Amount,
        month: u32,
        year: i32,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(),
            category_id: category_id.into(),
            title: title.into(),
            minimum,
            maximum,
            spent: Amount::ZERO,
            month,
            year,
            created,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn minimum(&self) -> Amount {
        self.minimum
    }

    pub fn maximum(&self) -> Amount {
        self.maximum
    }

    pub fn spent(&self) -> Amount {
        self.spent
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn is_for_month(&self, year: i32, month: u32) -> bool {
        self.year == year && self.month == month
    }

    /// Returns a copy carrying a freshly derived `spent` value.
    pub(crate) fn with_spent(&self, spent: Amount) -> Self {
        Self {
            spent,
            ..self.clone()
        }
    }
}

impl Record for Budget {
    const COLLECTION: Collection = Collection::Budgets;
    const SCHEMA_VERSION: u32 = 1;
}
