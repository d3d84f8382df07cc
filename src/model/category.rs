use crate::sync::{Collection, Record};
use crate::utils::generate_id;
use serde::{Deserialize, Serialize};

/// The name shown for a category reference that cannot be resolved.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// The icon shown for a category reference that cannot be resolved.
pub const UNKNOWN_ICON: &str = "📁";

/// A spending category. Transactions and budgets refer to it by `id`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) icon: String,
    #[serde(default)]
    pub(crate) color: String,
}

impl Category {
    /// Creates a category with a freshly generated ID.
    pub fn new(name: impl Into<String>, icon: impl Into<String>, color: impl Into<String>) -> Self {
        Self::with_id(generate_id(), name, icon, color)
    }

    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn color(&self) -> &str {
        &self.color
    }
}

impl Record for Category {
    const COLLECTION: Collection = Collection::Categories;
    const SCHEMA_VERSION: u32 = 1;
}

/// The categories seeded for a user who has none.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("Groceries", "🛒", "#FF9800"),
        Category::new("Transport", "🚌", "#03A9F4"),
        Category::new("Entertainment", "🎮", "#E91E63"),
        Category::new("Bills", "💡", "#9C27B0"),
        Category::new("Savings", "🏦", "#4CAF50"),
    ]
}

/// How a category reference should be displayed. Dangling references resolve to
/// `CategoryLabel::unknown()` rather than failing.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub name: String,
    pub icon: String,
    pub color: String,
}

impl CategoryLabel {
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_CATEGORY.to_string(),
            icon: UNKNOWN_ICON.to_string(),
            color: String::new(),
        }
    }

    /// Looks up `category_id` in `categories`.
    pub fn resolve(categories: &[Category], category_id: &str) -> Self {
        categories
            .iter()
            .find(|c| c.id == category_id)
            .map(CategoryLabel::from)
            .unwrap_or_else(CategoryLabel::unknown)
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_CATEGORY && self.icon == UNKNOWN_ICON
    }
}

impl From<&Category> for CategoryLabel {
    fn from(c: &Category) -> Self {
        Self {
            name: c.name.clone(),
            icon: c.icon.clone(),
            color: c.color.clone(),
        }
    }
}

impl std::fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.icon.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.icon, self.name)
        }
    }
}

/// Finds a category by exact ID, or failing that, by case-insensitive name.
pub fn find_category<'a>(categories: &'a [Category], id_or_name: &str) -> Option<&'a Category> {
    let needle = id_or_name.trim();
    categories
        .iter()
        .find(|c| c.id == needle)
        .or_else(|| {
            categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(needle))
        })
}
