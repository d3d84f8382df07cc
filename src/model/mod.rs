//! Types that represent the core data model, such as `Transaction`, `Budget` and `UserStats`.
mod amount;
mod budget;
mod category;
mod stats;
mod transaction;
mod user;

pub use amount::{Amount, AmountError};
pub use budget::Budget;
pub use category::{
    default_categories, find_category, Category, CategoryLabel, UNKNOWN_CATEGORY, UNKNOWN_ICON,
};
pub use stats::{UserStats, STARTING_LEVEL, STARTING_XP_TO_NEXT_LEVEL, XP_STEP_PER_LEVEL};
pub use transaction::{Transaction, TransactionType};
pub use user::User;
