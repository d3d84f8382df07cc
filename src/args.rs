//! These structs provide the CLI interface for the spendly CLI.

use crate::aggregate::Period;
use crate::model::TransactionType;
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// spendly: track income, expenses and budgets, and level up while doing it.
///
/// Every transaction you record earns XP, every budget you set earns more, and logging in on
/// consecutive days builds a streak. Data is kept in a SQLite database in the spendly home
/// directory.
///
/// Start with `spendly init`, then `spendly register`. Commands other than init, register and login
/// act on behalf of the logged-in user.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the spendly home directory, its config file and the database.
    Init,
    /// Create an account and log in to it.
    Register(CredentialArgs),
    /// Log in. Logging in on consecutive days builds your streak.
    Login(CredentialArgs),
    /// Save your progress and log out.
    Logout,
    /// Add a transaction, budget or category.
    Add(AddArgs),
    /// Delete a transaction or budget.
    Delete(DeleteArgs),
    /// List transactions, budgets or categories.
    List(ListArgs),
    /// Show income, expenses, balance and spending per category.
    Summary(SummaryArgs),
    /// Show your level, XP and streak.
    Progress,
    /// Write all transactions to a CSV file.
    Export(ExportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where spendly data and configuration is held. Defaults to ~/spendly
    #[arg(long, env = "SPENDLY_HOME", default_value_t = default_spendly_home())]
    spendly_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, spendly_home: PathBuf) -> Self {
        Self {
            log_level,
            spendly_home: spendly_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn spendly_home(&self) -> &DisplayPath {
        &self.spendly_home
    }
}

/// Args for `spendly register` and `spendly login`.
#[derive(Debug, ClapArgs, Clone)]
pub struct CredentialArgs {
    #[arg(long)]
    email: String,

    /// Your password. Prefer the environment variable over the flag to keep it out of your shell
    /// history.
    #[arg(long, env = "SPENDLY_PASSWORD", hide_env_values = true)]
    password: String,
}

impl CredentialArgs {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[derive(Debug, ClapArgs, Clone)]
pub struct AddArgs {
    #[command(subcommand)]
    entity: AddSubcommand,
}

impl AddArgs {
    pub fn new(entity: AddSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &AddSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum AddSubcommand {
    /// Record income or an expense. Earns 10 XP.
    Transaction(AddTransactionArgs),
    /// Set a spending range for a category in a month. Earns 15 XP.
    Budget(AddBudgetArgs),
    /// Create a category.
    Category(AddCategoryArgs),
}

/// Args for `spendly add transaction`.
#[derive(Debug, ClapArgs, Clone)]
pub struct AddTransactionArgs {
    /// The amount, e.g. 120.50 or R1,200. Always positive, the type says which way it goes.
    #[arg(long)]
    amount: String,

    /// income or expense
    #[arg(long = "type", default_value_t = TransactionType::Expense)]
    r#type: TransactionType,

    /// Category ID or name
    #[arg(long)]
    category: String,

    #[arg(long, default_value = "")]
    description: String,

    /// YYYY-MM-DD, defaults to now
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl AddTransactionArgs {
    pub fn new(
        amount: impl Into<String>,
        r#type: TransactionType,
        category: impl Into<String>,
        description: impl Into<String>,
        date: Option<NaiveDate>,
    ) -> Self {
        Self {
            amount: amount.into(),
            r#type,
            category: category.into(),
            description: description.into(),
            date,
        }
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn r#type(&self) -> TransactionType {
        self.r#type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Args for `spendly add budget`.
#[derive(Debug, ClapArgs, Clone)]
pub struct AddBudgetArgs {
    /// Category ID or name
    #[arg(long)]
    category: String,

    #[arg(long)]
    minimum: String,

    #[arg(long)]
    maximum: String,

    /// Defaults to the category name
    #[arg(long)]
    title: Option<String>,

    /// 1 through 12, defaults to the current month
    #[arg(long)]
    month: Option<u32>,

    /// Defaults to the current year
    #[arg(long)]
    year: Option<i32>,
}

impl AddBudgetArgs {
    pub fn new(
        category: impl Into<String>,
        minimum: impl Into<String>,
        maximum: impl Into<String>,
        title: Option<String>,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Self {
        Self {
            category: category.into(),
            minimum: minimum.into(),
            maximum: maximum.into(),
            title,
            month,
            year,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn minimum(&self) -> &str {
        &self.minimum
    }

    pub fn maximum(&self) -> &str {
        &self.maximum
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// Args for `spendly add category`.
#[derive(Debug, ClapArgs, Clone)]
pub struct AddCategoryArgs {
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "📁")]
    icon: String,

    /// A hex color such as #4CAF50
    #[arg(long, default_value = "#9E9E9E")]
    color: String,
}

impl AddCategoryArgs {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
        }
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

#[derive(Debug, ClapArgs, Clone)]
pub struct DeleteArgs {
    #[command(subcommand)]
    entity: DeleteSubcommand,
}

impl DeleteArgs {
    pub fn new(entity: DeleteSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &DeleteSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    /// Delete a transaction by ID.
    Transaction { id: String },
    /// Delete a budget by ID.
    Budget { id: String },
}

#[derive(Debug, ClapArgs, Clone)]
pub struct ListArgs {
    #[command(subcommand)]
    entity: ListSubcommand,
}

impl ListArgs {
    pub fn new(entity: ListSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &ListSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ListSubcommand {
    /// List transactions, newest first.
    Transactions {
        /// Only transactions in this category (ID or name)
        #[arg(long)]
        category: Option<String>,
    },
    /// List budgets with what has been spent against them.
    Budgets {
        /// Only budgets for this month, requires --year
        #[arg(long, requires = "year")]
        month: Option<u32>,

        #[arg(long, requires = "month")]
        year: Option<i32>,
    },
    /// List categories.
    Categories,
}

/// Args for `spendly summary`.
#[derive(Debug, ClapArgs, Clone, Default)]
pub struct SummaryArgs {
    /// last7, last30 or last90. Defaults to the period in config.json.
    #[arg(long)]
    period: Option<Period>,

    /// Restrict spending to these categories (ID or name). May be repeated. Defaults to all.
    #[arg(long)]
    category: Vec<String>,
}

impl SummaryArgs {
    pub fn new(period: Option<Period>, category: Vec<String>) -> Self {
        Self { period, category }
    }

    pub fn period(&self) -> Option<Period> {
        self.period
    }

    pub fn categories(&self) -> &[String] {
        &self.category
    }
}

/// Args for `spendly export`.
#[derive(Debug, ClapArgs, Clone)]
pub struct ExportArgs {
    /// The CSV file to write.
    #[arg(long)]
    out: PathBuf,
}

impl ExportArgs {
    pub fn new(out: impl Into<PathBuf>) -> Self {
        Self { out: out.into() }
    }

    pub fn out(&self) -> &Path {
        &self.out
    }
}

fn default_spendly_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("spendly"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --spendly-home or SPENDLY_HOME instead of relying on the default \
                spendly home directory.",
            );
            PathBuf::from("spendly")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["spendly", "--spendly-home", "/tmp/spendly-test"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_add_transaction() {
        let args = parse(&[
            "add",
            "transaction",
            "--amount",
            "R45.80",
            "--type",
            "income",
            "--category",
            "Transport",
            "--date",
            "2025-04-08",
        ]);
        let Command::Add(add) = args.command() else {
            panic!("expected add");
        };
        let AddSubcommand::Transaction(tx) = add.entity() else {
            panic!("expected transaction");
        };
        assert_eq!(tx.amount(), "R45.80");
        assert_eq!(tx.r#type(), TransactionType::Income);
        assert_eq!(tx.date(), NaiveDate::from_ymd_opt(2025, 4, 8));
        assert_eq!(tx.description(), "");
    }

    #[test]
    fn test_summary_repeated_categories() {
        let args = parse(&[
            "summary",
            "--period",
            "last7",
            "--category",
            "Bills",
            "--category",
            "Savings",
        ]);
        let Command::Summary(summary) = args.command() else {
            panic!("expected summary");
        };
        assert_eq!(summary.period(), Some(Period::Last7));
        assert_eq!(summary.categories(), ["Bills", "Savings"]);
    }

    #[test]
    fn test_common() {
        let args = parse(&["--log-level", "debug", "progress"]);
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        assert_eq!(
            args.common().spendly_home().path(),
            Path::new("/tmp/spendly-test")
        );
    }

    #[test]
    fn test_list_budgets_month_requires_year() {
        let argv = ["spendly", "list", "budgets", "--month", "4"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_bad_type_rejected() {
        let argv = [
            "spendly", "add", "transaction", "--amount", "5", "--type", "refund", "--category", "x",
        ];
        assert!(Args::try_parse_from(argv).is_err());
    }
}
