use clap::Parser;
use spendly::args::{AddSubcommand, Args, Command, DeleteSubcommand, ListSubcommand};
use spendly::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().spendly_home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Register(credentials) => {
            let config = Config::load(home).await?;
            commands::register(&config, credentials).await?.print()
        }

        Command::Login(credentials) => {
            let config = Config::load(home).await?;
            commands::login(&config, credentials).await?.print()
        }

        Command::Logout => commands::logout(&Config::load(home).await?)
            .await?
            .print(),

        Command::Add(add_args) => {
            let config = Config::load(home).await?;
            match add_args.entity() {
                AddSubcommand::Transaction(args) => {
                    commands::add_transaction(&config, args).await?.print()
                }
                AddSubcommand::Budget(args) => commands::add_budget(&config, args).await?.print(),
                AddSubcommand::Category(args) => {
                    commands::add_category(&config, args).await?.print()
                }
            }
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            match delete_args.entity() {
                DeleteSubcommand::Transaction { id } => {
                    commands::delete_transaction(&config, id).await?.print()
                }
                DeleteSubcommand::Budget { id } => {
                    commands::delete_budget(&config, id).await?.print()
                }
            }
        }

        Command::List(list_args) => {
            let config = Config::load(home).await?;
            match list_args.entity() {
                ListSubcommand::Transactions { category } => {
                    commands::list_transactions(&config, category.as_deref())
                        .await?
                        .print()
                }
                ListSubcommand::Budgets { month, year } => {
                    let month = (*year).zip(*month);
                    commands::list_budgets(&config, month).await?.print()
                }
                ListSubcommand::Categories => commands::list_categories(&config).await?.print(),
            }
        }

        Command::Summary(summary_args) => {
            let config = Config::load(home).await?;
            commands::summary(&config, summary_args).await?.print()
        }

        Command::Progress => commands::progress(&Config::load(home).await?)
            .await?
            .print(),

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(&config, export_args.out()).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
