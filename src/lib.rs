//! spendly: a personal finance tracker with gamified progress.
//!
//! The core is split into a pure `aggregate` module for totals and budget arithmetic, a `progress`
//! engine for XP, levels and streaks, and a `session` that owns one user's data and persists it
//! through a `sync::Store`. The `commands` module drives these from the command line.

pub mod aggregate;
pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
pub mod identity;
pub mod model;
pub mod progress;
pub mod session;
pub mod sync;
mod utils;


pub use config::Config;
pub use error::{Error, ErrorType, Result};
