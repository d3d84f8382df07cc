//! Error types returned at the public boundary of the crate.
//!
//! Internally everything is an `anyhow::Error` (`Res`). The command handlers convert
//! those into a public `Error` which also carries an `ErrorType` so that callers, like `main`, can
//! tell what kind of failure occurred.

use std::fmt::{Debug, Display, Formatter};

/// The internal result type used throughout the crate.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type returned by command handlers.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad categories of failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The spendly home directory or its configuration file is missing or invalid.
    Config,
    /// A SQLite operation failed.
    Database,
    /// Registration, login or the stored session was rejected.
    Auth,
    /// The user supplied invalid input.
    Request,
    /// An operation on an established session failed.
    Session,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// The public error type. Wraps an `anyhow::Error` along with its `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: anyhow::Error) -> Self {
        Self { error_type, inner }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Alternate formatting prints the whole context chain
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {}

/// Lets an internal `Res<T>` be converted into a public `Result<T>` by naming the `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
