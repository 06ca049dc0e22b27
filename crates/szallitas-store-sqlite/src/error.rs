//! Error type for `szallitas-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] szallitas_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// A stored integer does not fit the domain type it decodes into.
  #[error("stored value out of range: {0}")]
  OutOfRange(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
