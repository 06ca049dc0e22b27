//! Error types for `szallitas-gtfs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("required table {0} is missing from the archive")]
  MissingRequiredTable(&'static str),

  #[error("archive contains neither calendar.txt nor calendar_dates.txt")]
  CalendarFileNotFound,

  #[error("malformed archive: {0}")]
  MalformedArchive(#[from] zip::result::ZipError),

  #[error("failed to write archive: {0}")]
  Archive(#[source] zip::result::ZipError),

  #[error("{table} line {line}: {message}")]
  MalformedRow { table: &'static str, line: u64, message: String },

  #[error("{table} line {line}: unknown {kind} {id:?}")]
  UnresolvedReference {
    table: &'static str,
    line:  u64,
    kind:  &'static str,
    id:    String,
  },

  /// Malformed times, dates, coordinates and enum codes.
  #[error(transparent)]
  Core(#[from] szallitas_core::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

/// Lift a store result into this crate's [`Result`].
pub(crate) trait StoreResultExt<T> {
  fn store_err(self) -> Result<T>;
}

impl<T, E> StoreResultExt<T> for std::result::Result<T, E>
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn store_err(self) -> Result<T> { self.map_err(Error::store) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
