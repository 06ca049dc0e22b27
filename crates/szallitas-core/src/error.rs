//! Error types for `szallitas-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed GTFS time {0:?}, expected HH:MM:SS")]
  MalformedTime(String),

  #[error("malformed GTFS date {0:?}, expected YYYYMMDD")]
  MalformedDate(String),

  #[error("malformed coordinate {0:?}")]
  MalformedCoordinate(String),

  #[error("unknown {kind} code: {code}")]
  UnknownCode { kind: &'static str, code: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
