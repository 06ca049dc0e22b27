//! Patterns: deduplicated stop sequences shared by many trips.
//!
//! A pattern fixes the ordered stops of a trip together with the travel time
//! from the first stop to each of them. Trips only carry their own departure
//! time; the time at any stop is `trip.departure + pattern_stop.travel_time`.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, line::LineId, stop::StopId};

pub type PatternId = i64;
pub type PatternStopId = i64;

/// GTFS `direction_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  Inbound,
  Outbound,
}

impl Direction {
  pub fn code(self) -> i64 {
    match self {
      Self::Inbound => 0,
      Self::Outbound => 1,
    }
  }

  pub fn from_code(code: i64) -> Result<Self> {
    match code {
      0 => Ok(Self::Inbound),
      1 => Ok(Self::Outbound),
      code => Err(Error::UnknownCode { kind: "direction", code }),
    }
  }
}

/// Patterns are written with caller-reserved ids, so there is no separate
/// `NewPattern` input type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
  pub id:        PatternId,
  pub headsign:  String,
  pub direction: Option<Direction>,
  pub line_id:   LineId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternStop {
  pub id:          PatternStopId,
  pub pattern_id:  PatternId,
  pub stop_id:     StopId,
  /// Offset from the pattern's first stop; never negative.
  pub travel_time: TimeDelta,
  /// Zero-based position within the pattern.
  pub index:       u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatternStop {
  pub pattern_id:  PatternId,
  pub stop_id:     StopId,
  pub travel_time: TimeDelta,
  pub index:       u32,
}
