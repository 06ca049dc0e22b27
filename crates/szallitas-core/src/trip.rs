//! Trip: one scheduled run of a pattern on a calendar.

use chrono::TimeDelta;

use crate::{calendar::CalendarId, pattern::PatternId, stop::WheelchairAccessibility};

pub type TripId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
  pub id:                    TripId,
  pub wheelchair_accessible: WheelchairAccessibility,
  /// Time at the pattern's first stop, since the start of the service day.
  /// May exceed 24 hours.
  pub departure:             TimeDelta,
  pub pattern_id:            PatternId,
  pub calendar_id:           CalendarId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrip {
  pub wheelchair_accessible: WheelchairAccessibility,
  pub departure:             TimeDelta,
  pub pattern_id:            PatternId,
  pub calendar_id:           CalendarId,
}
