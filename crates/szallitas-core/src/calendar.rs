//! Service calendars and their per-date exceptions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type CalendarId = i64;
pub type CalendarExceptionId = i64;

/// A GTFS service: the weekdays it runs on within a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
  pub id:         CalendarId,
  pub name:       String,
  pub start_date: NaiveDate,
  pub end_date:   Option<NaiveDate>,
  pub monday:     bool,
  pub tuesday:    bool,
  pub wednesday:  bool,
  pub thursday:   bool,
  pub friday:     bool,
  pub saturday:   bool,
  pub sunday:     bool,
}

impl Calendar {
  /// Day flags in GTFS column order, Monday first.
  pub fn days(&self) -> [bool; 7] {
    [
      self.monday,
      self.tuesday,
      self.wednesday,
      self.thursday,
      self.friday,
      self.saturday,
      self.sunday,
    ]
  }
}

/// Input for [`TransitStore::create_calendar`](crate::store::TransitStore::create_calendar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendar {
  pub name:       String,
  pub start_date: NaiveDate,
  pub end_date:   Option<NaiveDate>,
  /// Monday first.
  pub days:       [bool; 7],
}

impl NewCalendar {
  /// Start date given to services that only appear in `calendar_dates.txt`.
  pub fn placeholder_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
  }

  /// A degenerate calendar running on no weekday, for a service known only
  /// through its exceptions.
  pub fn placeholder(name: impl Into<String>) -> Self {
    Self {
      name:       name.into(),
      start_date: Self::placeholder_start(),
      end_date:   None,
      days:       [false; 7],
    }
  }
}

/// A single date on which a calendar's service is added or removed.
///
/// At most one exception exists per (calendar, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarException {
  pub id:          CalendarExceptionId,
  pub calendar_id: CalendarId,
  pub day:         NaiveDate,
  /// `true` for GTFS exception type 1 (service added), `false` for type 2.
  pub added:       bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendarException {
  pub calendar_id: CalendarId,
  pub day:         NaiveDate,
  pub added:       bool,
}
