//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Dates are stored as ISO 8601 strings, durations as whole seconds,
//! coordinates as integer micro-degrees and enums as their GTFS codes.

use chrono::{NaiveDate, TimeDelta};
use rusqlite::Row;
use szallitas_core::{
  calendar::{Calendar, CalendarException},
  line::{Line, LineType},
  pattern::{Direction, Pattern, PatternStop},
  stop::{Coordinate, Stop, WheelchairAccessibility},
  store::EntityKind,
  trip::Trip,
};

use crate::{Error, Result};

// ─── Tables ──────────────────────────────────────────────────────────────────

pub fn table_name(kind: EntityKind) -> &'static str {
  match kind {
    EntityKind::Agency => "agencies",
    EntityKind::Stop => "stops",
    EntityKind::Line => "lines",
    EntityKind::Calendar => "calendars",
    EntityKind::CalendarException => "calendar_exceptions",
    EntityKind::Pattern => "patterns",
    EntityKind::PatternStop => "pattern_stops",
    EntityKind::Trip => "trips",
  }
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── TimeDelta ───────────────────────────────────────────────────────────────

pub fn encode_seconds(d: TimeDelta) -> i64 { d.num_seconds() }

pub fn decode_seconds(secs: i64) -> Result<TimeDelta> {
  TimeDelta::try_seconds(secs).ok_or_else(|| Error::OutOfRange(format!("{secs} seconds")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────
//
// Each raw struct holds the column values of one row exactly as SQLite returns
// them; decoding into the domain type happens outside the rusqlite row
// callback so decode failures keep their own error variant.

pub const STOP_COLUMNS: &str = "id, name, code, lat, lon, wheelchair_accessible";

pub struct RawStop {
  pub id:                    i64,
  pub name:                  String,
  pub code:                  Option<String>,
  pub lat:                   i64,
  pub lon:                   i64,
  pub wheelchair_accessible: i64,
}

impl RawStop {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      name:                  row.get(1)?,
      code:                  row.get(2)?,
      lat:                   row.get(3)?,
      lon:                   row.get(4)?,
      wheelchair_accessible: row.get(5)?,
    })
  }

  pub fn into_stop(self) -> Result<Stop> {
    Ok(Stop {
      id:                    self.id,
      name:                  self.name,
      code:                  self.code,
      lat:                   Coordinate::from_micro_degrees(self.lat),
      lon:                   Coordinate::from_micro_degrees(self.lon),
      wheelchair_accessible: WheelchairAccessibility::from_code(self.wheelchair_accessible)?,
    })
  }
}

pub const LINE_COLUMNS: &str = "id, code, description, line_type, agency_id";

pub struct RawLine {
  pub id:          i64,
  pub code:        String,
  pub description: Option<String>,
  pub line_type:   i64,
  pub agency_id:   i64,
}

impl RawLine {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      code:        row.get(1)?,
      description: row.get(2)?,
      line_type:   row.get(3)?,
      agency_id:   row.get(4)?,
    })
  }

  pub fn into_line(self) -> Result<Line> {
    Ok(Line {
      id:          self.id,
      code:        self.code,
      description: self.description,
      line_type:   LineType::from_code(self.line_type)?,
      agency_id:   self.agency_id,
    })
  }
}

pub const CALENDAR_COLUMNS: &str = "id, name, start_date, end_date, \
  monday, tuesday, wednesday, thursday, friday, saturday, sunday";

pub struct RawCalendar {
  pub id:         i64,
  pub name:       String,
  pub start_date: String,
  pub end_date:   Option<String>,
  pub days:       [bool; 7],
}

impl RawCalendar {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      start_date: row.get(2)?,
      end_date:   row.get(3)?,
      days:       [
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
      ],
    })
  }

  pub fn into_calendar(self) -> Result<Calendar> {
    let [monday, tuesday, wednesday, thursday, friday, saturday, sunday] = self.days;
    Ok(Calendar {
      id: self.id,
      name: self.name,
      start_date: decode_date(&self.start_date)?,
      end_date: self.end_date.as_deref().map(decode_date).transpose()?,
      monday,
      tuesday,
      wednesday,
      thursday,
      friday,
      saturday,
      sunday,
    })
  }
}

pub const CALENDAR_EXCEPTION_COLUMNS: &str = "id, calendar_id, day, added";

pub struct RawCalendarException {
  pub id:          i64,
  pub calendar_id: i64,
  pub day:         String,
  pub added:       bool,
}

impl RawCalendarException {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      calendar_id: row.get(1)?,
      day:         row.get(2)?,
      added:       row.get(3)?,
    })
  }

  pub fn into_exception(self) -> Result<CalendarException> {
    Ok(CalendarException {
      id:          self.id,
      calendar_id: self.calendar_id,
      day:         decode_date(&self.day)?,
      added:       self.added,
    })
  }
}

pub const PATTERN_COLUMNS: &str = "id, headsign, direction, line_id";

pub struct RawPattern {
  pub id:        i64,
  pub headsign:  String,
  pub direction: Option<i64>,
  pub line_id:   i64,
}

impl RawPattern {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      headsign:  row.get(1)?,
      direction: row.get(2)?,
      line_id:   row.get(3)?,
    })
  }

  pub fn into_pattern(self) -> Result<Pattern> {
    Ok(Pattern {
      id:        self.id,
      headsign:  self.headsign,
      direction: self.direction.map(Direction::from_code).transpose()?,
      line_id:   self.line_id,
    })
  }
}

pub const PATTERN_STOP_COLUMNS: &str = "id, pattern_id, stop_id, travel_time, stop_index";

pub struct RawPatternStop {
  pub id:          i64,
  pub pattern_id:  i64,
  pub stop_id:     i64,
  pub travel_time: i64,
  pub stop_index:  i64,
}

impl RawPatternStop {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      pattern_id:  row.get(1)?,
      stop_id:     row.get(2)?,
      travel_time: row.get(3)?,
      stop_index:  row.get(4)?,
    })
  }

  pub fn into_pattern_stop(self) -> Result<PatternStop> {
    Ok(PatternStop {
      id:          self.id,
      pattern_id:  self.pattern_id,
      stop_id:     self.stop_id,
      travel_time: decode_seconds(self.travel_time)?,
      index:       u32::try_from(self.stop_index)
        .map_err(|_| Error::OutOfRange(format!("stop index {}", self.stop_index)))?,
    })
  }
}

pub const TRIP_COLUMNS: &str = "id, wheelchair_accessible, departure, pattern_id, calendar_id";

pub struct RawTrip {
  pub id:                    i64,
  pub wheelchair_accessible: i64,
  pub departure:             i64,
  pub pattern_id:            i64,
  pub calendar_id:           i64,
}

impl RawTrip {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      wheelchair_accessible: row.get(1)?,
      departure:             row.get(2)?,
      pattern_id:            row.get(3)?,
      calendar_id:           row.get(4)?,
    })
  }

  pub fn into_trip(self) -> Result<Trip> {
    Ok(Trip {
      id:                    self.id,
      wheelchair_accessible: WheelchairAccessibility::from_code(self.wheelchair_accessible)?,
      departure:             decode_seconds(self.departure)?,
      pattern_id:            self.pattern_id,
      calendar_id:           self.calendar_id,
    })
  }
}
