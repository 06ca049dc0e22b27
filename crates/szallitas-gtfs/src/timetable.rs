//! Departure boards for a stop.
//!
//! A board lists, per calendar, every hour from the first to the last
//! departure with the minutes at which something leaves. Hours past midnight
//! of the service day stay as they are (`24`, `25`, ...).

use std::{
  collections::{BTreeMap, HashMap},
  fmt,
};

use serde::Serialize;
use szallitas_core::{
  pattern::PatternStop,
  store::{PatternStopQuery, TransitStore},
};

use crate::{Result, error::StoreResultExt as _};

const SECONDS_PER_HOUR: i64 = 3600;

/// One hour of a board: `"08"` with minutes `["15", "47"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourRow {
  pub hour:    String,
  pub minutes: Vec<String>,
}

/// The board of one calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarTimetable {
  pub calendar: String,
  pub rows:     Vec<HourRow>,
}

impl fmt::Display for CalendarTimetable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", self.calendar)?;
    for row in &self.rows {
      writeln!(f, "  {} | {}", row.hour, row.minutes.join(" "))?;
    }
    Ok(())
  }
}

/// Build the boards for the departures of every trip calling at
/// `pattern_stops`.
///
/// Departures are grouped by calendar name; groups come out sorted by name.
/// Every hour between a group's earliest and latest departure gets a row,
/// even when nothing leaves in it. Equal minutes from different trips are
/// all kept.
pub fn generate_timetable<S: TransitStore>(
  store: &S,
  pattern_stops: &[PatternStop],
) -> Result<Vec<CalendarTimetable>> {
  let calendar_names: HashMap<_, _> = store
    .calendars()
    .store_err()?
    .into_iter()
    .map(|c| (c.id, c.name))
    .collect();

  let mut departures: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
  for pattern_stop in pattern_stops {
    for trip in store.trips(pattern_stop.pattern_id).store_err()? {
      let Some(name) = calendar_names.get(&trip.calendar_id) else {
        continue;
      };
      let at = trip.departure + pattern_stop.travel_time;
      departures.entry(name.as_str()).or_default().push(at.num_seconds());
    }
  }

  Ok(
    departures
      .into_iter()
      .map(|(calendar, seconds)| CalendarTimetable {
        calendar: calendar.to_owned(),
        rows:     board(seconds),
      })
      .collect(),
  )
}

/// Boards for the stop and filters in `query`.
pub fn timetable_for<S: TransitStore>(
  store: &S,
  query: &PatternStopQuery,
) -> Result<Vec<CalendarTimetable>> {
  let pattern_stops = store.find_pattern_stops(query).store_err()?;
  generate_timetable(store, &pattern_stops)
}

fn board(mut seconds: Vec<i64>) -> Vec<HourRow> {
  seconds.sort_unstable();
  let (Some(&first), Some(&last)) = (seconds.first(), seconds.last()) else {
    return Vec::new();
  };

  let hours = first / SECONDS_PER_HOUR..=last / SECONDS_PER_HOUR;
  let mut by_hour: BTreeMap<i64, Vec<String>> =
    hours.map(|hour| (hour, Vec::new())).collect();
  for s in seconds {
    if let Some(minutes) = by_hour.get_mut(&(s / SECONDS_PER_HOUR)) {
      minutes.push(format!("{:02}", (s / 60) % 60));
    }
  }

  by_hour
    .into_iter()
    .map(|(hour, minutes)| HourRow { hour: format!("{hour:02}"), minutes })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(hour: &str, minutes: &[&str]) -> HourRow {
    HourRow { hour: hour.into(), minutes: minutes.iter().map(|m| m.to_string()).collect() }
  }

  #[test]
  fn board_fills_empty_hours() {
    let rows = board(vec![8 * 3600 + 47 * 60, 6 * 3600, 8 * 3600 + 15 * 60]);
    assert_eq!(rows, [row("06", &["00"]), row("07", &[]), row("08", &["15", "47"])]);
  }

  #[test]
  fn board_keeps_duplicates_and_late_hours() {
    let rows = board(vec![25 * 3600 + 57 * 60, 25 * 3600 + 57 * 60 + 30]);
    assert_eq!(rows, [row("25", &["57", "57"])]);
  }

  #[test]
  fn empty_board() {
    assert!(board(Vec::new()).is_empty());
  }
}
