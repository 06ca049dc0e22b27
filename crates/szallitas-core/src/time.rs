//! GTFS time and date codec.
//!
//! GTFS times are durations since the start of the service day, written as
//! `HH:MM:SS`. Hours are not bounded by 24: a departure at 00:55 belonging to
//! the previous day's service is written `24:55:00`.

use chrono::{NaiveDate, TimeDelta};

use crate::{Error, Result};

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Parse a GTFS `HH:MM:SS` string into a duration since midnight.
///
/// Hours may be 24 or more and are never wrapped. Surrounding whitespace is
/// ignored, so feeds padding single-digit hours (` 5:05:00`) are accepted.
pub fn parse_gtfs_time(text: &str) -> Result<TimeDelta> {
  let malformed = || Error::MalformedTime(text.to_owned());

  let mut fields = text.trim().split(':');
  let (Some(h), Some(m), Some(s), None) =
    (fields.next(), fields.next(), fields.next(), fields.next())
  else {
    return Err(malformed());
  };

  let (Some(hours), Some(minutes), Some(seconds)) =
    (number(h), number(m), number(s))
  else {
    return Err(malformed());
  };
  if minutes >= 60 || seconds >= 60 {
    return Err(malformed());
  }

  hours
    .checked_mul(SECONDS_PER_HOUR)
    .and_then(|h| h.checked_add(minutes * SECONDS_PER_MINUTE + seconds))
    .and_then(TimeDelta::try_seconds)
    .ok_or_else(malformed)
}

/// Render a duration since midnight as GTFS `HH:MM:SS`.
///
/// Hours are padded to two digits but otherwise unbounded. Sub-second parts
/// are truncated and negative durations render as `00:00:00`.
pub fn format_gtfs_time(duration: TimeDelta) -> String {
  let total = duration.num_seconds().max(0);
  let hours = total / SECONDS_PER_HOUR;
  let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
  let seconds = total % SECONDS_PER_MINUTE;
  format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parse a GTFS `YYYYMMDD` date.
pub fn parse_gtfs_date(text: &str) -> Result<NaiveDate> {
  let text = text.trim();
  if text.len() != 8 {
    return Err(Error::MalformedDate(text.to_owned()));
  }
  NaiveDate::parse_from_str(text, "%Y%m%d")
    .map_err(|_| Error::MalformedDate(text.to_owned()))
}

/// Render a date as GTFS `YYYYMMDD`.
pub fn format_gtfs_date(date: NaiveDate) -> String {
  date.format("%Y%m%d").to_string()
}

fn number(field: &str) -> Option<i64> {
  if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  field.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_regular_times() {
    assert_eq!(parse_gtfs_time("08:30:00").unwrap(), TimeDelta::seconds(30_600));
    assert_eq!(parse_gtfs_time("00:00:00").unwrap(), TimeDelta::zero());
    assert_eq!(parse_gtfs_time(" 5:05:00").unwrap(), TimeDelta::seconds(18_300));
  }

  #[test]
  fn keeps_hours_past_midnight() {
    assert_eq!(parse_gtfs_time("24:00:00").unwrap(), TimeDelta::seconds(86_400));
    assert_eq!(parse_gtfs_time("25:55:00").unwrap(), TimeDelta::seconds(93_300));
    assert_eq!(parse_gtfs_time("100:00:01").unwrap(), TimeDelta::seconds(360_001));
  }

  #[test]
  fn rejects_malformed_times() {
    for bad in ["", "invalid", "08:30", "08:30:00:00", "08:-1:00", "08:60:00", "08:30:7a", "::"] {
      let err = parse_gtfs_time(bad).unwrap_err();
      assert!(matches!(err, Error::MalformedTime(_)), "{bad:?} gave {err:?}");
    }
  }

  #[test]
  fn formats_with_unbounded_hours() {
    assert_eq!(format_gtfs_time(TimeDelta::seconds(18_300)), "05:05:00");
    assert_eq!(format_gtfs_time(TimeDelta::seconds(93_300)), "25:55:00");
    assert_eq!(format_gtfs_time(TimeDelta::seconds(360_001)), "100:00:01");
    assert_eq!(format_gtfs_time(TimeDelta::seconds(-5)), "00:00:00");
  }

  #[test]
  fn format_then_parse_is_identity() {
    for secs in [0, 1, 59, 60, 3_599, 3_600, 43_210, 86_399, 86_400, 93_300, 200_000] {
      let d = TimeDelta::seconds(secs);
      assert_eq!(parse_gtfs_time(&format_gtfs_time(d)).unwrap(), d);
    }
  }

  #[test]
  fn dates() {
    let date = parse_gtfs_date("20230126").unwrap();
    assert_eq!(date, NaiveDate::from_ymd_opt(2023, 1, 26).unwrap());
    assert_eq!(format_gtfs_date(date), "20230126");
    assert!(matches!(parse_gtfs_date("2023-01-26"), Err(Error::MalformedDate(_))));
    assert!(matches!(parse_gtfs_date("20231301"), Err(Error::MalformedDate(_))));
  }
}
