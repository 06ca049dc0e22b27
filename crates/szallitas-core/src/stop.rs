//! Stops, their coordinates and accessibility.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::{Error, Result};

pub type StopId = i64;

// ─── Accessibility ───────────────────────────────────────────────────────────

/// Wheelchair accessibility, shared by stops (GTFS `wheelchair_boarding`) and
/// trips (GTFS `wheelchair_accessible`).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WheelchairAccessibility {
  #[default]
  NoInfo,
  Accessible,
  NotAccessible,
}

impl WheelchairAccessibility {
  pub fn code(self) -> i64 {
    match self {
      Self::NoInfo => 0,
      Self::Accessible => 1,
      Self::NotAccessible => 2,
    }
  }

  pub fn from_code(code: i64) -> Result<Self> {
    match code {
      0 => Ok(Self::NoInfo),
      1 => Ok(Self::Accessible),
      2 => Ok(Self::NotAccessible),
      code => Err(Error::UnknownCode { kind: "wheelchair accessibility", code }),
    }
  }
}

// ─── Coordinate ──────────────────────────────────────────────────────────────

/// A latitude or longitude with exactly six fractional digits, held as an
/// integer number of micro-degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coordinate(i64);

impl Coordinate {
  pub const SCALE: i64 = 1_000_000;

  pub fn from_micro_degrees(micro: i64) -> Self { Self(micro) }

  pub fn micro_degrees(self) -> i64 { self.0 }

  pub fn degrees(self) -> f64 { self.0 as f64 / Self::SCALE as f64 }
}

impl FromStr for Coordinate {
  type Err = Error;

  /// Parses decimal degrees, rounding to six fractional digits.
  fn from_str(s: &str) -> Result<Self> {
    let degrees: f64 = s
      .trim()
      .parse()
      .map_err(|_| Error::MalformedCoordinate(s.to_owned()))?;
    if !degrees.is_finite() || degrees.abs() > 180.0 {
      return Err(Error::MalformedCoordinate(s.to_owned()));
    }
    Ok(Self((degrees * Self::SCALE as f64).round() as i64))
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    let abs = self.0.unsigned_abs();
    let scale = Self::SCALE as u64;
    write!(f, "{sign}{}.{:06}", abs / scale, abs % scale)
  }
}

impl Serialize for Coordinate {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.degrees())
  }
}

// ─── Stop ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stop {
  pub id:                    StopId,
  pub name:                  String,
  pub code:                  Option<String>,
  pub lat:                   Coordinate,
  pub lon:                   Coordinate,
  pub wheelchair_accessible: WheelchairAccessibility,
}

/// Input for [`TransitStore::create_stop`](crate::store::TransitStore::create_stop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStop {
  pub name:                  String,
  pub code:                  Option<String>,
  pub lat:                   Coordinate,
  pub lon:                   Coordinate,
  pub wheelchair_accessible: WheelchairAccessibility,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn coordinate_rounds_to_six_digits() {
    let c: Coordinate = "52.22768605033".parse().unwrap();
    assert_eq!(c.micro_degrees(), 52_227_686);
    assert_eq!(c.to_string(), "52.227686");
  }

  #[test]
  fn coordinate_display_pads_and_signs() {
    assert_eq!("20.9".parse::<Coordinate>().unwrap().to_string(), "20.900000");
    assert_eq!("-0.5".parse::<Coordinate>().unwrap().to_string(), "-0.500000");
    assert_eq!("-73.985428".parse::<Coordinate>().unwrap().to_string(), "-73.985428");
    assert_eq!(Coordinate::default().to_string(), "0.000000");
  }

  #[test]
  fn coordinate_rejects_garbage() {
    for bad in ["", "north", "NaN", "inf", "181.0"] {
      assert!(matches!(
        bad.parse::<Coordinate>(),
        Err(Error::MalformedCoordinate(_))
      ));
    }
  }

  #[test]
  fn accessibility_codes() {
    for a in [
      WheelchairAccessibility::NoInfo,
      WheelchairAccessibility::Accessible,
      WheelchairAccessibility::NotAccessible,
    ] {
      assert_eq!(WheelchairAccessibility::from_code(a.code()).unwrap(), a);
    }
    assert!(WheelchairAccessibility::from_code(3).is_err());
  }
}
