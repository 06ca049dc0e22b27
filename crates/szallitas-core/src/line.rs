//! Line: a GTFS route operated by one agency.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, agency::AgencyId};

pub type LineId = i64;

/// Vehicle type of a line, numbered as GTFS `route_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
  Tram,
  Metro,
  Rail,
  Bus,
  Ferry,
  CableTram,
  AerialLift,
  Funicular,
  Trolleybus,
  Monorail,
}

impl LineType {
  pub fn code(self) -> i64 {
    match self {
      Self::Tram => 0,
      Self::Metro => 1,
      Self::Rail => 2,
      Self::Bus => 3,
      Self::Ferry => 4,
      Self::CableTram => 5,
      Self::AerialLift => 6,
      Self::Funicular => 7,
      Self::Trolleybus => 11,
      Self::Monorail => 12,
    }
  }

  pub fn from_code(code: i64) -> Result<Self> {
    match code {
      0 => Ok(Self::Tram),
      1 => Ok(Self::Metro),
      2 => Ok(Self::Rail),
      3 => Ok(Self::Bus),
      4 => Ok(Self::Ferry),
      5 => Ok(Self::CableTram),
      6 => Ok(Self::AerialLift),
      7 => Ok(Self::Funicular),
      11 => Ok(Self::Trolleybus),
      12 => Ok(Self::Monorail),
      code => Err(Error::UnknownCode { kind: "line type", code }),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
  pub id:          LineId,
  /// Short public code, e.g. `"WKD"` or `"133"`.
  pub code:        String,
  pub description: Option<String>,
  pub line_type:   LineType,
  pub agency_id:   AgencyId,
}

/// Input for [`TransitStore::create_line`](crate::store::TransitStore::create_line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
  pub code:        String,
  pub description: Option<String>,
  pub line_type:   LineType,
  pub agency_id:   AgencyId,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_type_codes_follow_gtfs() {
    assert_eq!(LineType::from_code(3).unwrap(), LineType::Bus);
    assert_eq!(LineType::from_code(11).unwrap(), LineType::Trolleybus);
    assert_eq!(LineType::Monorail.code(), 12);
    for missing in [8, 9, 10, 13, -1] {
      assert!(matches!(
        LineType::from_code(missing),
        Err(Error::UnknownCode { kind: "line type", .. })
      ));
    }
  }
}
