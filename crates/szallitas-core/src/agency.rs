//! Agency: the operator owning a set of lines.

use serde::{Deserialize, Serialize};

pub type AgencyId = i64;

/// A transit operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
  pub id:        AgencyId,
  pub name:      String,
  pub website:   String,
  /// IANA timezone name; exported as `UTC` when absent.
  pub timezone:  Option<String>,
  pub telephone: Option<String>,
}

/// Input for [`TransitStore::create_agency`](crate::store::TransitStore::create_agency).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgency {
  pub name:      String,
  pub website:   String,
  pub timezone:  Option<String>,
  pub telephone: Option<String>,
}
