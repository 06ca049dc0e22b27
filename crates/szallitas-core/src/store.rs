//! The `TransitStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `szallitas-store-sqlite`). The GTFS engine depends on this abstraction,
//! not on any concrete backend.

use crate::{
  agency::{Agency, AgencyId, NewAgency},
  calendar::{
    Calendar, CalendarException, CalendarExceptionId, CalendarId, NewCalendar,
    NewCalendarException,
  },
  line::{Line, LineId, NewLine},
  pattern::{Direction, NewPatternStop, Pattern, PatternId, PatternStop},
  stop::{NewStop, Stop, StopId},
  trip::{NewTrip, Trip},
};

// ─── Entity kinds ────────────────────────────────────────────────────────────

/// One stored entity type, used by the type-generic maintenance operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
  Agency,
  Stop,
  Line,
  Calendar,
  CalendarException,
  Pattern,
  PatternStop,
  Trip,
}

impl EntityKind {
  /// Children before parents; deleting in this order never leaves a dangling
  /// reference behind.
  pub const CLEAR_ORDER: [EntityKind; 8] = [
    EntityKind::Trip,
    EntityKind::PatternStop,
    EntityKind::Pattern,
    EntityKind::CalendarException,
    EntityKind::Calendar,
    EntityKind::Line,
    EntityKind::Stop,
    EntityKind::Agency,
  ];
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`TransitStore::find_pattern_stops`].
///
/// Selects the places where patterns call at `stop`, optionally narrowed to
/// one line, one headsign or one direction.
#[derive(Debug, Clone)]
pub struct PatternStopQuery {
  pub stop:      StopId,
  pub line:      Option<LineId>,
  pub headsign:  Option<String>,
  pub direction: Option<Direction>,
}

impl PatternStopQuery {
  pub fn at(stop: StopId) -> Self {
    Self { stop, line: None, headsign: None, direction: None }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a transit data backend.
///
/// Writes are plain inserts: single rows that return their new id, or bulk
/// batches that return nothing. Pattern ids are reserved by the caller (see
/// [`TransitStore::max_id`]) so bulk paths never need id feedback.
pub trait TransitStore {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Transactions ──────────────────────────────────────────────────────

  /// Run `procedure` inside one transaction.
  ///
  /// The transaction commits when the procedure returns `Ok` and rolls back
  /// every write made by it when it returns `Err`. The outer result reports
  /// failures of the store itself (begin, commit); the inner result is the
  /// procedure's own outcome.
  fn atomic<T, E, F>(&self, procedure: F) -> Result<Result<T, E>, Self::Error>
  where
    F: FnOnce(&Self) -> Result<T, E>;

  // ── Single-row writes ─────────────────────────────────────────────────

  fn create_agency(&self, new: &NewAgency) -> Result<AgencyId, Self::Error>;

  /// Fails if `new.agency_id` does not exist.
  fn create_line(&self, new: &NewLine) -> Result<LineId, Self::Error>;

  fn create_stop(&self, new: &NewStop) -> Result<StopId, Self::Error>;

  fn create_calendar(&self, new: &NewCalendar) -> Result<CalendarId, Self::Error>;

  /// Fails if the calendar already has an exception on `new.day`.
  fn create_calendar_exception(
    &self,
    new: &NewCalendarException,
  ) -> Result<CalendarExceptionId, Self::Error>;

  // ── Bulk writes ───────────────────────────────────────────────────────

  /// Insert patterns with their caller-reserved ids.
  fn bulk_create_patterns(&self, patterns: &[Pattern]) -> Result<(), Self::Error>;

  fn bulk_create_pattern_stops(&self, stops: &[NewPatternStop]) -> Result<(), Self::Error>;

  fn bulk_create_trips(&self, trips: &[NewTrip]) -> Result<(), Self::Error>;

  // ── Reads by id ───────────────────────────────────────────────────────

  fn get_agency(&self, id: AgencyId) -> Result<Option<Agency>, Self::Error>;

  fn get_line(&self, id: LineId) -> Result<Option<Line>, Self::Error>;

  fn get_stop(&self, id: StopId) -> Result<Option<Stop>, Self::Error>;

  fn get_calendar(&self, id: CalendarId) -> Result<Option<Calendar>, Self::Error>;

  fn get_pattern(&self, id: PatternId) -> Result<Option<Pattern>, Self::Error>;

  // ── Listings ──────────────────────────────────────────────────────────
  //
  // All listings are ordered by id.

  fn agencies(&self) -> Result<Vec<Agency>, Self::Error>;

  fn lines(&self) -> Result<Vec<Line>, Self::Error>;

  fn stops(&self) -> Result<Vec<Stop>, Self::Error>;

  fn calendars(&self) -> Result<Vec<Calendar>, Self::Error>;

  fn calendar_exceptions(&self) -> Result<Vec<CalendarException>, Self::Error>;

  fn patterns(&self) -> Result<Vec<Pattern>, Self::Error>;

  /// The stops of one pattern, in index order.
  fn pattern_stops(&self, pattern: PatternId) -> Result<Vec<PatternStop>, Self::Error>;

  fn trips(&self, pattern: PatternId) -> Result<Vec<Trip>, Self::Error>;

  fn find_pattern_stops(
    &self,
    query: &PatternStopQuery,
  ) -> Result<Vec<PatternStop>, Self::Error>;

  // ── Maintenance ───────────────────────────────────────────────────────

  fn count(&self, kind: EntityKind) -> Result<usize, Self::Error>;

  /// Highest id in use for `kind`, `None` when the table is empty.
  fn max_id(&self, kind: EntityKind) -> Result<Option<i64>, Self::Error>;

  fn delete_all(&self, kind: EntityKind) -> Result<(), Self::Error>;

  /// Delete every stored entity, children first.
  fn clear(&self) -> Result<(), Self::Error> {
    for kind in EntityKind::CLEAR_ORDER {
      self.delete_all(kind)?;
    }
    Ok(())
  }
}
