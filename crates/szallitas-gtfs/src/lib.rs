//! GTFS engine for szallitas.
//!
//! Moves transit data between GTFS zip archives and any
//! [`szallitas_core::store::TransitStore`]: [`import`] loads a feed,
//! collapsing trips that share a stop sequence into patterns; [`export`]
//! writes the stored network back out as a feed; [`timetable`] renders the
//! departure grid of a stop.
//!
//! Everything here is synchronous and single-threaded. Callers on an async
//! runtime should run it on a blocking thread.

pub mod error;
pub mod export;
pub mod import;
pub mod table;
pub mod timetable;

pub use error::{Error, Result};
pub use export::{ExportSummary, export};
pub use import::{ImportOptions, ImportSummary, import};
pub use timetable::{CalendarTimetable, HourRow, generate_timetable, timetable_for};

/// Archive member names, in the order the exporter writes them.
pub mod members {
  pub const AGENCY: &str = "agency.txt";
  pub const ROUTES: &str = "routes.txt";
  pub const STOPS: &str = "stops.txt";
  pub const CALENDAR: &str = "calendar.txt";
  pub const CALENDAR_DATES: &str = "calendar_dates.txt";
  pub const TRIPS: &str = "trips.txt";
  pub const STOP_TIMES: &str = "stop_times.txt";

  pub const ALL: [&str; 7] =
    [AGENCY, ROUTES, STOPS, CALENDAR, CALENDAR_DATES, TRIPS, STOP_TIMES];
}
