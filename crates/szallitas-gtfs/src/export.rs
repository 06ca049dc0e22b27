//! GTFS feed export.
//!
//! Each table is rendered to its own file in a temporary directory, then the
//! files are packed into a deflate-compressed zip in a fixed member order.
//! The export only reads from the store; callers must not run it alongside an
//! import.

use std::{
  fmt,
  fs::File,
  io::{self, Seek, Write},
  path::Path,
};

use serde::Serialize;
use szallitas_core::{
  agency::Agency,
  calendar::{Calendar, CalendarException},
  line::Line,
  stop::Stop,
  store::TransitStore,
  time::{format_gtfs_date, format_gtfs_time},
};
use tracing::{info, warn};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
  Error, Result,
  error::StoreResultExt as _,
  members::{self, AGENCY, CALENDAR, CALENDAR_DATES, ROUTES, STOP_TIMES, STOPS, TRIPS},
  table::{Column, table_writer, write_table},
};

/// Rows written per table, header excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
  pub agencies:       usize,
  pub routes:         usize,
  pub stops:          usize,
  pub calendars:      usize,
  pub calendar_dates: usize,
  pub trips:          usize,
  pub stop_times:     usize,
}

impl fmt::Display for ExportSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} agencies, {} routes, {} stops, {} calendars, {} calendar dates, \
       {} trips, {} stop times",
      self.agencies,
      self.routes,
      self.stops,
      self.calendars,
      self.calendar_dates,
      self.trips,
      self.stop_times,
    )
  }
}

/// Write everything in `store` as a GTFS zip archive to `sink`.
pub fn export<S, W>(store: &S, sink: W) -> Result<ExportSummary>
where
  S: TransitStore,
  W: Write + Seek,
{
  let workspace = tempfile::Builder::new().prefix("szallitas-gtfs-export").tempdir()?;
  let dir = workspace.path();
  let create = |member: &str| File::create(dir.join(member));

  let agencies = write_agencies(store, create(AGENCY)?)?;
  let routes = write_routes(store, create(ROUTES)?)?;
  let stops = write_stops(store, create(STOPS)?)?;
  let calendars = write_calendars(store, create(CALENDAR)?)?;
  let calendar_dates = write_calendar_dates(store, create(CALENDAR_DATES)?)?;
  let (trips, stop_times) =
    write_trips_and_stop_times(store, create(TRIPS)?, create(STOP_TIMES)?)?;
  let summary = ExportSummary {
    agencies,
    routes,
    stops,
    calendars,
    calendar_dates,
    trips,
    stop_times,
  };

  pack(dir, sink)?;
  info!(
    agencies = summary.agencies,
    routes = summary.routes,
    stops = summary.stops,
    calendars = summary.calendars,
    calendar_dates = summary.calendar_dates,
    trips = summary.trips,
    stop_times = summary.stop_times,
    "GTFS export finished"
  );
  Ok(summary)
}

fn pack<W: Write + Seek>(dir: &Path, sink: W) -> Result<()> {
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
  let mut zip = ZipWriter::new(sink);
  for member in members::ALL {
    zip.start_file(member, options).map_err(Error::Archive)?;
    io::copy(&mut File::open(dir.join(member))?, &mut zip)?;
  }
  zip.finish().map_err(Error::Archive)?;
  Ok(())
}

// ─── Simple tables ───────────────────────────────────────────────────────────

fn write_agencies<S: TransitStore>(store: &S, out: impl Write) -> Result<usize> {
  let agencies = store.agencies().store_err()?;
  for agency in agencies.iter().filter(|a| a.timezone.is_none()) {
    warn!(agency_id = agency.id, name = %agency.name, "agency has no timezone, exporting UTC");
  }

  write_table(out, &agencies, &[
    Column::new("agency_id", |a: &Agency| a.id),
    Column::new("agency_name", |a: &Agency| a.name.clone()),
    Column::new("agency_url", |a: &Agency| a.website.clone()),
    Column::optional("agency_timezone", |a: &Agency| a.timezone.clone()).fallback("UTC"),
    Column::optional("agency_phone", |a: &Agency| a.telephone.clone()),
  ])
}

fn write_routes<S: TransitStore>(store: &S, out: impl Write) -> Result<usize> {
  write_table(out, &store.lines().store_err()?, &[
    Column::new("route_id", |l: &Line| l.id),
    Column::new("agency_id", |l: &Line| l.agency_id),
    Column::new("route_short_name", |l: &Line| l.code.clone()),
    Column::optional("route_long_name", |l: &Line| l.description.clone()),
    Column::new("route_type", |l: &Line| l.line_type.code()),
  ])
}

fn write_stops<S: TransitStore>(store: &S, out: impl Write) -> Result<usize> {
  write_table(out, &store.stops().store_err()?, &[
    Column::new("stop_id", |s: &Stop| s.id),
    Column::new("stop_name", |s: &Stop| s.name.clone()),
    Column::optional("stop_code", |s: &Stop| s.code.clone()),
    Column::new("stop_lat", |s: &Stop| s.lat),
    Column::new("stop_lon", |s: &Stop| s.lon),
    Column::new("wheelchair_boarding", |s: &Stop| s.wheelchair_accessible.code()),
  ])
}

fn write_calendars<S: TransitStore>(store: &S, out: impl Write) -> Result<usize> {
  const DAYS: [&str; 7] =
    ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];

  let mut columns = vec![Column::new("service_id", |c: &Calendar| c.id)];
  columns.extend(
    DAYS
      .into_iter()
      .enumerate()
      .map(|(i, day)| Column::new(day, move |c: &Calendar| u8::from(c.days()[i]))),
  );
  columns.extend([
    Column::converted("start_date", |c: &Calendar| Some(c.start_date), format_gtfs_date),
    Column::converted("end_date", |c: &Calendar| c.end_date, format_gtfs_date),
    Column::new("service_desc", |c: &Calendar| c.name.clone()),
  ]);

  write_table(out, &store.calendars().store_err()?, &columns)
}

fn write_calendar_dates<S: TransitStore>(store: &S, out: impl Write) -> Result<usize> {
  write_table(out, &store.calendar_exceptions().store_err()?, &[
    Column::new("service_id", |e: &CalendarException| e.calendar_id),
    Column::converted("date", |e: &CalendarException| Some(e.day), format_gtfs_date),
    Column::new("exception_type", |e: &CalendarException| if e.added { 1 } else { 2 }),
  ])
}

// ─── Trips and stop times ────────────────────────────────────────────────────

/// Expand every pattern back into one `trips.txt` row per trip and one
/// `stop_times.txt` row per (trip, pattern stop). Arrival and departure are
/// both the trip departure plus the stop's travel time.
fn write_trips_and_stop_times<S: TransitStore>(
  store: &S,
  trips_out: impl Write,
  times_out: impl Write,
) -> Result<(usize, usize)> {
  let mut trips = table_writer(trips_out);
  let mut times = table_writer(times_out);
  trips.write_record([
    "route_id",
    "service_id",
    "trip_id",
    "trip_headsign",
    "direction_id",
    "wheelchair_accessible",
  ])?;
  times.write_record(["trip_id", "stop_sequence", "stop_id", "arrival_time", "departure_time"])?;

  let (mut trip_count, mut time_count) = (0, 0);
  for pattern in store.patterns().store_err()? {
    let stops = store.pattern_stops(pattern.id).store_err()?;
    let direction = pattern.direction.map(|d| d.code().to_string()).unwrap_or_default();

    for trip in store.trips(pattern.id).store_err()? {
      let trip_id = trip.id.to_string();
      trips.write_record([
        pattern.line_id.to_string(),
        trip.calendar_id.to_string(),
        trip_id.clone(),
        pattern.headsign.clone(),
        direction.clone(),
        trip.wheelchair_accessible.code().to_string(),
      ])?;
      trip_count += 1;

      for stop in &stops {
        let at = format_gtfs_time(trip.departure + stop.travel_time);
        times.write_record([
          trip_id.clone(),
          stop.index.to_string(),
          stop.stop_id.to_string(),
          at.clone(),
          at,
        ])?;
        time_count += 1;
      }
    }
  }

  trips.flush()?;
  times.flush()?;
  Ok((trip_count, time_count))
}
