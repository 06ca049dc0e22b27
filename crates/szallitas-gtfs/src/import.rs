//! GTFS feed import.
//!
//! An import runs inside one store transaction: either every entity of the
//! feed is written or none is. Tables are read in dependency order (agencies,
//! routes, stops, calendars, calendar dates, then trips with their stop
//! times), each resolving the feed's string ids through the maps filled by
//! the tables before it.
//!
//! Trips that share a line, direction, headsign and the exact sequence of
//! (stop, travel time) pairs are stored against one [`Pattern`]. Pattern ids
//! are reserved from a counter before the pattern row is written, so patterns,
//! their stops and their trips can all be bulk-inserted per batch without
//! reading ids back.
//!
//! `calendar.txt` is read before `calendar_dates.txt`: an exception naming a
//! service that `calendar.txt` did not define gets a placeholder calendar.

use std::{
  collections::{HashMap, HashSet, hash_map::Entry},
  fmt,
  io::{Read, Seek},
};

use chrono::TimeDelta;
use serde::Serialize;
use szallitas_core::{
  agency::{AgencyId, NewAgency},
  calendar::{CalendarId, NewCalendar, NewCalendarException},
  line::{LineId, LineType, NewLine},
  pattern::{Direction, NewPatternStop, Pattern, PatternId},
  stop::{Coordinate, NewStop, StopId, WheelchairAccessibility},
  store::{EntityKind, TransitStore},
  time::{parse_gtfs_date, parse_gtfs_time},
  trip::NewTrip,
};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::{
  Error, Result,
  error::StoreResultExt as _,
  members::{AGENCY, CALENDAR, CALENDAR_DATES, ROUTES, STOP_TIMES, STOPS, TRIPS},
  table::{Row, TableReader},
};

/// Upper bound on trips handled per batch flush.
pub const MAX_BATCH_SIZE: usize = 999;

// ─── Options and summary ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
  /// Trips read from `trips.txt` between two bulk flushes. Clamped to
  /// `1..=MAX_BATCH_SIZE`.
  pub batch_size: usize,
}

impl Default for ImportOptions {
  fn default() -> Self { Self { batch_size: MAX_BATCH_SIZE } }
}

impl ImportOptions {
  fn effective_batch_size(&self) -> usize { self.batch_size.clamp(1, MAX_BATCH_SIZE) }
}

/// Rows created by one import, per entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
  pub agencies:            usize,
  pub lines:               usize,
  pub stops:               usize,
  pub calendars:           usize,
  pub calendar_exceptions: usize,
  pub patterns:            usize,
  pub pattern_stops:       usize,
  pub trips:               usize,
}

impl fmt::Display for ImportSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} agencies, {} lines, {} stops, {} calendars, {} calendar exceptions, \
       {} patterns, {} pattern stops, {} trips",
      self.agencies,
      self.lines,
      self.stops,
      self.calendars,
      self.calendar_exceptions,
      self.patterns,
      self.pattern_stops,
      self.trips,
    )
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Import the GTFS zip archive read from `source` into `store`.
///
/// The archive is validated before anything is written. Any error rolls the
/// whole import back.
pub fn import<S, R>(store: &S, source: R, options: &ImportOptions) -> Result<ImportSummary>
where
  S: TransitStore,
  R: Read + Seek,
{
  let mut archive = ZipArchive::new(source)?;
  let layout = Layout::inspect(&archive)?;

  let summary = store
    .atomic(|tx| ImportSession::begin(tx, options)?.run(&mut archive, layout))
    .store_err()??;

  info!(
    agencies = summary.agencies,
    lines = summary.lines,
    stops = summary.stops,
    calendars = summary.calendars,
    calendar_exceptions = summary.calendar_exceptions,
    patterns = summary.patterns,
    pattern_stops = summary.pattern_stops,
    trips = summary.trips,
    "GTFS import finished"
  );
  Ok(summary)
}

/// Which optional calendar tables the archive carries.
#[derive(Debug, Clone, Copy)]
struct Layout {
  calendar:       bool,
  calendar_dates: bool,
}

impl Layout {
  fn inspect<R: Read + Seek>(archive: &ZipArchive<R>) -> Result<Self> {
    let names: HashSet<&str> = archive.file_names().collect();
    for table in [AGENCY, ROUTES, STOPS, TRIPS, STOP_TIMES] {
      if !names.contains(table) {
        return Err(Error::MissingRequiredTable(table));
      }
    }

    let layout = Self {
      calendar:       names.contains(CALENDAR),
      calendar_dates: names.contains(CALENDAR_DATES),
    };
    if !layout.calendar && !layout.calendar_dates {
      return Err(Error::CalendarFileNotFound);
    }
    Ok(layout)
  }
}

fn open<'z, R: Read + Seek>(
  archive: &'z mut ZipArchive<R>,
  table: &'static str,
) -> Result<TableReader<impl Read + 'z>> {
  TableReader::new(table, archive.by_name(table)?)
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// One departure of a trip, as read from `stop_times.txt`.
#[derive(Debug, Clone, Copy)]
struct StopTime {
  sequence:  u32,
  stop_id:   StopId,
  departure: TimeDelta,
}

/// Everything that makes two trips share a pattern.
#[derive(Debug, PartialEq, Eq, Hash)]
struct PatternKey {
  headsign:  String,
  direction: Option<Direction>,
  line_id:   LineId,
  /// (stop, travel time from the first stop) in calling order.
  stops:     Vec<(StopId, TimeDelta)>,
}

/// Rows waiting for the next bulk flush.
#[derive(Debug, Default)]
struct Pending {
  patterns:      Vec<Pattern>,
  pattern_stops: Vec<NewPatternStop>,
  trips:         Vec<NewTrip>,
}

impl Pending {
  fn is_empty(&self) -> bool {
    self.patterns.is_empty() && self.pattern_stops.is_empty() && self.trips.is_empty()
  }

  fn clear(&mut self) {
    self.patterns.clear();
    self.pattern_stops.clear();
    self.trips.clear();
  }
}

/// State of one import, alive for exactly one transaction.
///
/// Maps feed ids to store ids, remembers every pattern seen so far and hands
/// out pattern ids.
struct ImportSession<'s, S> {
  store:           &'s S,
  batch_size:      usize,
  agencies:        HashMap<String, AgencyId>,
  lines:           HashMap<String, LineId>,
  stops:           HashMap<String, StopId>,
  stop_names:      HashMap<StopId, String>,
  calendars:       HashMap<String, CalendarId>,
  stop_times:      HashMap<String, Vec<StopTime>>,
  patterns:        HashMap<PatternKey, PatternId>,
  next_pattern_id: PatternId,
  pending:         Pending,
  summary:         ImportSummary,
}

impl<'s, S: TransitStore> ImportSession<'s, S> {
  fn begin(store: &'s S, options: &ImportOptions) -> Result<Self> {
    let next_pattern_id = store.max_id(EntityKind::Pattern).store_err()?.unwrap_or(0) + 1;
    Ok(Self {
      store,
      batch_size: options.effective_batch_size(),
      agencies: HashMap::new(),
      lines: HashMap::new(),
      stops: HashMap::new(),
      stop_names: HashMap::new(),
      calendars: HashMap::new(),
      stop_times: HashMap::new(),
      patterns: HashMap::new(),
      next_pattern_id,
      pending: Pending::default(),
      summary: ImportSummary::default(),
    })
  }

  fn run<R: Read + Seek>(
    mut self,
    archive: &mut ZipArchive<R>,
    layout: Layout,
  ) -> Result<ImportSummary> {
    self.import_agencies(open(archive, AGENCY)?)?;
    self.import_lines(open(archive, ROUTES)?)?;
    self.import_stops(open(archive, STOPS)?)?;
    if layout.calendar {
      self.import_calendars(open(archive, CALENDAR)?)?;
    }
    if layout.calendar_dates {
      self.import_calendar_exceptions(open(archive, CALENDAR_DATES)?)?;
    }
    self.load_stop_times(open(archive, STOP_TIMES)?)?;
    self.import_trips(open(archive, TRIPS)?)?;
    Ok(self.summary)
  }

  // ── Simple tables ─────────────────────────────────────────────────────

  fn import_agencies(&mut self, rows: TableReader<impl Read>) -> Result<()> {
    for row in rows {
      let row = row?;
      let new = NewAgency {
        name:      row.required("agency_name")?.to_owned(),
        website:   row.required("agency_url")?.to_owned(),
        timezone:  row.optional("agency_timezone").map(str::to_owned),
        telephone: row.optional("agency_phone").map(str::to_owned),
      };
      let id = self.store.create_agency(&new).store_err()?;
      self
        .agencies
        .insert(row.optional("agency_id").unwrap_or_default().to_owned(), id);
      self.summary.agencies += 1;
    }
    info!(count = self.summary.agencies, "imported agencies");
    Ok(())
  }

  fn import_lines(&mut self, rows: TableReader<impl Read>) -> Result<()> {
    for row in rows {
      let row = row?;
      let route_id = row.required("route_id")?;
      let agency_id = match row.optional("agency_id") {
        Some(external) => *self
          .agencies
          .get(external)
          .ok_or_else(|| row.unresolved("agency", external))?,
        None => self.sole_agency().ok_or_else(|| {
          row.malformed("agency_id may only be omitted when the feed has exactly one agency")
        })?,
      };
      let line_type = LineType::from_code(row.parse("route_type")?)
        .map_err(|e| row.malformed(e.to_string()))?;

      let id = self
        .store
        .create_line(&NewLine {
          code: row.optional("route_short_name").unwrap_or_default().to_owned(),
          description: row.optional("route_long_name").map(str::to_owned),
          line_type,
          agency_id,
        })
        .store_err()?;
      self.lines.insert(route_id.to_owned(), id);
      self.summary.lines += 1;
    }
    info!(count = self.summary.lines, "imported lines");
    Ok(())
  }

  fn sole_agency(&self) -> Option<AgencyId> {
    if self.summary.agencies != 1 {
      return None;
    }
    self.agencies.values().next().copied()
  }

  fn import_stops(&mut self, rows: TableReader<impl Read>) -> Result<()> {
    for row in rows {
      let row = row?;
      let stop_id = row.required("stop_id")?;
      let name = row.required("stop_name")?.to_owned();
      let id = self
        .store
        .create_stop(&NewStop {
          name:                  name.clone(),
          code:                  row.optional("stop_code").map(str::to_owned),
          lat:                   row.parse::<Coordinate>("stop_lat")?,
          lon:                   row.parse::<Coordinate>("stop_lon")?,
          wheelchair_accessible: accessibility(&row, "wheelchair_boarding")?,
        })
        .store_err()?;
      self.stops.insert(stop_id.to_owned(), id);
      self.stop_names.insert(id, name);
      self.summary.stops += 1;
    }
    info!(count = self.summary.stops, "imported stops");
    Ok(())
  }

  fn import_calendars(&mut self, rows: TableReader<impl Read>) -> Result<()> {
    const DAYS: [&str; 7] =
      ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];

    for row in rows {
      let row = row?;
      let service_id = row.required("service_id")?;
      let mut days = [false; 7];
      for (day, column) in days.iter_mut().zip(DAYS) {
        *day = flag(&row, column)?;
      }

      let id = self
        .store
        .create_calendar(&NewCalendar {
          name: row.optional("service_desc").unwrap_or(service_id).to_owned(),
          start_date: parse_gtfs_date(row.required("start_date")?)?,
          end_date: row.optional("end_date").map(parse_gtfs_date).transpose()?,
          days,
        })
        .store_err()?;
      self.calendars.insert(service_id.to_owned(), id);
      self.summary.calendars += 1;
    }
    info!(count = self.summary.calendars, "imported calendars");
    Ok(())
  }

  fn import_calendar_exceptions(&mut self, rows: TableReader<impl Read>) -> Result<()> {
    for row in rows {
      let row = row?;
      let service_id = row.required("service_id")?;
      let day = parse_gtfs_date(row.required("date")?)?;
      let added = match row.required("exception_type")? {
        "1" => true,
        "2" => false,
        other => {
          return Err(row.malformed(format!("exception_type must be 1 or 2, got {other:?}")));
        }
      };

      let calendar_id = match self.calendars.get(service_id) {
        Some(&id) => id,
        None => {
          let id = self
            .store
            .create_calendar(&NewCalendar::placeholder(service_id))
            .store_err()?;
          debug!(service_id, "created placeholder calendar");
          self.calendars.insert(service_id.to_owned(), id);
          self.summary.calendars += 1;
          id
        }
      };

      self
        .store
        .create_calendar_exception(&NewCalendarException { calendar_id, day, added })
        .store_err()?;
      self.summary.calendar_exceptions += 1;
    }
    info!(count = self.summary.calendar_exceptions, "imported calendar exceptions");
    Ok(())
  }

  // ── Trips and patterns ────────────────────────────────────────────────

  /// Group `stop_times.txt` by trip, each group in stop sequence order.
  fn load_stop_times(&mut self, rows: TableReader<impl Read>) -> Result<()> {
    let mut count = 0_usize;
    for row in rows {
      let row = row?;
      // Neither boarding nor alighting: not a stop of the pattern.
      if row.optional("pickup_type") == Some("1") && row.optional("drop_off_type") == Some("1") {
        continue;
      }

      let trip_id = row.required("trip_id")?;
      let external_stop = row.required("stop_id")?;
      let stop_id = *self
        .stops
        .get(external_stop)
        .ok_or_else(|| row.unresolved("stop", external_stop))?;
      let departure = match row.optional("departure_time").or(row.optional("arrival_time")) {
        Some(text) => parse_gtfs_time(text)?,
        None => return Err(row.malformed("neither departure_time nor arrival_time is set")),
      };
      let stop_time = StopTime { sequence: row.parse("stop_sequence")?, stop_id, departure };

      match self.stop_times.get_mut(trip_id) {
        Some(times) => times.push(stop_time),
        None => {
          self.stop_times.insert(trip_id.to_owned(), vec![stop_time]);
        }
      }
      count += 1;
    }

    for times in self.stop_times.values_mut() {
      times.sort_by_key(|t| t.sequence);
    }
    debug!(trips = self.stop_times.len(), stop_times = count, "loaded stop times");
    Ok(())
  }

  fn import_trips(&mut self, rows: TableReader<impl Read>) -> Result<()> {
    let mut in_batch = 0;
    for row in rows {
      self.load_trip(&row?)?;
      in_batch += 1;
      if in_batch == self.batch_size {
        self.flush()?;
        in_batch = 0;
      }
    }
    self.flush()?;

    info!(
      patterns = self.summary.patterns,
      trips = self.summary.trips,
      pattern_stops = self.summary.pattern_stops,
      "imported trips"
    );
    Ok(())
  }

  fn load_trip(&mut self, row: &Row) -> Result<()> {
    let trip_id = row.required("trip_id")?;
    let route_id = row.required("route_id")?;
    let line_id = *self
      .lines
      .get(route_id)
      .ok_or_else(|| row.unresolved("route", route_id))?;
    let service_id = row.required("service_id")?;
    let calendar_id = *self
      .calendars
      .get(service_id)
      .ok_or_else(|| row.unresolved("service", service_id))?;
    let direction = row
      .parse_optional::<i64>("direction_id")?
      .map(Direction::from_code)
      .transpose()
      .map_err(|e| row.malformed(e.to_string()))?;
    let wheelchair_accessible = accessibility(row, "wheelchair_accessible")?;

    let times = self.stop_times.get(trip_id).map(Vec::as_slice).unwrap_or_default();
    let (Some(first), Some(last)) = (times.first(), times.last()) else {
      return Err(row.malformed(format!("trip {trip_id:?} has no stop times")));
    };
    let departure = first.departure;
    let stops = times
      .iter()
      .map(|t| {
        let travel_time = t.departure - departure;
        if travel_time < TimeDelta::zero() {
          return Err(row.malformed(format!(
            "trip {trip_id:?} departs stop sequence {} before its first stop",
            t.sequence
          )));
        }
        Ok((t.stop_id, travel_time))
      })
      .collect::<Result<Vec<_>>>()?;
    let headsign = match row.optional("trip_headsign") {
      Some(headsign) => headsign.to_owned(),
      None => self.stop_names.get(&last.stop_id).cloned().unwrap_or_default(),
    };

    let key = PatternKey { headsign, direction, line_id, stops };
    let pattern_id = match self.patterns.entry(key) {
      Entry::Occupied(entry) => *entry.get(),
      Entry::Vacant(entry) => {
        let id = self.next_pattern_id;
        self.next_pattern_id += 1;

        let key = entry.key();
        self.pending.patterns.push(Pattern {
          id,
          headsign: key.headsign.clone(),
          direction: key.direction,
          line_id,
        });
        self.pending.pattern_stops.extend(key.stops.iter().enumerate().map(
          |(index, &(stop_id, travel_time))| NewPatternStop {
            pattern_id: id,
            stop_id,
            travel_time,
            index: index as u32,
          },
        ));
        self.summary.patterns += 1;
        self.summary.pattern_stops += key.stops.len();
        entry.insert(id);
        id
      }
    };

    self.pending.trips.push(NewTrip {
      wheelchair_accessible,
      departure,
      pattern_id,
      calendar_id,
    });
    self.summary.trips += 1;
    Ok(())
  }

  /// Write queued patterns, trips and pattern stops, in that order.
  fn flush(&mut self) -> Result<()> {
    if self.pending.is_empty() {
      return Ok(());
    }
    self.store.bulk_create_patterns(&self.pending.patterns).store_err()?;
    self.store.bulk_create_trips(&self.pending.trips).store_err()?;
    self
      .store
      .bulk_create_pattern_stops(&self.pending.pattern_stops)
      .store_err()?;
    debug!(
      patterns = self.pending.patterns.len(),
      trips = self.pending.trips.len(),
      pattern_stops = self.pending.pattern_stops.len(),
      "flushed batch"
    );
    self.pending.clear();
    Ok(())
  }
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn flag(row: &Row, column: &str) -> Result<bool> {
  match row.required(column)? {
    "0" => Ok(false),
    "1" => Ok(true),
    other => Err(row.malformed(format!("{column} must be 0 or 1, got {other:?}"))),
  }
}

fn accessibility(row: &Row, column: &str) -> Result<WheelchairAccessibility> {
  let code = row.parse_optional::<i64>(column)?.unwrap_or(0);
  WheelchairAccessibility::from_code(code).map_err(|e| row.malformed(e.to_string()))
}
