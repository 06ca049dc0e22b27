//! [`SqliteStore`]: the SQLite implementation of [`TransitStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, Params, Row, types::Value};

use szallitas_core::{
  agency::{Agency, AgencyId, NewAgency},
  calendar::{
    Calendar, CalendarException, CalendarExceptionId, CalendarId, NewCalendar,
    NewCalendarException,
  },
  line::{Line, LineId, NewLine},
  pattern::{NewPatternStop, Pattern, PatternId, PatternStop},
  stop::{NewStop, Stop, StopId},
  store::{EntityKind, PatternStopQuery, TransitStore},
  trip::{NewTrip, Trip},
};

use crate::{
  Result,
  encode::{
    CALENDAR_COLUMNS, CALENDAR_EXCEPTION_COLUMNS, LINE_COLUMNS, PATTERN_COLUMNS,
    PATTERN_STOP_COLUMNS, RawCalendar, RawCalendarException, RawLine, RawPattern,
    RawPatternStop, RawStop, RawTrip, STOP_COLUMNS, TRIP_COLUMNS, encode_date,
    encode_seconds, table_name,
  },
  schema::SCHEMA,
};

/// SQLite refuses statements with more bound parameters than this
/// (`SQLITE_MAX_VARIABLE_NUMBER` in builds before 3.32).
pub const MAX_PARAMETERS: usize = 999;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A transit store backed by a single SQLite file.
pub struct SqliteStore {
  conn: rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = rusqlite::Connection::open(path)?;
    let store = Self { conn };
    store.init_schema()?;
    Ok(store)
  }

  /// Open a private in-memory store.
  pub fn open_in_memory() -> Result<Self> {
    let conn = rusqlite::Connection::open_in_memory()?;
    let store = Self { conn };
    store.init_schema()?;
    Ok(store)
  }

  fn init_schema(&self) -> Result<()> {
    self.conn.execute_batch(SCHEMA)?;
    Ok(())
  }

  fn query_all<T, P: Params>(
    &self,
    sql: &str,
    params: P,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
  ) -> Result<Vec<T>> {
    let mut stmt = self.conn.prepare_cached(sql)?;
    let rows = stmt
      .query_map(params, map)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }

  fn query_one<T, P: Params>(
    &self,
    sql: &str,
    params: P,
    map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
  ) -> Result<Option<T>> {
    Ok(self.conn.query_row(sql, params, map).optional()?)
  }

  /// Insert `rows` into `table` with multi-row `INSERT` statements, each
  /// binding at most [`MAX_PARAMETERS`] values.
  fn bulk_insert<const N: usize>(
    &self,
    table: &str,
    columns: [&str; N],
    rows: &[[Value; N]],
  ) -> Result<()> {
    if rows.is_empty() {
      return Ok(());
    }

    let rows_per_statement = (MAX_PARAMETERS / N).max(1);
    let placeholders = format!("({})", ["?"; N].join(", "));
    let column_list = columns.join(", ");

    for chunk in rows.chunks(rows_per_statement) {
      let values = vec![placeholders.as_str(); chunk.len()].join(", ");
      let sql = format!("INSERT INTO {table} ({column_list}) VALUES {values}");
      let mut stmt = self.conn.prepare_cached(&sql)?;
      stmt.execute(rusqlite::params_from_iter(chunk.iter().flatten()))?;
    }
    Ok(())
  }
}

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

fn agency_from_row(row: &Row<'_>) -> rusqlite::Result<Agency> {
  Ok(Agency {
    id:        row.get(0)?,
    name:      row.get(1)?,
    website:   row.get(2)?,
    timezone:  row.get(3)?,
    telephone: row.get(4)?,
  })
}

const AGENCY_COLUMNS: &str = "id, name, website, timezone, telephone";

// ─── TransitStore impl ───────────────────────────────────────────────────────

impl TransitStore for SqliteStore {
  type Error = crate::Error;

  // ── Transactions ──────────────────────────────────────────────────────────

  fn atomic<T, E, F>(&self, procedure: F) -> Result<Result<T, E>>
  where
    F: FnOnce(&Self) -> Result<T, E>,
  {
    let tx = self.conn.unchecked_transaction()?;
    match procedure(self) {
      Ok(value) => {
        tx.commit()?;
        Ok(Ok(value))
      }
      Err(e) => {
        tx.rollback()?;
        Ok(Err(e))
      }
    }
  }

  // ── Single-row writes ─────────────────────────────────────────────────────

  fn create_agency(&self, new: &NewAgency) -> Result<AgencyId> {
    self.conn.execute(
      "INSERT INTO agencies (name, website, timezone, telephone) VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![new.name, new.website, new.timezone, new.telephone],
    )?;
    Ok(self.conn.last_insert_rowid())
  }

  fn create_line(&self, new: &NewLine) -> Result<LineId> {
    self.conn.execute(
      "INSERT INTO lines (code, description, line_type, agency_id) VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![new.code, new.description, new.line_type.code(), new.agency_id],
    )?;
    Ok(self.conn.last_insert_rowid())
  }

  fn create_stop(&self, new: &NewStop) -> Result<StopId> {
    self.conn.execute(
      "INSERT INTO stops (name, code, lat, lon, wheelchair_accessible)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        new.name,
        new.code,
        new.lat.micro_degrees(),
        new.lon.micro_degrees(),
        new.wheelchair_accessible.code(),
      ],
    )?;
    Ok(self.conn.last_insert_rowid())
  }

  fn create_calendar(&self, new: &NewCalendar) -> Result<CalendarId> {
    let [monday, tuesday, wednesday, thursday, friday, saturday, sunday] = new.days;
    self.conn.execute(
      "INSERT INTO calendars (
         name, start_date, end_date,
         monday, tuesday, wednesday, thursday, friday, saturday, sunday
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
      rusqlite::params![
        new.name,
        encode_date(new.start_date),
        new.end_date.map(encode_date),
        monday,
        tuesday,
        wednesday,
        thursday,
        friday,
        saturday,
        sunday,
      ],
    )?;
    Ok(self.conn.last_insert_rowid())
  }

  fn create_calendar_exception(
    &self,
    new: &NewCalendarException,
  ) -> Result<CalendarExceptionId> {
    self.conn.execute(
      "INSERT INTO calendar_exceptions (calendar_id, day, added) VALUES (?1, ?2, ?3)",
      rusqlite::params![new.calendar_id, encode_date(new.day), new.added],
    )?;
    Ok(self.conn.last_insert_rowid())
  }

  // ── Bulk writes ───────────────────────────────────────────────────────────

  fn bulk_create_patterns(&self, patterns: &[Pattern]) -> Result<()> {
    let rows: Vec<[Value; 4]> = patterns
      .iter()
      .map(|p| {
        [
          Value::Integer(p.id),
          text(&p.headsign),
          p.direction.map_or(Value::Null, |d| Value::Integer(d.code())),
          Value::Integer(p.line_id),
        ]
      })
      .collect();
    self.bulk_insert("patterns", ["id", "headsign", "direction", "line_id"], &rows)
  }

  fn bulk_create_pattern_stops(&self, stops: &[NewPatternStop]) -> Result<()> {
    let rows: Vec<[Value; 4]> = stops
      .iter()
      .map(|ps| {
        [
          Value::Integer(ps.pattern_id),
          Value::Integer(ps.stop_id),
          Value::Integer(encode_seconds(ps.travel_time)),
          Value::Integer(i64::from(ps.index)),
        ]
      })
      .collect();
    self.bulk_insert(
      "pattern_stops",
      ["pattern_id", "stop_id", "travel_time", "stop_index"],
      &rows,
    )
  }

  fn bulk_create_trips(&self, trips: &[NewTrip]) -> Result<()> {
    let rows: Vec<[Value; 4]> = trips
      .iter()
      .map(|t| {
        [
          Value::Integer(t.wheelchair_accessible.code()),
          Value::Integer(encode_seconds(t.departure)),
          Value::Integer(t.pattern_id),
          Value::Integer(t.calendar_id),
        ]
      })
      .collect();
    self.bulk_insert(
      "trips",
      ["wheelchair_accessible", "departure", "pattern_id", "calendar_id"],
      &rows,
    )
  }

  // ── Reads by id ───────────────────────────────────────────────────────────

  fn get_agency(&self, id: AgencyId) -> Result<Option<Agency>> {
    self.query_one(
      &format!("SELECT {AGENCY_COLUMNS} FROM agencies WHERE id = ?1"),
      [id],
      agency_from_row,
    )
  }

  fn get_line(&self, id: LineId) -> Result<Option<Line>> {
    self
      .query_one(
        &format!("SELECT {LINE_COLUMNS} FROM lines WHERE id = ?1"),
        [id],
        RawLine::from_row,
      )?
      .map(RawLine::into_line)
      .transpose()
  }

  fn get_stop(&self, id: StopId) -> Result<Option<Stop>> {
    self
      .query_one(
        &format!("SELECT {STOP_COLUMNS} FROM stops WHERE id = ?1"),
        [id],
        RawStop::from_row,
      )?
      .map(RawStop::into_stop)
      .transpose()
  }

  fn get_calendar(&self, id: CalendarId) -> Result<Option<Calendar>> {
    self
      .query_one(
        &format!("SELECT {CALENDAR_COLUMNS} FROM calendars WHERE id = ?1"),
        [id],
        RawCalendar::from_row,
      )?
      .map(RawCalendar::into_calendar)
      .transpose()
  }

  fn get_pattern(&self, id: PatternId) -> Result<Option<Pattern>> {
    self
      .query_one(
        &format!("SELECT {PATTERN_COLUMNS} FROM patterns WHERE id = ?1"),
        [id],
        RawPattern::from_row,
      )?
      .map(RawPattern::into_pattern)
      .transpose()
  }

  // ── Listings ──────────────────────────────────────────────────────────────

  fn agencies(&self) -> Result<Vec<Agency>> {
    self.query_all(
      &format!("SELECT {AGENCY_COLUMNS} FROM agencies ORDER BY id"),
      [],
      agency_from_row,
    )
  }

  fn lines(&self) -> Result<Vec<Line>> {
    self
      .query_all(
        &format!("SELECT {LINE_COLUMNS} FROM lines ORDER BY id"),
        [],
        RawLine::from_row,
      )?
      .into_iter()
      .map(RawLine::into_line)
      .collect()
  }

  fn stops(&self) -> Result<Vec<Stop>> {
    self
      .query_all(
        &format!("SELECT {STOP_COLUMNS} FROM stops ORDER BY id"),
        [],
        RawStop::from_row,
      )?
      .into_iter()
      .map(RawStop::into_stop)
      .collect()
  }

  fn calendars(&self) -> Result<Vec<Calendar>> {
    self
      .query_all(
        &format!("SELECT {CALENDAR_COLUMNS} FROM calendars ORDER BY id"),
        [],
        RawCalendar::from_row,
      )?
      .into_iter()
      .map(RawCalendar::into_calendar)
      .collect()
  }

  fn calendar_exceptions(&self) -> Result<Vec<CalendarException>> {
    self
      .query_all(
        &format!("SELECT {CALENDAR_EXCEPTION_COLUMNS} FROM calendar_exceptions ORDER BY id"),
        [],
        RawCalendarException::from_row,
      )?
      .into_iter()
      .map(RawCalendarException::into_exception)
      .collect()
  }

  fn patterns(&self) -> Result<Vec<Pattern>> {
    self
      .query_all(
        &format!("SELECT {PATTERN_COLUMNS} FROM patterns ORDER BY id"),
        [],
        RawPattern::from_row,
      )?
      .into_iter()
      .map(RawPattern::into_pattern)
      .collect()
  }

  fn pattern_stops(&self, pattern: PatternId) -> Result<Vec<PatternStop>> {
    self
      .query_all(
        &format!(
          "SELECT {PATTERN_STOP_COLUMNS} FROM pattern_stops
           WHERE pattern_id = ?1 ORDER BY stop_index"
        ),
        [pattern],
        RawPatternStop::from_row,
      )?
      .into_iter()
      .map(RawPatternStop::into_pattern_stop)
      .collect()
  }

  fn trips(&self, pattern: PatternId) -> Result<Vec<Trip>> {
    self
      .query_all(
        &format!("SELECT {TRIP_COLUMNS} FROM trips WHERE pattern_id = ?1 ORDER BY id"),
        [pattern],
        RawTrip::from_row,
      )?
      .into_iter()
      .map(RawTrip::into_trip)
      .collect()
  }

  fn find_pattern_stops(&self, query: &PatternStopQuery) -> Result<Vec<PatternStop>> {
    let direction = query.direction.map(|d| d.code());
    self
      .query_all(
        "SELECT ps.id, ps.pattern_id, ps.stop_id, ps.travel_time, ps.stop_index
         FROM pattern_stops ps
         JOIN patterns p ON p.id = ps.pattern_id
         WHERE ps.stop_id = ?1
           AND (?2 IS NULL OR p.line_id   = ?2)
           AND (?3 IS NULL OR p.headsign  = ?3)
           AND (?4 IS NULL OR p.direction = ?4)
         ORDER BY p.id, ps.stop_index",
        rusqlite::params![query.stop, query.line, query.headsign, direction],
        RawPatternStop::from_row,
      )?
      .into_iter()
      .map(RawPatternStop::into_pattern_stop)
      .collect()
  }

  // ── Maintenance ───────────────────────────────────────────────────────────

  fn count(&self, kind: EntityKind) -> Result<usize> {
    let n: i64 = self.conn.query_row(
      &format!("SELECT COUNT(*) FROM {}", table_name(kind)),
      [],
      |r| r.get(0),
    )?;
    Ok(n.max(0) as usize)
  }

  fn max_id(&self, kind: EntityKind) -> Result<Option<i64>> {
    Ok(self.conn.query_row(
      &format!("SELECT MAX(id) FROM {}", table_name(kind)),
      [],
      |r| r.get(0),
    )?)
  }

  fn delete_all(&self, kind: EntityKind) -> Result<()> {
    self
      .conn
      .execute(&format!("DELETE FROM {}", table_name(kind)), [])?;
    Ok(())
  }
}
