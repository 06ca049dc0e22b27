//! SQL schema for the szallitas SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS agencies (
    id        INTEGER PRIMARY KEY,
    name      TEXT NOT NULL,
    website   TEXT NOT NULL,
    timezone  TEXT,
    telephone TEXT
);

-- Coordinates are integer micro-degrees (six fractional digits).
CREATE TABLE IF NOT EXISTS stops (
    id                    INTEGER PRIMARY KEY,
    name                  TEXT NOT NULL,
    code                  TEXT,
    lat                   INTEGER NOT NULL,
    lon                   INTEGER NOT NULL,
    wheelchair_accessible INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS lines (
    id          INTEGER PRIMARY KEY,
    code        TEXT NOT NULL,
    description TEXT,
    line_type   INTEGER NOT NULL,   -- GTFS route_type
    agency_id   INTEGER NOT NULL REFERENCES agencies(id) ON DELETE CASCADE
);

-- Dates are ISO 8601 (YYYY-MM-DD).
CREATE TABLE IF NOT EXISTS calendars (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date   TEXT,
    monday     INTEGER NOT NULL,
    tuesday    INTEGER NOT NULL,
    wednesday  INTEGER NOT NULL,
    thursday   INTEGER NOT NULL,
    friday     INTEGER NOT NULL,
    saturday   INTEGER NOT NULL,
    sunday     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS calendar_exceptions (
    id          INTEGER PRIMARY KEY,
    calendar_id INTEGER NOT NULL REFERENCES calendars(id) ON DELETE CASCADE,
    day         TEXT NOT NULL,
    added       INTEGER NOT NULL,
    UNIQUE (calendar_id, day)
);

-- Pattern ids are reserved by the importer, never assigned by SQLite.
CREATE TABLE IF NOT EXISTS patterns (
    id        INTEGER PRIMARY KEY,
    headsign  TEXT NOT NULL,
    direction INTEGER,              -- 0 inbound, 1 outbound, NULL unknown
    line_id   INTEGER NOT NULL REFERENCES lines(id) ON DELETE CASCADE
);

-- travel_time is whole seconds from the pattern's first stop.
CREATE TABLE IF NOT EXISTS pattern_stops (
    id          INTEGER PRIMARY KEY,
    pattern_id  INTEGER NOT NULL REFERENCES patterns(id) ON DELETE CASCADE,
    stop_id     INTEGER NOT NULL REFERENCES stops(id) ON DELETE CASCADE,
    travel_time INTEGER NOT NULL CHECK (travel_time >= 0),
    stop_index  INTEGER NOT NULL CHECK (stop_index >= 0),
    UNIQUE (pattern_id, stop_index)
);

-- departure is whole seconds since the start of the service day.
CREATE TABLE IF NOT EXISTS trips (
    id                    INTEGER PRIMARY KEY,
    wheelchair_accessible INTEGER NOT NULL DEFAULT 0,
    departure             INTEGER NOT NULL,
    pattern_id            INTEGER NOT NULL REFERENCES patterns(id) ON DELETE CASCADE,
    calendar_id           INTEGER NOT NULL REFERENCES calendars(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS lines_agency_idx         ON lines(agency_id);
CREATE INDEX IF NOT EXISTS patterns_line_idx        ON patterns(line_id);
CREATE INDEX IF NOT EXISTS pattern_stops_stop_idx   ON pattern_stops(stop_id);
CREATE INDEX IF NOT EXISTS trips_pattern_idx        ON trips(pattern_id);
CREATE INDEX IF NOT EXISTS trips_calendar_idx       ON trips(calendar_id);
CREATE INDEX IF NOT EXISTS calendar_exceptions_idx  ON calendar_exceptions(calendar_id);

PRAGMA user_version = 1;
";
