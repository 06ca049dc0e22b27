//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, TimeDelta};
use szallitas_core::{
  agency::NewAgency,
  calendar::{NewCalendar, NewCalendarException},
  line::{LineType, NewLine},
  pattern::{Direction, NewPatternStop, Pattern},
  stop::{Coordinate, NewStop, WheelchairAccessibility},
  store::{EntityKind, PatternStopQuery, TransitStore},
  trip::NewTrip,
};

use crate::{Error, SqliteStore};

fn store() -> SqliteStore { SqliteStore::open_in_memory().expect("in-memory store") }

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn wkd_agency() -> NewAgency {
  NewAgency {
    name:      "WKD".into(),
    website:   "https://wkd.com.pl".into(),
    timezone:  Some("Europe/Warsaw".into()),
    telephone: None,
  }
}

fn stop_named(name: &str) -> NewStop {
  NewStop {
    name:                  name.into(),
    code:                  None,
    lat:                   "52.227686".parse().unwrap(),
    lon:                   "21.000404".parse().unwrap(),
    wheelchair_accessible: WheelchairAccessibility::NotAccessible,
  }
}

fn weekdays(name: &str) -> NewCalendar {
  NewCalendar {
    name:       name.into(),
    start_date: date(2023, 1, 26),
    end_date:   Some(date(2024, 1, 17)),
    days:       [true, true, true, true, true, false, false],
  }
}

/// Agency, line, two stops and a calendar; returns (line, stops, calendar).
fn seed(s: &SqliteStore) -> (i64, [i64; 2], i64) {
  let agency = s.create_agency(&wkd_agency()).unwrap();
  let line = s
    .create_line(&NewLine {
      code:        "A1".into(),
      description: Some("Warszawa – Grodzisk".into()),
      line_type:   LineType::Rail,
      agency_id:   agency,
    })
    .unwrap();
  let a = s.create_stop(&stop_named("Warszawa Śródmieście WKD")).unwrap();
  let b = s.create_stop(&stop_named("Grodzisk Mazowiecki Radońska")).unwrap();
  let calendar = s.create_calendar(&weekdays("Mon-Fri")).unwrap();
  (line, [a, b], calendar)
}

// ─── Single-row writes ───────────────────────────────────────────────────────

#[test]
fn create_and_get_agency() {
  let s = store();
  let id = s.create_agency(&wkd_agency()).unwrap();

  let agency = s.get_agency(id).unwrap().unwrap();
  assert_eq!(agency.name, "WKD");
  assert_eq!(agency.timezone.as_deref(), Some("Europe/Warsaw"));
  assert!(agency.telephone.is_none());
  assert!(s.get_agency(id + 1).unwrap().is_none());
}

#[test]
fn stop_coordinates_keep_six_digits() {
  let s = store();
  let id = s
    .create_stop(&NewStop {
      name:                  "Łomianki Buraków 03".into(),
      code:                  Some("ŁB03".into()),
      lat:                   "52.324181".parse().unwrap(),
      lon:                   "20.910699".parse().unwrap(),
      wheelchair_accessible: WheelchairAccessibility::NoInfo,
    })
    .unwrap();

  let stop = s.get_stop(id).unwrap().unwrap();
  assert_eq!(stop.code.as_deref(), Some("ŁB03"));
  assert_eq!(stop.lat.to_string(), "52.324181");
  assert_eq!(stop.lon, Coordinate::from_micro_degrees(20_910_699));
}

#[test]
fn calendar_roundtrip() {
  let s = store();
  let id = s.create_calendar(&weekdays("Robocze")).unwrap();
  let cal = s.get_calendar(id).unwrap().unwrap();
  assert_eq!(cal.name, "Robocze");
  assert_eq!(cal.start_date, date(2023, 1, 26));
  assert_eq!(cal.end_date, Some(date(2024, 1, 17)));
  assert_eq!(cal.days(), [true, true, true, true, true, false, false]);

  let placeholder = s.create_calendar(&NewCalendar::placeholder("Święta")).unwrap();
  let cal = s.get_calendar(placeholder).unwrap().unwrap();
  assert_eq!(cal.start_date, date(2000, 1, 1));
  assert!(cal.end_date.is_none());
  assert_eq!(cal.days(), [false; 7]);
}

#[test]
fn line_requires_existing_agency() {
  let s = store();
  let err = s
    .create_line(&NewLine {
      code:        "1".into(),
      description: None,
      line_type:   LineType::Bus,
      agency_id:   42,
    })
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));
}

#[test]
fn one_exception_per_calendar_and_day() {
  let s = store();
  let cal = s.create_calendar(&weekdays("Mon-Fri")).unwrap();
  let exception = NewCalendarException { calendar_id: cal, day: date(2023, 4, 10), added: false };

  s.create_calendar_exception(&exception).unwrap();
  assert!(s.create_calendar_exception(&exception).is_err());

  let all = s.calendar_exceptions().unwrap();
  assert_eq!(all.len(), 1);
  assert!(!all[0].added);
  assert_eq!(all[0].day, date(2023, 4, 10));
}

// ─── Bulk writes ─────────────────────────────────────────────────────────────

#[test]
fn bulk_patterns_keep_reserved_ids() {
  let s = store();
  let (line, [a, b], calendar) = seed(&s);

  let pattern = Pattern {
    id:        41,
    headsign:  "Grodzisk Mazowiecki Radońska".into(),
    direction: Some(Direction::Outbound),
    line_id:   line,
  };
  s.bulk_create_patterns(std::slice::from_ref(&pattern)).unwrap();
  s.bulk_create_pattern_stops(&[
    NewPatternStop { pattern_id: 41, stop_id: a, travel_time: TimeDelta::zero(), index: 0 },
    NewPatternStop { pattern_id: 41, stop_id: b, travel_time: TimeDelta::seconds(3_060), index: 1 },
  ])
  .unwrap();
  s.bulk_create_trips(&[NewTrip {
    wheelchair_accessible: WheelchairAccessibility::Accessible,
    departure:             TimeDelta::seconds(93_300),
    pattern_id:            41,
    calendar_id:           calendar,
  }])
  .unwrap();

  assert_eq!(s.get_pattern(41).unwrap(), Some(pattern));
  assert_eq!(s.max_id(EntityKind::Pattern).unwrap(), Some(41));

  let stops = s.pattern_stops(41).unwrap();
  assert_eq!(stops.iter().map(|ps| ps.index).collect::<Vec<_>>(), [0, 1]);
  assert_eq!(stops[1].travel_time, TimeDelta::seconds(3_060));

  let trips = s.trips(41).unwrap();
  assert_eq!(trips.len(), 1);
  assert_eq!(trips[0].departure, TimeDelta::seconds(93_300));
  assert_eq!(trips[0].wheelchair_accessible, WheelchairAccessibility::Accessible);
}

#[test]
fn bulk_insert_splits_statements_over_parameter_limit() {
  let s = store();
  let (line, [a, _], calendar) = seed(&s);

  // 4 columns per row: 2 000 rows need 8 000 parameters, far above 999.
  let patterns: Vec<Pattern> = (1..=2_000)
    .map(|id| Pattern { id, headsign: format!("H{id}"), direction: None, line_id: line })
    .collect();
  s.bulk_create_patterns(&patterns).unwrap();

  let trips: Vec<NewTrip> = patterns
    .iter()
    .map(|p| NewTrip {
      wheelchair_accessible: WheelchairAccessibility::NoInfo,
      departure:             TimeDelta::seconds(p.id * 60),
      pattern_id:            p.id,
      calendar_id:           calendar,
    })
    .collect();
  s.bulk_create_trips(&trips).unwrap();

  let stops: Vec<NewPatternStop> = patterns
    .iter()
    .map(|p| NewPatternStop {
      pattern_id:  p.id,
      stop_id:     a,
      travel_time: TimeDelta::zero(),
      index:       0,
    })
    .collect();
  s.bulk_create_pattern_stops(&stops).unwrap();

  assert_eq!(s.count(EntityKind::Pattern).unwrap(), 2_000);
  assert_eq!(s.count(EntityKind::Trip).unwrap(), 2_000);
  assert_eq!(s.count(EntityKind::PatternStop).unwrap(), 2_000);
  assert_eq!(s.max_id(EntityKind::Pattern).unwrap(), Some(2_000));
}

#[test]
fn empty_bulk_insert_is_a_no_op() {
  let s = store();
  s.bulk_create_patterns(&[]).unwrap();
  s.bulk_create_trips(&[]).unwrap();
  s.bulk_create_pattern_stops(&[]).unwrap();
  assert_eq!(s.max_id(EntityKind::Pattern).unwrap(), None);
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[test]
fn find_pattern_stops_filters_by_line_and_headsign() {
  let s = store();
  let (line, [a, b], _) = seed(&s);
  let agency = s.agencies().unwrap()[0].id;
  let other_line = s
    .create_line(&NewLine {
      code:        "A2".into(),
      description: None,
      line_type:   LineType::Rail,
      agency_id:   agency,
    })
    .unwrap();

  s.bulk_create_patterns(&[
    Pattern { id: 1, headsign: "Grodzisk".into(), direction: Some(Direction::Outbound), line_id: line },
    Pattern { id: 2, headsign: "Śródmieście".into(), direction: Some(Direction::Inbound), line_id: line },
    Pattern { id: 3, headsign: "Grodzisk".into(), direction: None, line_id: other_line },
  ])
  .unwrap();
  let calls = |pattern_id| {
    [
      NewPatternStop { pattern_id, stop_id: a, travel_time: TimeDelta::zero(), index: 0 },
      NewPatternStop { pattern_id, stop_id: b, travel_time: TimeDelta::seconds(600), index: 1 },
    ]
  };
  s.bulk_create_pattern_stops(&[calls(1), calls(2), calls(3)].concat()).unwrap();

  let at_b = s.find_pattern_stops(&PatternStopQuery::at(b)).unwrap();
  assert_eq!(at_b.iter().map(|ps| ps.pattern_id).collect::<Vec<_>>(), [1, 2, 3]);

  let on_line = s
    .find_pattern_stops(&PatternStopQuery { line: Some(line), ..PatternStopQuery::at(b) })
    .unwrap();
  assert_eq!(on_line.iter().map(|ps| ps.pattern_id).collect::<Vec<_>>(), [1, 2]);

  let by_headsign = s
    .find_pattern_stops(&PatternStopQuery {
      headsign: Some("Grodzisk".into()),
      ..PatternStopQuery::at(b)
    })
    .unwrap();
  assert_eq!(by_headsign.iter().map(|ps| ps.pattern_id).collect::<Vec<_>>(), [1, 3]);

  let outbound = s
    .find_pattern_stops(&PatternStopQuery {
      direction: Some(Direction::Outbound),
      ..PatternStopQuery::at(a)
    })
    .unwrap();
  assert_eq!(outbound.len(), 1);
  assert_eq!(outbound[0].index, 0);
}

// ─── Transactions and maintenance ────────────────────────────────────────────

#[test]
fn atomic_commits_on_ok() {
  let s = store();
  let outcome: Result<i64, String> = s
    .atomic(|tx| Ok(tx.create_agency(&wkd_agency()).map_err(|e| e.to_string())?))
    .unwrap();
  assert!(outcome.is_ok());
  assert_eq!(s.count(EntityKind::Agency).unwrap(), 1);
}

#[test]
fn atomic_rolls_back_on_err() {
  let s = store();
  let outcome: Result<(), String> = s
    .atomic(|tx| {
      seed(tx);
      Err("unknown stop".to_string())
    })
    .unwrap();
  assert_eq!(outcome.unwrap_err(), "unknown stop");

  for kind in EntityKind::CLEAR_ORDER {
    assert_eq!(s.count(kind).unwrap(), 0, "{kind:?} survived the rollback");
  }
}

#[test]
fn clear_deletes_everything_children_first() {
  let s = store();
  let (line, [a, _], calendar) = seed(&s);
  s.bulk_create_patterns(&[Pattern { id: 1, headsign: "X".into(), direction: None, line_id: line }])
    .unwrap();
  s.bulk_create_pattern_stops(&[NewPatternStop {
    pattern_id:  1,
    stop_id:     a,
    travel_time: TimeDelta::zero(),
    index:       0,
  }])
  .unwrap();
  s.bulk_create_trips(&[NewTrip {
    wheelchair_accessible: WheelchairAccessibility::NoInfo,
    departure:             TimeDelta::seconds(18_300),
    pattern_id:            1,
    calendar_id:           calendar,
  }])
  .unwrap();
  s.create_calendar_exception(&NewCalendarException {
    calendar_id: calendar,
    day:         date(2023, 5, 1),
    added:       false,
  })
  .unwrap();

  s.clear().unwrap();

  for kind in EntityKind::CLEAR_ORDER {
    assert_eq!(s.count(kind).unwrap(), 0, "{kind:?} not cleared");
    assert_eq!(s.max_id(kind).unwrap(), None);
  }
}

#[test]
fn deleting_a_line_cascades_to_patterns_and_trips() {
  let s = store();
  let (line, [a, _], calendar) = seed(&s);
  s.bulk_create_patterns(&[Pattern { id: 7, headsign: "X".into(), direction: None, line_id: line }])
    .unwrap();
  s.bulk_create_pattern_stops(&[NewPatternStop {
    pattern_id:  7,
    stop_id:     a,
    travel_time: TimeDelta::zero(),
    index:       0,
  }])
  .unwrap();
  s.bulk_create_trips(&[NewTrip {
    wheelchair_accessible: WheelchairAccessibility::NoInfo,
    departure:             TimeDelta::seconds(18_300),
    pattern_id:            7,
    calendar_id:           calendar,
  }])
  .unwrap();

  s.delete_all(EntityKind::Line).unwrap();

  assert_eq!(s.count(EntityKind::Pattern).unwrap(), 0);
  assert_eq!(s.count(EntityKind::PatternStop).unwrap(), 0);
  assert_eq!(s.count(EntityKind::Trip).unwrap(), 0);
  assert_eq!(s.count(EntityKind::Stop).unwrap(), 2);
}
