//! Core types and trait definitions for the szallitas transit store.
//!
//! This crate is free of CSV, archive and database dependencies. The GTFS
//! engine and the storage backends depend on it; it depends on neither.

pub mod agency;
pub mod calendar;
pub mod error;
pub mod line;
pub mod pattern;
pub mod stop;
pub mod store;
pub mod time;
pub mod trip;

pub use error::{Error, Result};
