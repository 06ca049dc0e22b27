//! `szallitas`: load GTFS feeds into a SQLite transit store, export them
//! again and print departure boards.
//!
//! Settings come from `szallitas.toml` (or the path given with `--config`)
//! and `SZALLITAS_*` environment variables; `--database` overrides both.
//!
//! ```text
//! szallitas import feed.zip
//! szallitas timetable --stop 12 --line 3
//! szallitas export out.zip
//! ```

mod settings;

use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use settings::Settings;
use szallitas_core::{
  line::LineId,
  stop::StopId,
  store::{PatternStopQuery, TransitStore},
};
use szallitas_gtfs::{ImportOptions, export, import, timetable_for};
use szallitas_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Szallitas GTFS transit store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "szallitas.toml")]
  config: PathBuf,

  /// SQLite database file, overriding the configured one.
  #[arg(long)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Import a GTFS zip archive, replacing the stored data.
  Import {
    path:       PathBuf,
    /// Keep the stored data and add the feed on top of it.
    #[arg(long)]
    no_clean:   bool,
    /// Trips per bulk insert (1-999).
    #[arg(long)]
    batch_size: Option<usize>,
  },
  /// Export the stored data as a GTFS zip archive.
  Export { path: PathBuf },
  /// Print the departure board of a stop.
  Timetable {
    #[arg(long)]
    stop:     StopId,
    #[arg(long)]
    line:     Option<LineId>,
    #[arg(long)]
    headsign: Option<String>,
    /// Print JSON instead of a text board.
    #[arg(long)]
    json:     bool,
  },
  /// Print stored entities as JSON.
  List {
    #[arg(value_enum)]
    what: Listing,
  },
  /// Delete all stored data.
  Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum Listing {
  Agencies,
  Lines,
  Stops,
  Calendars,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(database) = cli.database {
    settings.database = database;
  }

  // SQLite and the GTFS engine are blocking.
  tokio::task::spawn_blocking(move || run(cli.command, &settings))
    .await
    .context("worker thread panicked")?
}

fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
  let database = settings.database_path();
  tracing::debug!(?database, "opening store");
  let store = SqliteStore::open(&database)
    .with_context(|| format!("failed to open store at {database:?}"))?;

  match command {
    Command::Import { path, no_clean, batch_size } => {
      let file =
        File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
      if no_clean {
        println!("Warning: importing without clearing the database first");
      } else {
        println!("Clearing database");
        store.clear().context("failed to clear database")?;
      }

      println!("Loading data");
      let options = ImportOptions { batch_size: batch_size.unwrap_or(settings.batch_size) };
      let summary = import(&store, BufReader::new(file), &options)
        .with_context(|| format!("failed to import {}", path.display()))?;
      println!("Data loaded successfully");
      println!("{summary}");
    }

    Command::Export { path } => {
      let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
      let summary =
        export(&store, file).with_context(|| format!("failed to export {}", path.display()))?;
      println!("{summary}");
    }

    Command::Timetable { stop, line, headsign, json } => {
      let query = PatternStopQuery { stop, line, headsign, direction: None };
      let boards = timetable_for(&store, &query).context("failed to build timetable")?;
      if json {
        println!("{}", serde_json::to_string_pretty(&boards)?);
      } else if boards.is_empty() {
        println!("No departures");
      } else {
        for board in &boards {
          print!("{board}");
        }
      }
    }

    Command::List { what } => {
      let json = match what {
        Listing::Agencies => serde_json::to_string_pretty(&store.agencies()?)?,
        Listing::Lines => serde_json::to_string_pretty(&store.lines()?)?,
        Listing::Stops => serde_json::to_string_pretty(&store.stops()?)?,
        Listing::Calendars => serde_json::to_string_pretty(&store.calendars()?)?,
      };
      println!("{json}");
    }

    Command::Clear => {
      store.clear().context("failed to clear database")?;
      println!("Database cleared");
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn cli_definition_is_valid() { Cli::command().debug_assert(); }

  #[test]
  fn parses_import_flags() {
    let cli = Cli::parse_from([
      "szallitas",
      "--database",
      "/tmp/t.sqlite3",
      "import",
      "feed.zip",
      "--no-clean",
      "--batch-size",
      "2",
    ]);
    assert_eq!(cli.database, Some(PathBuf::from("/tmp/t.sqlite3")));
    let Command::Import { path, no_clean, batch_size } = cli.command else {
      panic!("expected import");
    };
    assert_eq!(path, PathBuf::from("feed.zip"));
    assert!(no_clean);
    assert_eq!(batch_size, Some(2));
  }

  #[test]
  fn parses_timetable_filters() {
    let cli = Cli::parse_from(["szallitas", "timetable", "--stop", "12", "--headsign", "Grodzisk"]);
    let Command::Timetable { stop, line, headsign, json } = cli.command else {
      panic!("expected timetable");
    };
    assert_eq!((stop, line, headsign.as_deref(), json), (12, None, Some("Grodzisk"), false));
  }

  #[test]
  fn runs_against_a_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings { database: dir.path().join("t.sqlite3"), ..Settings::default() };

    run(Command::Clear, &settings).unwrap();
    run(Command::List { what: Listing::Stops }, &settings).unwrap();
    assert!(
      run(
        Command::Import {
          path:       dir.path().join("missing.zip"),
          no_clean:   false,
          batch_size: None,
        },
        &settings,
      )
      .is_err()
    );
  }
}
