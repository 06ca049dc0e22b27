//! Runtime settings, read from an optional TOML file and `SZALLITAS_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use szallitas_gtfs::import::MAX_BATCH_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file; a leading `~/` is expanded.
  pub database:   PathBuf,
  /// Trips per bulk flush during import.
  pub batch_size: usize,
}

impl Default for Settings {
  fn default() -> Self {
    Self { database: PathBuf::from("szallitas.sqlite3"), batch_size: MAX_BATCH_SIZE }
  }
}

impl Settings {
  /// Layer `path` (if it exists) under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SZALLITAS").try_parsing(true))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise Settings")
  }

  /// The database path with a leading `~` expanded to the home directory.
  pub fn database_path(&self) -> PathBuf {
    let s = self.database.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.database.clone()
  }
}
