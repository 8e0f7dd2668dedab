use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{now_iso, SettingsKV};

#[derive(Debug, Error)]
pub enum DbError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Location of the local database. A connection is opened per operation.
#[derive(Debug, Clone)]
pub struct Database {
  db_path: PathBuf,
}

/// `$WORKBENCH_HOME/workbench.sqlite`, falling back to `~/.workbench`.
pub fn default_path() -> PathBuf {
  let home = std::env::var_os("WORKBENCH_HOME")
    .map(PathBuf::from)
    .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".workbench")))
    .unwrap_or_else(|| PathBuf::from(".workbench"));
  home.join("workbench.sqlite")
}

impl Database {
  /// Open (creating if needed) and apply migrations.
  pub fn open(db_path: impl AsRef<Path>) -> Result<Self, DbError> {
    let db_path = db_path.as_ref().to_path_buf();
    if let Some(parent) = db_path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }
    let db = Self { db_path };
    db.init()?;
    Ok(db)
  }

  pub fn path(&self) -> &Path {
    &self.db_path
  }

  pub fn connect(&self) -> Result<Connection, DbError> {
    let conn = Connection::open(&self.db_path)?;
    Ok(conn)
  }

  fn init(&self) -> Result<(), DbError> {
    let conn = self.connect()?;
    // Each statement uses IF NOT EXISTS, so this is safe on every start.
    let init_sql = include_str!("../migrations/001_init.sql");
    conn.execute_batch(init_sql)?;
    Ok(())
  }

  pub fn settings(&self) -> Result<HashMap<String, String>, DbError> {
    let conn = self.connect()?;
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;

    let mut settings = HashMap::new();
    for row in rows {
      let (k, v) = row?;
      settings.insert(k, v);
    }
    Ok(settings)
  }

  pub fn list_settings(&self) -> Result<Vec<SettingsKV>, DbError> {
    let conn = self.connect()?;
    let mut stmt = conn.prepare("SELECT key, value, updated_at FROM settings ORDER BY key")?;
    let rows = stmt.query_map([], |r| {
      Ok(SettingsKV { key: r.get(0)?, value: r.get(1)?, updated_at: r.get(2)? })
    })?;

    let mut out = vec![];
    for row in rows {
      out.push(row?);
    }
    Ok(out)
  }

  pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
    let conn = self.connect()?;
    let value = conn
      .query_row("SELECT value FROM settings WHERE key = ?1", [key], |r| r.get(0))
      .optional()?;
    Ok(value)
  }

  pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DbError> {
    let conn = self.connect()?;
    conn.execute(
      "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
      (key, value, &now_iso()),
    )?;
    Ok(())
  }

  pub fn get_state(&self, key: &str) -> Result<Option<String>, DbError> {
    let conn = self.connect()?;
    let value = conn
      .query_row("SELECT value FROM session_state WHERE key = ?1", [key], |r| r.get(0))
      .optional()?;
    Ok(value)
  }

  pub fn put_state(&self, key: &str, value: &str) -> Result<(), DbError> {
    let conn = self.connect()?;
    conn.execute(
      "INSERT INTO session_state (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
      (key, value, &now_iso()),
    )?;
    Ok(())
  }
}
