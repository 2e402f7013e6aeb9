//! Error type for `lakeline-store-sqlite`.

use lakeline_core::StoreError;
use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

/// SQLite does not report which foreign key failed; writes that can violate
/// one rename this placeholder via [`Error::on_foreign_key`].
pub(crate) const FOREIGN_KEY: &str = "FOREIGN KEY";

#[derive(Debug, Error)]
pub enum Error {
  /// A uniqueness, primary-key or foreign-key rule rejected the write.
  #[error("constraint violated: {constraint}")]
  ConstraintViolation { constraint: String },

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  /// Name the foreign key a write could have violated.
  pub(crate) fn on_foreign_key(self, name: &str) -> Self {
    match self {
      Error::ConstraintViolation { constraint } if constraint == FOREIGN_KEY => {
        Error::ConstraintViolation { constraint: name.to_owned() }
      }
      other => other,
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(code, message)) = &err
      && code.code == ErrorCode::ConstraintViolation
    {
      let constraint = if code.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
        FOREIGN_KEY.to_owned()
      } else {
        // e.g. "UNIQUE constraint failed: projects.project_id"
        message
          .as_deref()
          .map(|m| m.split_once(": ").map_or(m, |(_, columns)| columns))
          .unwrap_or("unknown")
          .to_owned()
      };
      return Error::ConstraintViolation { constraint };
    }
    Error::Database(err)
  }
}

impl StoreError for Error {
  fn violated_constraint(&self) -> Option<&str> {
    match self {
      Error::ConstraintViolation { constraint } => Some(constraint),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
