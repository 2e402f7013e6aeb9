//! Error types for `lakeline-core`.
//!
//! Absence is never an error: lookups return `Option` and deletes return
//! `bool`, so callers handle "not found" explicitly.

use thiserror::Error;

/// Implemented by storage backends so that any failure they produce can be
/// classified into the catalog's error taxonomy.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The name of the uniqueness or foreign-key constraint a failed write
  /// violated. `None` means the failure was infrastructural.
  fn violated_constraint(&self) -> Option<&str>;
}

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing input, detected before any store access.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("constraint violated: {constraint}")]
  ConstraintViolation { constraint: String },

  /// The store could not be reached, or a query failed for reasons other
  /// than a constraint.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The keystore cannot seal or open a value: no passphrase is configured,
  /// or the sealed bytes fail authentication.
  #[error("keystore: {0}")]
  Keystore(String),
}

impl Error {
  /// Classify a backend error.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.violated_constraint() {
      Some(constraint) => Error::ConstraintViolation {
        constraint: constraint.to_owned(),
      },
      None => Error::StoreUnavailable(Box::new(err)),
    }
  }

  pub fn is_constraint_violation(&self) -> bool {
    matches!(self, Self::ConstraintViolation { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
