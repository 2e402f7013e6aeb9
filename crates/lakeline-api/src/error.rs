//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use lakeline_core::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// Never shown to the client; logged when the response is built.
  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a raw backend error.
  pub fn store<E: StoreError>(err: E) -> Self { lakeline_core::Error::from_store(err).into() }
}

impl From<lakeline_core::Error> for ApiError {
  fn from(err: lakeline_core::Error) -> Self {
    match err {
      lakeline_core::Error::InvalidArgument(m) => ApiError::BadRequest(m),
      lakeline_core::Error::ConstraintViolation { constraint } => {
        tracing::warn!(%constraint, "write rejected by a constraint");
        ApiError::Conflict("Conflict with existing data".into())
      }
      lakeline_core::Error::StoreUnavailable(e) => ApiError::Internal(e),
      err @ lakeline_core::Error::Keystore(_) => ApiError::Internal(Box::new(err)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_owned())
      }
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"lakeline\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (lakeline_core::Error::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
      (
        lakeline_core::Error::ConstraintViolation { constraint: "c".into() },
        StatusCode::CONFLICT,
      ),
      (
        lakeline_core::Error::StoreUnavailable("disk gone".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
      (
        lakeline_core::Error::Keystore("no passphrase".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }

  #[test]
  fn conflicts_do_not_name_the_constraint() {
    let err = ApiError::from(lakeline_core::Error::ConstraintViolation {
      constraint: "projects.project_id".into(),
    });
    assert!(matches!(&err, ApiError::Conflict(m) if m == "Conflict with existing data"));
    assert!(!err.to_string().contains("project_id"));
  }

  #[test]
  fn unauthorized_carries_a_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
