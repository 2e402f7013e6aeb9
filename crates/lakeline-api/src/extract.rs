//! Body and query extractors whose rejections are [`ApiError`]s.
//!
//! axum's own `Json` and `Query` reject with plain-text 415/422 responses.
//! These wrappers keep every failure on the `{"error": …}` shape as a 400.

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Query, Request},
  http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// A JSON request body.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
  S: Send + Sync,
  T: DeserializeOwned,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
      tracing::debug!(error = %e.body_text(), "rejected JSON body");
      ApiError::BadRequest("Invalid JSON body".into())
    })?;
    Ok(JsonBody(value))
  }
}

/// A query string.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
  S: Send + Sync,
  T: DeserializeOwned,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Query(value) = Query::<T>::from_request_parts(parts, state).await.map_err(|e| {
      tracing::debug!(error = %e.body_text(), "rejected query string");
      ApiError::BadRequest("Invalid query parameters".into())
    })?;
    Ok(QueryParams(value))
  }
}
