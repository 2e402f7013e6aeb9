//! Batch registration: one sink or source per listed site.
//!
//! Both bodies are checked before the registrar runs; a missing or
//! wrongly-typed field, or a body that is not JSON at all, is a 400 naming the
//! required fields. Per-site failures never fail
//! the request, they are reported in `failed`.

use axum::{
  Json,
  extract::{Path, State},
};
use lakeline_core::{
  catalog::Metadata,
  registrar::{BatchOutcome, Registrar},
  store::CatalogStore,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppState, Result, auth::Authenticated, error::ApiError, extract::JsonBody};

fn as_metadata(value: Option<Value>) -> Option<Metadata> {
  match value? {
    Value::Object(map) => Some(map),
    _ => None,
  }
}

// ─── Sinks ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SinkBatch {
  pub site_ids:           Option<Vec<String>>,
  pub data_sink_metadata: Option<Value>,
}

/// `POST /projects/{project_id}/batch-add-data-sinks`
pub async fn add_data_sinks<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(project_id): Path<String>,
  body: Result<JsonBody<SinkBatch>, ApiError>,
) -> Result<Json<BatchOutcome>>
where
  S: CatalogStore + Clone + 'static,
{
  let missing =
    || ApiError::BadRequest("Missing required fields: site_ids, data_sink_metadata".into());
  let JsonBody(body) = body.map_err(|_| missing())?;
  let (Some(site_ids), Some(metadata)) = (body.site_ids, as_metadata(body.data_sink_metadata))
  else {
    return Err(missing());
  };

  let outcome = Registrar::new(state.store)
    .register_sinks(&project_id, &site_ids, &metadata)
    .await?;
  Ok(Json(outcome))
}

// ─── Sources ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SourceBatch {
  pub site_ids:             Option<Vec<String>>,
  pub data_source_type:     Option<String>,
  pub data_source_metadata: Option<Value>,
}

/// `POST /projects/{project_id}/batch-add-data-sources`
pub async fn add_data_sources<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(project_id): Path<String>,
  body: Result<JsonBody<SourceBatch>, ApiError>,
) -> Result<Json<BatchOutcome>>
where
  S: CatalogStore + Clone + 'static,
{
  let missing = || {
    ApiError::BadRequest(
      "Missing required fields: site_ids, data_source_type, data_source_metadata".into(),
    )
  };
  let JsonBody(body) = body.map_err(|_| missing())?;
  let (Some(site_ids), Some(data_source_type), Some(metadata)) = (
    body.site_ids,
    body.data_source_type,
    as_metadata(body.data_source_metadata),
  ) else {
    return Err(missing());
  };

  let outcome = Registrar::new(state.store)
    .register_sources(&project_id, &site_ids, &data_source_type, &metadata)
    .await?;
  Ok(Json(outcome))
}
