//! Handlers for data sources and the supported-type lookup.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/data-sources/supported` | |
//! | `GET`    | `/projects/{p}/sites/{s}/sources` | Optional `?limit=&offset=` |
//! | `POST`   | `/projects/{p}/sites/{s}/sources` | 400 on unsupported type |
//! | `GET`    | `/projects/{p}/sites/{s}/sources/{name}` | 404 if not found |
//! | `DELETE` | `/projects/{p}/sites/{s}/sources/{name}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lakeline_core::{
  catalog::{DataSource, Metadata},
  store::CatalogStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, Result,
  auth::Authenticated,
  error::ApiError,
  extract::{JsonBody, QueryParams},
  projects::PageParams,
};

/// `GET /data-sources/supported`
pub async fn supported<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<String>>>
where
  S: CatalogStore + Clone + 'static,
{
  let types = state
    .store
    .supported_data_source_types()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(types))
}

/// `GET /projects/{project_id}/sites/{site_id}/sources`
pub async fn list<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
  QueryParams(params): QueryParams<PageParams>,
) -> Result<Json<Vec<DataSource>>>
where
  S: CatalogStore + Clone + 'static,
{
  let sources = state
    .store
    .list_data_sources(&project_id, &site_id, params.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(sources))
}

fn active() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct SourceBody {
  pub data_source_name:      String,
  pub data_source_type:      String,
  #[serde(default = "active")]
  pub data_source_is_active: bool,
  #[serde(default)]
  pub data_source_metadata:  Metadata,
}

/// `POST /projects/{project_id}/sites/{site_id}/sources`: create or replace.
pub async fn create<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
  JsonBody(body): JsonBody<SourceBody>,
) -> Result<impl IntoResponse>
where
  S: CatalogStore + Clone + 'static,
{
  if body.data_source_name.trim().is_empty() {
    return Err(ApiError::BadRequest("data_source_name must not be empty".into()));
  }
  let supported = state
    .store
    .supported_data_source_types()
    .await
    .map_err(ApiError::store)?;
  if !supported.contains(&body.data_source_type) {
    return Err(ApiError::BadRequest(format!(
      "Unsupported data source type: {}",
      body.data_source_type
    )));
  }

  let source = DataSource {
    data_source_name: body.data_source_name,
    data_source_is_active: body.data_source_is_active,
    site_id,
    project_id,
    data_source_type: body.data_source_type,
    data_source_metadata: body.data_source_metadata,
  };
  state
    .store
    .put_data_source(source.clone())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(source)))
}

/// `GET /projects/{project_id}/sites/{site_id}/sources/{name}`
pub async fn get_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id, name)): Path<(String, String, String)>,
) -> Result<Json<DataSource>>
where
  S: CatalogStore + Clone + 'static,
{
  let source = state
    .store
    .get_data_source(&project_id, &site_id, &name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Data source not found".into()))?;
  Ok(Json(source))
}

/// `DELETE /projects/{project_id}/sites/{site_id}/sources/{name}`
pub async fn delete_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id, name)): Path<(String, String, String)>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let deleted = state
    .store
    .delete_data_source(&project_id, &site_id, &name)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound("Data source not found".into()));
  }
  Ok(Json(json!({ "message": "Data source deleted successfully" })))
}
