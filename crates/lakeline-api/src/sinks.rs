//! Handlers for `/projects/{project_id}/sites/{site_id}/sinks` endpoints.
//!
//! Writes upsert on `(data_sink_name, site_id, project_id)`; the response is
//! the stored row, including its store-assigned `data_sink_id`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lakeline_core::{
  catalog::{DataSink, Metadata, NewDataSink},
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

async fn upsert<S: CatalogStore>(store: &S, sink: NewDataSink) -> Result<DataSink> {
  let (project_id, site_id, name) = (
    sink.project_id.clone(),
    sink.site_id.clone(),
    sink.data_sink_name.clone(),
  );
  store.put_data_sink(sink).await.map_err(ApiError::store)?;
  store
    .get_data_sink(&project_id, &site_id, &name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::Internal(format!("sink {name} vanished after upsert").into()))
}

/// `GET /projects/{project_id}/sites/{site_id}/sinks`
pub async fn list<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
  QueryParams(params): QueryParams<PageParams>,
) -> Result<Json<Vec<DataSink>>>
where
  S: CatalogStore + Clone + 'static,
{
  let sinks = state
    .store
    .list_data_sinks(&project_id, &site_id, params.into())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(sinks))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub data_sink_name:     String,
  #[serde(default)]
  pub data_sink_metadata: Metadata,
}

/// `POST /projects/{project_id}/sites/{site_id}/sinks`
pub async fn create<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse>
where
  S: CatalogStore + Clone + 'static,
{
  if body.data_sink_name.trim().is_empty() {
    return Err(ApiError::BadRequest("data_sink_name must not be empty".into()));
  }
  let sink = upsert(&*state.store, NewDataSink {
    data_sink_name: body.data_sink_name,
    site_id,
    project_id,
    data_sink_metadata: body.data_sink_metadata,
  })
  .await?;
  Ok((StatusCode::CREATED, Json(sink)))
}

/// `GET /projects/{project_id}/sites/{site_id}/sinks/{name}`
pub async fn get_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id, name)): Path<(String, String, String)>,
) -> Result<Json<DataSink>>
where
  S: CatalogStore + Clone + 'static,
{
  let sink = state
    .store
    .get_data_sink(&project_id, &site_id, &name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Data sink not found".into()))?;
  Ok(Json(sink))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceBody {
  #[serde(default)]
  pub data_sink_metadata: Metadata,
}

/// `PUT /projects/{project_id}/sites/{site_id}/sinks/{name}`
pub async fn replace<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id, name)): Path<(String, String, String)>,
  JsonBody(body): JsonBody<ReplaceBody>,
) -> Result<Json<DataSink>>
where
  S: CatalogStore + Clone + 'static,
{
  let sink = upsert(&*state.store, NewDataSink {
    data_sink_name: name,
    site_id,
    project_id,
    data_sink_metadata: body.data_sink_metadata,
  })
  .await?;
  Ok(Json(sink))
}

/// `DELETE /projects/{project_id}/sites/{site_id}/sinks/{name}`
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
    .delete_data_sink(&project_id, &site_id, &name)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound("Data sink not found".into()));
  }
  Ok(Json(json!({ "message": "Data sink deleted successfully" })))
}
