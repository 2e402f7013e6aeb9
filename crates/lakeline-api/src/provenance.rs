//! Read-only lineage views for a site, newest first.

use axum::{
  Json,
  extract::{Path, State},
};
use lakeline_core::{provenance::Provenance, store::CatalogStore};
use serde_json::{Value, json};

use crate::{AppState, Result, auth::Authenticated};

/// `GET /projects/{project_id}/sites/{site_id}/data-pulls`
pub async fn data_pulls<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let pulls = Provenance::new(state.store)
    .pull_history(&project_id, &site_id)
    .await?;
  Ok(Json(json!({ "data_pulls": pulls })))
}

/// `GET /projects/{project_id}/sites/{site_id}/data-pushes`
pub async fn data_pushes<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let pushes = Provenance::new(state.store)
    .push_history(&project_id, &site_id)
    .await?;
  Ok(Json(json!({ "data_pushes": pushes })))
}

/// `GET /projects/{project_id}/sites/{site_id}/files`
pub async fn files<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let files = Provenance::new(state.store)
    .file_history(&project_id, &site_id)
    .await?;
  Ok(Json(json!({ "files": files })))
}
