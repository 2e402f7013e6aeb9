//! Handlers for `/projects/{project_id}/sites` endpoints.
//!
//! A site can only be deleted once nothing registered at it remains; until
//! then the delete is a 409 and the site is kept.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lakeline_core::{
  catalog::{Metadata, Site},
  store::CatalogStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, Result,
  auth::Authenticated,
  error::ApiError,
  extract::JsonBody,
};

/// `GET /projects/{project_id}/sites`
pub async fn list<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(project_id): Path<String>,
) -> Result<Json<Vec<Site>>>
where
  S: CatalogStore + Clone + 'static,
{
  let sites = state
    .store
    .list_sites(&project_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(sites))
}

fn active() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct SiteBody {
  pub site_id:        String,
  pub site_name:      String,
  #[serde(default = "active")]
  pub site_is_active: bool,
  #[serde(default)]
  pub site_metadata:  Metadata,
}

/// `POST /projects/{project_id}/sites`: create or replace.
pub async fn create<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(project_id): Path<String>,
  JsonBody(body): JsonBody<SiteBody>,
) -> Result<impl IntoResponse>
where
  S: CatalogStore + Clone + 'static,
{
  if body.site_id.trim().is_empty() || body.site_name.trim().is_empty() {
    return Err(ApiError::BadRequest("site_id and site_name must not be empty".into()));
  }
  let site = Site {
    site_id: body.site_id,
    project_id,
    site_name: body.site_name,
    site_is_active: body.site_is_active,
    site_metadata: body.site_metadata,
  };
  state
    .store
    .put_site(site.clone())
    .await
    .map_err(ApiError::store)?;
  tracing::info!(project_id = %site.project_id, site_id = %site.site_id, "site stored");
  Ok((StatusCode::CREATED, Json(site)))
}

/// `GET /projects/{project_id}/sites/{site_id}`
pub async fn get_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
) -> Result<Json<Site>>
where
  S: CatalogStore + Clone + 'static,
{
  let site = state
    .store
    .get_site(&project_id, &site_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Site not found".into()))?;
  Ok(Json(site))
}

/// `DELETE /projects/{project_id}/sites/{site_id}`
pub async fn delete_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let deleted = state
    .store
    .delete_site(&project_id, &site_id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound("Site not found".into()));
  }
  tracing::info!(%project_id, %site_id, "site deleted");
  Ok(Json(json!({ "message": "Site deleted successfully" })))
}
