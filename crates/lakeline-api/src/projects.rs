//! Handlers for `/projects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/projects` | Optional `?limit=&offset=` (defaults 100 / 0) |
//! | `POST`   | `/projects` | Create or replace; body is a project |
//! | `GET`    | `/projects/{project_id}` | 404 if not found |
//! | `DELETE` | `/projects/{project_id}` | 404 if not found, 409 while sites or keystore entries remain |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lakeline_core::{
  catalog::{Page, Project},
  project::{ProjectLifecycle, ProjectListing},
  store::CatalogStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, Result,
  auth::Authenticated,
  error::ApiError,
  extract::{JsonBody, QueryParams},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl From<PageParams> for Page {
  fn from(p: PageParams) -> Self { Page::new(p.limit, p.offset) }
}

/// `GET /projects[?limit=&offset=]`
pub async fn list<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  QueryParams(params): QueryParams<PageParams>,
) -> Result<Json<ProjectListing>>
where
  S: CatalogStore + Clone + 'static,
{
  let listing = ProjectLifecycle::new(state.store)
    .list(params.into())
    .await?;
  Ok(Json(listing))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /projects`
pub async fn create<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  JsonBody(project): JsonBody<Project>,
) -> Result<impl IntoResponse>
where
  S: CatalogStore + Clone + 'static,
{
  let project = ProjectLifecycle::new(state.store).put(project).await?;
  Ok((StatusCode::CREATED, Json(project)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /projects/{project_id}`
pub async fn get_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(project_id): Path<String>,
) -> Result<Json<Project>>
where
  S: CatalogStore + Clone + 'static,
{
  let project = ProjectLifecycle::new(state.store)
    .get(&project_id)
    .await?
    .ok_or_else(|| ApiError::NotFound("Project not found".into()))?;
  Ok(Json(project))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /projects/{project_id}`
pub async fn delete_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(project_id): Path<String>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  if !ProjectLifecycle::new(state.store).delete(&project_id).await? {
    return Err(ApiError::NotFound("Project not found".into()));
  }
  Ok(Json(json!({ "message": "Project deleted successfully" })))
}
