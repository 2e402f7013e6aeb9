//! Handlers for `/projects/{project_id}/sites/{site_id}/subjects`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lakeline_core::{
  catalog::{Metadata, Subject},
  store::CatalogStore,
};
use serde::Deserialize;

use crate::{
  AppState, Result,
  auth::Authenticated,
  error::ApiError,
  extract::JsonBody,
};

/// `GET …/subjects`, ordered by `subject_id`.
pub async fn list<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
) -> Result<Json<Vec<Subject>>>
where
  S: CatalogStore + Clone + 'static,
{
  let subjects = state
    .store
    .list_subjects(&project_id, &site_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subjects))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub subject_id:       String,
  #[serde(default)]
  pub subject_metadata: Metadata,
}

/// `POST …/subjects`. A repeated `subject_id` is a 409.
pub async fn create<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path((project_id, site_id)): Path<(String, String)>,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse>
where
  S: CatalogStore + Clone + 'static,
{
  if body.subject_id.trim().is_empty() {
    return Err(ApiError::BadRequest("subject_id must not be empty".into()));
  }
  let subject = state
    .store
    .add_subject(Subject {
      subject_id: body.subject_id,
      site_id,
      project_id,
      subject_metadata: body.subject_metadata,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}
