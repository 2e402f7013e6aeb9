//! Handlers for `/keystore` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/keystore?project_id=` | 400 without `project_id` |
//! | `POST`   | `/keystore` | Create or replace |
//! | `GET`    | `/keystore/{keystore_name}?project_id=` | 404 if not found |
//! | `PUT`    | `/keystore/{keystore_name}` | Existing entries only; 404 otherwise |
//! | `DELETE` | `/keystore/{keystore_name}?project_id=` | 404 if not found |
//!
//! No response ever carries `key_value`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lakeline_core::{
  catalog::Metadata,
  keystore::{KeyEntry, Keystore},
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

fn keystore<S: CatalogStore>(state: AppState<S>) -> Keystore<S> {
  Keystore::new(state.store, state.cipher)
}

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
  pub project_id: Option<String>,
}

impl ProjectQuery {
  fn require(self) -> Result<String> {
    self
      .project_id
      .filter(|id| !id.trim().is_empty())
      .ok_or_else(|| ApiError::BadRequest("Project ID is required".into()))
  }
}

/// `GET /keystore?project_id=`
pub async fn list<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  QueryParams(query): QueryParams<ProjectQuery>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let project_id = query.require()?;
  let entries = keystore(state).list(&project_id).await?;
  Ok(Json(json!({ "entries": entries })))
}

/// Missing strings default to empty so the keystore reports every absent
/// field in one message.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub keystore_name: String,
  #[serde(default)]
  pub key_value:     String,
  #[serde(default)]
  pub key_type:      String,
  #[serde(default)]
  pub project_id:    String,
  #[serde(default)]
  pub key_metadata:  Metadata,
}

/// `POST /keystore`
pub async fn create<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse>
where
  S: CatalogStore + Clone + 'static,
{
  let entry = KeyEntry {
    keystore_name: body.keystore_name,
    key_type:      body.key_type,
    project_id:    body.project_id,
    key_metadata:  body.key_metadata,
  };
  let entry = keystore(state).put(entry, &body.key_value).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Keystore entry created successfully",
      "keystore_name": entry.keystore_name,
    })),
  ))
}

/// `GET /keystore/{keystore_name}?project_id=`
pub async fn get_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(keystore_name): Path<String>,
  QueryParams(query): QueryParams<ProjectQuery>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let project_id = query.require()?;
  let entry = keystore(state)
    .get(&project_id, &keystore_name)
    .await?
    .ok_or_else(|| ApiError::NotFound("Keystore entry not found".into()))?;
  Ok(Json(json!({ "entry": entry })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(default)]
  pub key_value:    String,
  #[serde(default)]
  pub key_type:     String,
  #[serde(default)]
  pub project_id:   String,
  #[serde(default)]
  pub key_metadata: Metadata,
}

/// `PUT /keystore/{keystore_name}`
pub async fn update<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(keystore_name): Path<String>,
  JsonBody(body): JsonBody<UpdateBody>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let entry = KeyEntry {
    keystore_name,
    key_type: body.key_type,
    project_id: body.project_id,
    key_metadata: body.key_metadata,
  };
  let name = entry.keystore_name.clone();
  if !keystore(state).update(entry, &body.key_value).await? {
    return Err(ApiError::NotFound("Keystore entry not found".into()));
  }
  Ok(Json(json!({
    "message": "Keystore entry updated successfully",
    "keystore_name": name,
  })))
}

/// `DELETE /keystore/{keystore_name}?project_id=`
pub async fn delete_one<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  Path(keystore_name): Path<String>,
  QueryParams(query): QueryParams<ProjectQuery>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let project_id = query.require()?;
  if !keystore(state).delete(&project_id, &keystore_name).await? {
    return Err(ApiError::NotFound("Keystore entry not found".into()));
  }
  Ok(Json(json!({
    "message": "Keystore entry deleted successfully",
    "keystore_name": keystore_name,
  })))
}
