//! Handlers for `/jobs`: queue a job request, or list requests.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use lakeline_core::{
  catalog::{Metadata, Page},
  jobs::{JobFilter, JobQueue, NewJob},
  store::CatalogStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, Result,
  auth::Authenticated,
  extract::{JsonBody, QueryParams},
};

#[derive(Debug, Deserialize)]
pub struct JobBody {
  #[serde(default)]
  pub job_type:         String,
  #[serde(default)]
  pub project_id:       String,
  #[serde(default)]
  pub site_id:          String,
  pub data_source_name: Option<String>,
  pub data_sink_name:   Option<String>,
  #[serde(default)]
  pub job_metadata:     Metadata,
}

/// `POST /jobs`: the job is `pending` and requested by the caller.
pub async fn create<S>(
  Authenticated(username): Authenticated,
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<JobBody>,
) -> Result<impl IntoResponse>
where
  S: CatalogStore + Clone + 'static,
{
  let job = JobQueue::new(state.store)
    .submit(NewJob {
      job_type:         body.job_type,
      project_id:       body.project_id,
      site_id:          body.site_id,
      data_source_name: body.data_source_name,
      data_sink_name:   body.data_sink_name,
      requested_by:     Some(username),
      job_metadata:     body.job_metadata,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(json!({ "job_id": job.job_id }))))
}

#[derive(Debug, Default, Deserialize)]
pub struct JobQuery {
  pub project_id:       Option<String>,
  pub site_id:          Option<String>,
  pub job_type:         Option<String>,
  pub status:           Option<String>,
  pub data_source_name: Option<String>,
  pub limit:            Option<usize>,
  pub offset:           Option<usize>,
}

/// `GET /jobs[?project_id=&site_id=&job_type=&status=&data_source_name=&limit=&offset=]`
pub async fn list<S>(
  _auth: Authenticated,
  State(state): State<AppState<S>>,
  QueryParams(query): QueryParams<JobQuery>,
) -> Result<Json<Value>>
where
  S: CatalogStore + Clone + 'static,
{
  let page = Page::new(query.limit, query.offset);
  let filter = JobFilter {
    project_id:       query.project_id,
    site_id:          query.site_id,
    job_type:         query.job_type,
    status:           query.status,
    data_source_name: query.data_source_name,
  };
  let jobs = JobQueue::new(state.store).list(filter, page).await?;
  Ok(Json(json!({ "jobs": jobs })))
}
