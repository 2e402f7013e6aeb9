//! Job requests: a queue of work for a site's pipelines.
//!
//! The catalog only records requests. Every job enters as [`PENDING`];
//! whatever executes jobs owns the later statuses.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  Error, Result,
  catalog::{Metadata, Page},
  store::CatalogStore,
};

pub const PENDING: &str = "pending";

/// Input to [`CatalogStore::submit_job`](crate::store::CatalogStore::submit_job).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
  pub job_type:         String,
  pub project_id:       String,
  pub site_id:          String,
  #[serde(default)]
  pub data_source_name: Option<String>,
  #[serde(default)]
  pub data_sink_name:   Option<String>,
  #[serde(default)]
  pub requested_by:     Option<String>,
  #[serde(default)]
  pub job_metadata:     Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub job_id:           i64,
  pub job_type:         String,
  pub project_id:       String,
  pub site_id:          String,
  pub data_source_name: Option<String>,
  pub data_sink_name:   Option<String>,
  pub requested_by:     Option<String>,
  pub status:           String,
  pub job_metadata:     Metadata,
  pub created_at:       DateTime<Utc>,
}

/// Equality filters for [`JobQueue::list`]. `None` matches anything; set
/// fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobFilter {
  pub project_id:       Option<String>,
  pub site_id:          Option<String>,
  pub job_type:         Option<String>,
  pub status:           Option<String>,
  pub data_source_name: Option<String>,
}

pub struct JobQueue<S> {
  store: Arc<S>,
}

impl<S: CatalogStore> JobQueue<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Queue a job. `job_type`, `project_id` and `site_id` are required; the
  /// site must exist.
  pub async fn submit(&self, job: NewJob) -> Result<Job> {
    if [&job.job_type, &job.project_id, &job.site_id]
      .iter()
      .any(|f| f.trim().is_empty())
    {
      return Err(Error::InvalidArgument("Missing required fields".into()));
    }
    let job = self
      .store
      .submit_job(job)
      .await
      .map_err(Error::from_store)?;
    info!(
      job_id = job.job_id,
      job_type = %job.job_type,
      project_id = %job.project_id,
      site_id = %job.site_id,
      "job queued"
    );
    Ok(job)
  }

  /// Newest `created_at` first.
  pub async fn list(&self, filter: JobFilter, page: Page) -> Result<Vec<Job>> {
    self
      .store
      .list_jobs(filter, page)
      .await
      .map_err(Error::from_store)
  }
}
