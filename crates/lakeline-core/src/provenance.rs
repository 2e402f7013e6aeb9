//! Read-side provenance views for a site.
//!
//! All three views are scoped by `(project_id, site_id)` and ordered
//! newest-first. They never mutate the store and an empty result is an empty
//! `Vec`.
//!
//! Push history tolerates pushes whose file has no pull (the provenance
//! columns are `None`), while file history needs a pull to know that a file
//! belongs to the site at all.

use std::sync::Arc;

use tracing::debug;

use crate::{
  Error, Result,
  lineage::{DataPull, FileRecord, PushRecord},
  store::CatalogStore,
};

pub struct Provenance<S> {
  store: Arc<S>,
}

impl<S: CatalogStore> Provenance<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn pull_history(&self, project_id: &str, site_id: &str) -> Result<Vec<DataPull>> {
    let pulls = self
      .store
      .pull_history(project_id, site_id)
      .await
      .map_err(Error::from_store)?;
    debug!(%project_id, %site_id, count = pulls.len(), "pull history");
    Ok(pulls)
  }

  pub async fn push_history(&self, project_id: &str, site_id: &str) -> Result<Vec<PushRecord>> {
    let pushes = self
      .store
      .push_history(project_id, site_id)
      .await
      .map_err(Error::from_store)?;
    debug!(%project_id, %site_id, count = pushes.len(), "push history");
    Ok(pushes)
  }

  pub async fn file_history(&self, project_id: &str, site_id: &str) -> Result<Vec<FileRecord>> {
    let files = self
      .store
      .file_history(project_id, site_id)
      .await
      .map_err(Error::from_store)?;
    debug!(%project_id, %site_id, count = files.len(), "file history");
    Ok(files)
  }
}
