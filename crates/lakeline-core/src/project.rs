//! Project lifecycle: create, fetch, list and delete.
//!
//! Deletion restricts rather than cascades: a project that still owns sites,
//! keystore entries or jobs cannot be deleted, and the attempt surfaces as
//! [`Error::ConstraintViolation`]. Deleting a project that does not exist is
//! not an error; it reports `false`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  Error, Result,
  catalog::{Page, Project},
  store::CatalogStore,
};

/// Paging details returned alongside a project listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingMetadata {
  pub total_rows: u64,
  pub limit:      usize,
  pub offset:     usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectListing {
  pub metadata: ListingMetadata,
  pub rows:     Vec<Project>,
}

fn check_id(project_id: &str) -> Result<()> {
  if project_id.trim().is_empty() {
    return Err(Error::InvalidArgument("project_id must not be empty".into()));
  }
  Ok(())
}

fn check_project(project: &Project) -> Result<()> {
  check_id(&project.project_id)?;
  if project.project_name.trim().is_empty() {
    return Err(Error::InvalidArgument("project_name must not be empty".into()));
  }
  Ok(())
}

pub struct ProjectLifecycle<S> {
  store: Arc<S>,
}

impl<S: CatalogStore> ProjectLifecycle<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Insert a new project; an existing `project_id` is a constraint
  /// violation.
  pub async fn create(&self, project: Project) -> Result<Project> {
    check_project(&project)?;
    let project = self
      .store
      .create_project(project)
      .await
      .map_err(Error::from_store)?;
    info!(project_id = %project.project_id, "project created");
    Ok(project)
  }

  /// Create the project, or replace the name, active flag and metadata of an
  /// existing one.
  pub async fn put(&self, project: Project) -> Result<Project> {
    check_project(&project)?;
    let rows = self
      .store
      .put_project(project.clone())
      .await
      .map_err(Error::from_store)?;
    if rows == 0 {
      warn!(project_id = %project.project_id, "project upsert affected no rows");
    }
    Ok(project)
  }

  /// `Ok(None)` when no project has this id.
  pub async fn get(&self, project_id: &str) -> Result<Option<Project>> {
    check_id(project_id)?;
    self
      .store
      .get_project(project_id)
      .await
      .map_err(Error::from_store)
  }

  pub async fn list(&self, page: Page) -> Result<ProjectListing> {
    let rows = self
      .store
      .list_projects(page)
      .await
      .map_err(Error::from_store)?;
    let total_rows = self.store.count_projects().await.map_err(Error::from_store)?;
    Ok(ProjectListing {
      metadata: ListingMetadata {
        total_rows,
        limit: page.limit,
        offset: page.offset,
      },
      rows,
    })
  }

  /// `Ok(true)` if a row was removed, `Ok(false)` if there was none.
  pub async fn delete(&self, project_id: &str) -> Result<bool> {
    check_id(project_id)?;
    let deleted = self
      .store
      .delete_project(project_id)
      .await
      .map_err(Error::from_store)?;
    if deleted {
      info!(%project_id, "project deleted");
    }
    Ok(deleted)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn project(id: &str, name: &str) -> Project {
    Project {
      project_id:        id.into(),
      project_name:      name.into(),
      project_is_active: true,
      project_metadata:  Default::default(),
    }
  }

  #[test]
  fn blank_ids_and_names_are_rejected() {
    assert!(matches!(check_project(&project(" ", "x")), Err(Error::InvalidArgument(_))));
    assert!(matches!(check_project(&project("p", "")), Err(Error::InvalidArgument(_))));
    assert!(check_project(&project("p", "Pronet")).is_ok());
  }
}
