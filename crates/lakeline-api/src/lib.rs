//! JSON REST API for the Lakeline lineage catalog.
//!
//! Exposes an axum [`Router`] backed by any [`lakeline_core::store::CatalogStore`].
//! Every route requires HTTP Basic credentials; TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", lakeline_api::api_router(state))
//! ```

pub mod auth;
pub mod batch;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod keystore;
pub mod projects;
pub mod provenance;
pub mod sinks;
pub mod sites;
pub mod sources;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use lakeline_core::{keystore::KeyCipher, store::CatalogStore};

pub use auth::AuthConfig;
pub use error::ApiError;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub auth:   Arc<AuthConfig>,
  /// `None` leaves the keystore read-only.
  pub cipher: Option<Arc<KeyCipher>>,
}

impl<S> AppState<S> {
  pub fn new(store: S, auth: AuthConfig) -> Self {
    Self {
      store:  Arc::new(store),
      auth:   Arc::new(auth),
      cipher: None,
    }
  }

  /// Enable keystore writes, sealing values with `passphrase`.
  pub fn with_keystore(mut self, passphrase: impl Into<String>) -> Self {
    self.cipher = Some(Arc::new(KeyCipher::new(passphrase)));
    self
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: CatalogStore + Clone + 'static,
{
  Router::new()
    // Projects
    .route("/projects", get(projects::list::<S>).post(projects::create::<S>))
    .route(
      "/projects/{project_id}",
      get(projects::get_one::<S>).delete(projects::delete_one::<S>),
    )
    .route(
      "/projects/{project_id}/batch-add-data-sinks",
      post(batch::add_data_sinks::<S>),
    )
    .route(
      "/projects/{project_id}/batch-add-data-sources",
      post(batch::add_data_sources::<S>),
    )
    // Sites
    .route(
      "/projects/{project_id}/sites",
      get(sites::list::<S>).post(sites::create::<S>),
    )
    .route(
      "/projects/{project_id}/sites/{site_id}",
      get(sites::get_one::<S>).delete(sites::delete_one::<S>),
    )
    // Sources
    .route("/data-sources/supported", get(sources::supported::<S>))
    .route(
      "/projects/{project_id}/sites/{site_id}/sources",
      get(sources::list::<S>).post(sources::create::<S>),
    )
    .route(
      "/projects/{project_id}/sites/{site_id}/sources/{name}",
      get(sources::get_one::<S>).delete(sources::delete_one::<S>),
    )
    // Sinks
    .route(
      "/projects/{project_id}/sites/{site_id}/sinks",
      get(sinks::list::<S>).post(sinks::create::<S>),
    )
    .route(
      "/projects/{project_id}/sites/{site_id}/sinks/{name}",
      get(sinks::get_one::<S>)
        .put(sinks::replace::<S>)
        .delete(sinks::delete_one::<S>),
    )
    // Subjects
    .route(
      "/projects/{project_id}/sites/{site_id}/subjects",
      get(subjects::list::<S>).post(subjects::create::<S>),
    )
    // Provenance
    .route(
      "/projects/{project_id}/sites/{site_id}/data-pulls",
      get(provenance::data_pulls::<S>),
    )
    .route(
      "/projects/{project_id}/sites/{site_id}/data-pushes",
      get(provenance::data_pushes::<S>),
    )
    .route(
      "/projects/{project_id}/sites/{site_id}/files",
      get(provenance::files::<S>),
    )
    // Keystore
    .route("/keystore", get(keystore::list::<S>).post(keystore::create::<S>))
    .route(
      "/keystore/{keystore_name}",
      get(keystore::get_one::<S>)
        .put(keystore::update::<S>)
        .delete(keystore::delete_one::<S>),
    )
    // Jobs
    .route("/jobs", get(jobs::list::<S>).post(jobs::create::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
