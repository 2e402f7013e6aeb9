//! Core types and trait definitions for the Lakeline lineage catalog.
//!
//! This crate has no HTTP or database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The catalog records which files were pulled from which data sources,
//! where they were pushed afterwards, and which subject each file belongs to.
//! Three components sit on top of the [`store::CatalogStore`] abstraction:
//!
//! - [`registrar::Registrar`]: batch registration of sinks and sources with
//!   per-site failure isolation.
//! - [`provenance::Provenance`]: the read-side lineage views.
//! - [`project::ProjectLifecycle`]: create, fetch, and delete projects.
//!
//! [`keystore::Keystore`] keeps encrypted per-project secrets and
//! [`jobs::JobQueue`] records job requests for a site.

pub mod catalog;
pub mod error;
pub mod jobs;
pub mod keystore;
pub mod lineage;
pub mod project;
pub mod provenance;
pub mod registrar;
pub mod store;

pub use error::{Error, Result, StoreError};
