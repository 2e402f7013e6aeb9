//! The `CatalogStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `lakeline-store-sqlite`).
//! Higher layers (`lakeline-api`, the components in this crate) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  catalog::{DataSink, DataSource, NewDataSink, Page, Project, Site, Subject},
  error::StoreError,
  jobs::{Job, JobFilter, NewJob},
  keystore::KeyEntry,
  lineage::{DataPull, DataPush, File, FileRecord, NewDataPull, NewDataPush, PushRecord},
};

/// Abstraction over a lineage catalog backend.
///
/// Writes that would break a uniqueness or foreign-key rule fail with an
/// error whose [`StoreError::violated_constraint`] is `Some`. Lookups return
/// `None` on absence and deletes return whether a row was removed.
///
/// Identity fields are immutable. The `put_*` methods are upserts keyed on the
/// entity's identity: they insert, or replace every non-identity column, and
/// return the number of rows affected.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CatalogStore: Send + Sync {
  type Error: StoreError;

  // ── Projects ──────────────────────────────────────────────────────────

  /// Insert a new project. Fails with a constraint violation if the
  /// `project_id` is taken.
  fn create_project(
    &self,
    project: Project,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send;

  fn put_project(
    &self,
    project: Project,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  fn get_project(
    &self,
    project_id: &str,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send;

  /// List projects ordered by `project_id`.
  fn list_projects(
    &self,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send;

  fn count_projects(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  /// Delete a project. Fails with a constraint violation while sites,
  /// keystore entries or jobs still reference it; nothing cascades.
  fn delete_project(
    &self,
    project_id: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  // ── Sites ─────────────────────────────────────────────────────────────

  fn put_site(&self, site: Site) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  fn get_site(
    &self,
    project_id: &str,
    site_id: &str,
  ) -> impl Future<Output = Result<Option<Site>, Self::Error>> + Send;

  /// List a project's sites ordered by `site_id`.
  fn list_sites(
    &self,
    project_id: &str,
  ) -> impl Future<Output = Result<Vec<Site>, Self::Error>> + Send;

  fn count_sites(
    &self,
    project_id: &str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  /// Delete a site. Fails with a constraint violation while anything
  /// registered at the site still references it.
  fn delete_site(
    &self,
    project_id: &str,
    site_id: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  // ── Data sources ──────────────────────────────────────────────────────

  /// The fixed list of `data_source_type` values a source may reference.
  fn supported_data_source_types(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;

  fn put_data_source(
    &self,
    source: DataSource,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  fn get_data_source(
    &self,
    project_id: &str,
    site_id: &str,
    data_source_name: &str,
  ) -> impl Future<Output = Result<Option<DataSource>, Self::Error>> + Send;

  /// List a site's sources ordered by `data_source_name`.
  fn list_data_sources(
    &self,
    project_id: &str,
    site_id: &str,
    page: Page,
  ) -> impl Future<Output = Result<Vec<DataSource>, Self::Error>> + Send;

  fn count_data_sources(
    &self,
    project_id: &str,
    site_id: &str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  fn delete_data_source(
    &self,
    project_id: &str,
    site_id: &str,
    data_source_name: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  // ── Data sinks ────────────────────────────────────────────────────────

  /// Upsert on `(data_sink_name, site_id, project_id)`: an existing row keeps
  /// its `data_sink_id` and has its metadata replaced.
  fn put_data_sink(
    &self,
    sink: NewDataSink,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  fn get_data_sink(
    &self,
    project_id: &str,
    site_id: &str,
    data_sink_name: &str,
  ) -> impl Future<Output = Result<Option<DataSink>, Self::Error>> + Send;

  /// List a site's sinks ordered by `data_sink_name`.
  fn list_data_sinks(
    &self,
    project_id: &str,
    site_id: &str,
    page: Page,
  ) -> impl Future<Output = Result<Vec<DataSink>, Self::Error>> + Send;

  fn delete_data_sink(
    &self,
    project_id: &str,
    site_id: &str,
    data_sink_name: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  // ── Subjects ──────────────────────────────────────────────────────────

  fn add_subject(
    &self,
    subject: Subject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send;

  /// List a site's subjects ordered by `subject_id`.
  fn list_subjects(
    &self,
    project_id: &str,
    site_id: &str,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send;

  // ── Files ─────────────────────────────────────────────────────────────

  /// Upsert on `(file_path, file_md5)`.
  fn put_file(&self, file: File) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  fn get_file(
    &self,
    file_path: &str,
    file_md5: &str,
  ) -> impl Future<Output = Result<Option<File>, Self::Error>> + Send;

  fn delete_file(
    &self,
    file_path: &str,
    file_md5: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  // ── Pull and push events ──────────────────────────────────────────────

  /// Record a pull. The id is store-assigned; a missing timestamp becomes
  /// the insertion time.
  fn record_pull(
    &self,
    input: NewDataPull,
  ) -> impl Future<Output = Result<DataPull, Self::Error>> + Send;

  fn get_pull(
    &self,
    data_pull_id: i64,
  ) -> impl Future<Output = Result<Option<DataPull>, Self::Error>> + Send;

  fn delete_pull(
    &self,
    data_pull_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Record a push. The id is store-assigned; a missing timestamp becomes
  /// the insertion time.
  fn record_push(
    &self,
    input: NewDataPush,
  ) -> impl Future<Output = Result<DataPush, Self::Error>> + Send;

  fn get_push(
    &self,
    data_push_id: i64,
  ) -> impl Future<Output = Result<Option<DataPush>, Self::Error>> + Send;

  fn delete_push(
    &self,
    data_push_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  // ── Provenance reads ──────────────────────────────────────────────────

  /// Every pull of the site, newest `pull_timestamp` first.
  fn pull_history(
    &self,
    project_id: &str,
    site_id: &str,
  ) -> impl Future<Output = Result<Vec<DataPull>, Self::Error>> + Send;

  /// Every push to one of the site's sinks, left-joined to any pull of the
  /// same file content. Newest `push_timestamp` first.
  fn push_history(
    &self,
    project_id: &str,
    site_id: &str,
  ) -> impl Future<Output = Result<Vec<PushRecord>, Self::Error>> + Send;

  /// Every file with at least one pull at the site. Files without an
  /// in-scope pull are excluded. Newest `file_m_time` first.
  fn file_history(
    &self,
    project_id: &str,
    site_id: &str,
  ) -> impl Future<Output = Result<Vec<FileRecord>, Self::Error>> + Send;

  // ── Keystore ──────────────────────────────────────────────────────────

  /// Upsert on `(keystore_name, project_id)`. `sealed` is stored as-is.
  fn put_key(
    &self,
    entry: KeyEntry,
    sealed: Vec<u8>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  /// Replace an existing entry; returns 0 when there is none.
  fn update_key(
    &self,
    entry: KeyEntry,
    sealed: Vec<u8>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  fn get_key(
    &self,
    project_id: &str,
    keystore_name: &str,
  ) -> impl Future<Output = Result<Option<KeyEntry>, Self::Error>> + Send;

  /// The sealed value of an entry.
  fn get_key_value(
    &self,
    project_id: &str,
    keystore_name: &str,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

  /// A project's entries ordered by name.
  fn list_keys(
    &self,
    project_id: &str,
  ) -> impl Future<Output = Result<Vec<KeyEntry>, Self::Error>> + Send;

  fn delete_key(
    &self,
    project_id: &str,
    keystore_name: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  // ── Jobs ──────────────────────────────────────────────────────────────

  /// Insert a `pending` job stamped with the insertion time.
  fn submit_job(&self, job: NewJob) -> impl Future<Output = Result<Job, Self::Error>> + Send;

  /// Jobs matching every set filter field, newest `created_at` first.
  fn list_jobs(
    &self,
    filter: JobFilter,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Job>, Self::Error>> + Send;
}
