//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::{SubsecRound as _, Utc};
use lakeline_core::{
  catalog::{DataSink, DataSource, NewDataSink, Page, Project, Site, Subject},
  jobs::{Job, JobFilter, NewJob, PENDING},
  keystore::KeyEntry,
  lineage::{DataPull, DataPush, File, FileRecord, NewDataPull, NewDataPush, PushRecord},
  store::CatalogStore,
};
use rusqlite::{OptionalExtension as _, Row, params_from_iter, types::Value};

use crate::{
  Result,
  encode::{
    DATA_PULL_COLUMNS, DATA_PUSH_COLUMNS, DATA_SINK_COLUMNS, DATA_SOURCE_COLUMNS, FILE_COLUMNS,
    JOB_COLUMNS, KEY_COLUMNS, PROJECT_COLUMNS, RawDataPull, RawDataPush, RawDataSink,
    RawDataSource, RawFile, RawFileRecord, RawJob, RawKeyEntry, RawProject, RawPushRecord,
    RawSite, RawSubject, SITE_COLUMNS, SUBJECT_COLUMNS, encode_dt, encode_metadata,
  },
  error::Error,
  schema::SCHEMA,
};

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

fn page_params(page: Page) -> [Value; 2] {
  [
    Value::Integer(page.limit as i64),
    Value::Integer(page.offset as i64),
  ]
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A lineage catalog backed by a single SQLite file.
///
/// Clones share one reference-counted connection. Statements
/// run one at a time on the connection's background thread, so every write
/// is atomic per statement.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::info!(path = %path.display(), "opened catalog store");
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run one write statement and return the number of rows it changed.
  async fn execute(&self, sql: &'static str, params: Vec<Value>) -> Result<u64> {
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, params_from_iter(params))?))
      .await?;
    Ok(changed as u64)
  }

  /// Run a query expected to match at most one row.
  async fn select_one<R, F>(&self, sql: String, params: Vec<Value>, map: F) -> Result<Option<R>>
  where
    R: Send + 'static,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let row = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, params_from_iter(params), map).optional()?))
      .await?;
    Ok(row)
  }

  async fn select<R, F>(&self, sql: String, params: Vec<Value>, map: F) -> Result<Vec<R>>
  where
    R: Send + 'static,
    F: FnMut(&Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn count(&self, sql: &'static str, params: Vec<Value>) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, params_from_iter(params), |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Projects ──────────────────────────────────────────────────────────────

  async fn create_project(&self, project: Project) -> Result<Project> {
    let metadata = encode_metadata(&project.project_metadata)?;
    self
      .execute(
        "INSERT INTO projects (project_id, project_name, project_is_active, project_metadata)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          text(&project.project_id),
          text(&project.project_name),
          project.project_is_active.into(),
          metadata.into(),
        ],
      )
      .await?;
    Ok(project)
  }

  async fn put_project(&self, project: Project) -> Result<u64> {
    let metadata = encode_metadata(&project.project_metadata)?;
    self
      .execute(
        "INSERT INTO projects (project_id, project_name, project_is_active, project_metadata)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (project_id) DO UPDATE SET
           project_name      = excluded.project_name,
           project_is_active = excluded.project_is_active,
           project_metadata  = excluded.project_metadata",
        vec![
          project.project_id.into(),
          project.project_name.into(),
          project.project_is_active.into(),
          metadata.into(),
        ],
      )
      .await
  }

  async fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
    self
      .select_one(
        format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"),
        vec![text(project_id)],
        RawProject::from_row,
      )
      .await?
      .map(RawProject::into_project)
      .transpose()
  }

  async fn list_projects(&self, page: Page) -> Result<Vec<Project>> {
    self
      .select(
        format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY project_id LIMIT ?1 OFFSET ?2"),
        page_params(page).into(),
        RawProject::from_row,
      )
      .await?
      .into_iter()
      .map(RawProject::into_project)
      .collect()
  }

  async fn count_projects(&self) -> Result<u64> {
    self.count("SELECT COUNT(*) FROM projects", vec![]).await
  }

  async fn delete_project(&self, project_id: &str) -> Result<bool> {
    let removed = self
      .execute("DELETE FROM projects WHERE project_id = ?1", vec![text(project_id)])
      .await
      .map_err(|e| e.on_foreign_key("projects_referenced"))?;
    Ok(removed > 0)
  }

  // ── Sites ─────────────────────────────────────────────────────────────────

  async fn put_site(&self, site: Site) -> Result<u64> {
    let metadata = encode_metadata(&site.site_metadata)?;
    self
      .execute(
        "INSERT INTO sites (site_id, project_id, site_name, site_is_active, site_metadata)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (project_id, site_id) DO UPDATE SET
           site_name      = excluded.site_name,
           site_is_active = excluded.site_is_active,
           site_metadata  = excluded.site_metadata",
        vec![
          site.site_id.into(),
          site.project_id.into(),
          site.site_name.into(),
          site.site_is_active.into(),
          metadata.into(),
        ],
      )
      .await
      .map_err(|e| e.on_foreign_key("sites_project_id_fkey"))
  }

  async fn get_site(&self, project_id: &str, site_id: &str) -> Result<Option<Site>> {
    self
      .select_one(
        format!("SELECT {SITE_COLUMNS} FROM sites WHERE project_id = ?1 AND site_id = ?2"),
        vec![text(project_id), text(site_id)],
        RawSite::from_row,
      )
      .await?
      .map(RawSite::into_site)
      .transpose()
  }

  async fn list_sites(&self, project_id: &str) -> Result<Vec<Site>> {
    self
      .select(
        format!("SELECT {SITE_COLUMNS} FROM sites WHERE project_id = ?1 ORDER BY site_id"),
        vec![text(project_id)],
        RawSite::from_row,
      )
      .await?
      .into_iter()
      .map(RawSite::into_site)
      .collect()
  }

  async fn count_sites(&self, project_id: &str) -> Result<u64> {
    self
      .count("SELECT COUNT(*) FROM sites WHERE project_id = ?1", vec![text(project_id)])
      .await
  }

  async fn delete_site(&self, project_id: &str, site_id: &str) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM sites WHERE project_id = ?1 AND site_id = ?2",
        vec![text(project_id), text(site_id)],
      )
      .await
      .map_err(|e| e.on_foreign_key("sites_referenced"))?;
    Ok(removed > 0)
  }

  // ── Data sources ──────────────────────────────────────────────────────────

  async fn supported_data_source_types(&self) -> Result<Vec<String>> {
    self
      .select(
        "SELECT data_source_type FROM supported_data_source_types ORDER BY data_source_type"
          .to_owned(),
        vec![],
        |row| row.get(0),
      )
      .await
  }

  async fn put_data_source(&self, source: DataSource) -> Result<u64> {
    let metadata = encode_metadata(&source.data_source_metadata)?;
    self
      .execute(
        "INSERT INTO data_sources (
           data_source_name, data_source_is_active, site_id,
           project_id, data_source_type, data_source_metadata
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (data_source_name, site_id, project_id) DO UPDATE SET
           data_source_is_active = excluded.data_source_is_active,
           data_source_metadata  = excluded.data_source_metadata",
        vec![
          source.data_source_name.into(),
          source.data_source_is_active.into(),
          source.site_id.into(),
          source.project_id.into(),
          source.data_source_type.into(),
          metadata.into(),
        ],
      )
      .await
      .map_err(|e| e.on_foreign_key("data_sources_fkey"))
  }

  async fn get_data_source(
    &self,
    project_id: &str,
    site_id: &str,
    data_source_name: &str,
  ) -> Result<Option<DataSource>> {
    self
      .select_one(
        format!(
          "SELECT {DATA_SOURCE_COLUMNS} FROM data_sources
           WHERE project_id = ?1 AND site_id = ?2 AND data_source_name = ?3"
        ),
        vec![text(project_id), text(site_id), text(data_source_name)],
        RawDataSource::from_row,
      )
      .await?
      .map(RawDataSource::into_data_source)
      .transpose()
  }

  async fn list_data_sources(
    &self,
    project_id: &str,
    site_id: &str,
    page: Page,
  ) -> Result<Vec<DataSource>> {
    let [limit, offset] = page_params(page);
    self
      .select(
        format!(
          "SELECT {DATA_SOURCE_COLUMNS} FROM data_sources
           WHERE project_id = ?1 AND site_id = ?2
           ORDER BY data_source_name
           LIMIT ?3 OFFSET ?4"
        ),
        vec![text(project_id), text(site_id), limit, offset],
        RawDataSource::from_row,
      )
      .await?
      .into_iter()
      .map(RawDataSource::into_data_source)
      .collect()
  }

  async fn count_data_sources(&self, project_id: &str, site_id: &str) -> Result<u64> {
    self
      .count(
        "SELECT COUNT(*) FROM data_sources WHERE project_id = ?1 AND site_id = ?2",
        vec![text(project_id), text(site_id)],
      )
      .await
  }

  async fn delete_data_source(
    &self,
    project_id: &str,
    site_id: &str,
    data_source_name: &str,
  ) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM data_sources
         WHERE project_id = ?1 AND site_id = ?2 AND data_source_name = ?3",
        vec![text(project_id), text(site_id), text(data_source_name)],
      )
      .await
      .map_err(|e| e.on_foreign_key("data_sources_referenced"))?;
    Ok(removed > 0)
  }

  // ── Data sinks ────────────────────────────────────────────────────────────

  async fn put_data_sink(&self, sink: NewDataSink) -> Result<u64> {
    let metadata = encode_metadata(&sink.data_sink_metadata)?;
    self
      .execute(
        "INSERT INTO data_sinks (data_sink_name, site_id, project_id, data_sink_metadata)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (data_sink_name, site_id, project_id) DO UPDATE SET
           data_sink_metadata = excluded.data_sink_metadata",
        vec![
          sink.data_sink_name.into(),
          sink.site_id.into(),
          sink.project_id.into(),
          metadata.into(),
        ],
      )
      .await
      .map_err(|e| e.on_foreign_key("data_sinks_site_id_project_id_fkey"))
  }

  async fn get_data_sink(
    &self,
    project_id: &str,
    site_id: &str,
    data_sink_name: &str,
  ) -> Result<Option<DataSink>> {
    self
      .select_one(
        format!(
          "SELECT {DATA_SINK_COLUMNS} FROM data_sinks
           WHERE project_id = ?1 AND site_id = ?2 AND data_sink_name = ?3"
        ),
        vec![text(project_id), text(site_id), text(data_sink_name)],
        RawDataSink::from_row,
      )
      .await?
      .map(RawDataSink::into_data_sink)
      .transpose()
  }

  async fn list_data_sinks(
    &self,
    project_id: &str,
    site_id: &str,
    page: Page,
  ) -> Result<Vec<DataSink>> {
    let [limit, offset] = page_params(page);
    self
      .select(
        format!(
          "SELECT {DATA_SINK_COLUMNS} FROM data_sinks
           WHERE project_id = ?1 AND site_id = ?2
           ORDER BY data_sink_name
           LIMIT ?3 OFFSET ?4"
        ),
        vec![text(project_id), text(site_id), limit, offset],
        RawDataSink::from_row,
      )
      .await?
      .into_iter()
      .map(RawDataSink::into_data_sink)
      .collect()
  }

  async fn delete_data_sink(
    &self,
    project_id: &str,
    site_id: &str,
    data_sink_name: &str,
  ) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM data_sinks
         WHERE project_id = ?1 AND site_id = ?2 AND data_sink_name = ?3",
        vec![text(project_id), text(site_id), text(data_sink_name)],
      )
      .await
      .map_err(|e| e.on_foreign_key("data_sinks_referenced"))?;
    Ok(removed > 0)
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, subject: Subject) -> Result<Subject> {
    let metadata = encode_metadata(&subject.subject_metadata)?;
    self
      .execute(
        "INSERT INTO subjects (subject_id, site_id, project_id, subject_metadata)
         VALUES (?1, ?2, ?3, ?4)",
        vec![
          text(&subject.subject_id),
          text(&subject.site_id),
          text(&subject.project_id),
          metadata.into(),
        ],
      )
      .await
      .map_err(|e| e.on_foreign_key("subjects_site_id_project_id_fkey"))?;
    Ok(subject)
  }

  async fn list_subjects(&self, project_id: &str, site_id: &str) -> Result<Vec<Subject>> {
    self
      .select(
        format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
           WHERE project_id = ?1 AND site_id = ?2
           ORDER BY subject_id"
        ),
        vec![text(project_id), text(site_id)],
        RawSubject::from_row,
      )
      .await?
      .into_iter()
      .map(RawSubject::into_subject)
      .collect()
  }

  // ── Files ─────────────────────────────────────────────────────────────────

  async fn put_file(&self, file: File) -> Result<u64> {
    self
      .execute(
        "INSERT INTO files (file_path, file_md5, file_size_mb, file_m_time)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (file_path, file_md5) DO UPDATE SET
           file_size_mb = excluded.file_size_mb,
           file_m_time  = excluded.file_m_time",
        vec![
          file.file_path.into(),
          file.file_md5.into(),
          file.file_size_mb.into(),
          encode_dt(file.file_m_time).into(),
        ],
      )
      .await
  }

  async fn get_file(&self, file_path: &str, file_md5: &str) -> Result<Option<File>> {
    self
      .select_one(
        format!("SELECT {FILE_COLUMNS} FROM files WHERE file_path = ?1 AND file_md5 = ?2"),
        vec![text(file_path), text(file_md5)],
        |row| RawFile::from_row_at(row, 0),
      )
      .await?
      .map(RawFile::into_file)
      .transpose()
  }

  async fn delete_file(&self, file_path: &str, file_md5: &str) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM files WHERE file_path = ?1 AND file_md5 = ?2",
        vec![text(file_path), text(file_md5)],
      )
      .await
      .map_err(|e| e.on_foreign_key("files_referenced"))?;
    Ok(removed > 0)
  }

  // ── Pull and push events ──────────────────────────────────────────────────

  async fn record_pull(&self, input: NewDataPull) -> Result<DataPull> {
    let pull_timestamp = input
      .pull_timestamp
      .unwrap_or_else(Utc::now)
      .trunc_subsecs(6);
    let metadata = encode_metadata(&input.pull_metadata)?;
    let params: Vec<Value> = vec![
      text(&input.subject_id),
      text(&input.data_source_name),
      text(&input.site_id),
      text(&input.project_id),
      text(&input.file_path),
      text(&input.file_md5),
      input.pull_time_s.into(),
      encode_dt(pull_timestamp).into(),
      metadata.into(),
    ];

    let data_pull_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO data_pull (
             subject_id, data_source_name, site_id, project_id,
             file_path, file_md5, pull_time_s, pull_timestamp, pull_metadata
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params_from_iter(params),
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(|e| Error::from(e).on_foreign_key("data_pull_fkey"))?;

    Ok(DataPull {
      data_pull_id,
      subject_id: input.subject_id,
      data_source_name: input.data_source_name,
      site_id: input.site_id,
      project_id: input.project_id,
      file_path: input.file_path,
      file_md5: input.file_md5,
      pull_time_s: input.pull_time_s,
      pull_timestamp,
      pull_metadata: input.pull_metadata,
    })
  }

  async fn get_pull(&self, data_pull_id: i64) -> Result<Option<DataPull>> {
    self
      .select_one(
        format!("SELECT {DATA_PULL_COLUMNS} FROM data_pull WHERE data_pull_id = ?1"),
        vec![Value::Integer(data_pull_id)],
        RawDataPull::from_row,
      )
      .await?
      .map(RawDataPull::into_data_pull)
      .transpose()
  }

  async fn delete_pull(&self, data_pull_id: i64) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM data_pull WHERE data_pull_id = ?1",
        vec![Value::Integer(data_pull_id)],
      )
      .await?;
    Ok(removed > 0)
  }

  async fn record_push(&self, input: NewDataPush) -> Result<DataPush> {
    let push_timestamp = input
      .push_timestamp
      .unwrap_or_else(Utc::now)
      .trunc_subsecs(6);
    let metadata = encode_metadata(&input.push_metadata)?;
    let params: Vec<Value> = vec![
      Value::Integer(input.data_sink_id),
      text(&input.file_path),
      text(&input.file_md5),
      input.push_time_s.into(),
      encode_dt(push_timestamp).into(),
      metadata.into(),
    ];

    let data_push_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO data_push (
             data_sink_id, file_path, file_md5, push_time_s, push_timestamp, push_metadata
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params_from_iter(params),
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(|e| Error::from(e).on_foreign_key("data_push_fkey"))?;

    Ok(DataPush {
      data_push_id,
      data_sink_id: input.data_sink_id,
      file_path: input.file_path,
      file_md5: input.file_md5,
      push_time_s: input.push_time_s,
      push_timestamp,
      push_metadata: input.push_metadata,
    })
  }

  async fn get_push(&self, data_push_id: i64) -> Result<Option<DataPush>> {
    self
      .select_one(
        format!("SELECT {DATA_PUSH_COLUMNS} FROM data_push WHERE data_push_id = ?1"),
        vec![Value::Integer(data_push_id)],
        RawDataPush::from_row,
      )
      .await?
      .map(RawDataPush::into_data_push)
      .transpose()
  }

  async fn delete_push(&self, data_push_id: i64) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM data_push WHERE data_push_id = ?1",
        vec![Value::Integer(data_push_id)],
      )
      .await?;
    Ok(removed > 0)
  }

  // ── Provenance reads ──────────────────────────────────────────────────────

  async fn pull_history(&self, project_id: &str, site_id: &str) -> Result<Vec<DataPull>> {
    self
      .select(
        format!(
          "SELECT {DATA_PULL_COLUMNS} FROM data_pull
           WHERE site_id = ?1 AND project_id = ?2
           ORDER BY pull_timestamp DESC, data_pull_id DESC"
        ),
        vec![text(site_id), text(project_id)],
        RawDataPull::from_row,
      )
      .await?
      .into_iter()
      .map(RawDataPull::into_data_pull)
      .collect()
  }

  async fn push_history(&self, project_id: &str, site_id: &str) -> Result<Vec<PushRecord>> {
    // The sink join scopes the pushes to the site; the pull join only
    // decorates them and may find nothing.
    self
      .select(
        "SELECT
           dp.data_push_id, dp.data_sink_id, dp.file_path, dp.file_md5,
           dp.push_time_s, dp.push_timestamp, dp.push_metadata,
           ds.data_sink_name, ds.data_sink_metadata,
           dpull.subject_id, dpull.data_source_name
         FROM data_push dp
         JOIN data_sinks ds
           ON dp.data_sink_id = ds.data_sink_id
         LEFT JOIN data_pull dpull
           ON dp.file_path = dpull.file_path AND dp.file_md5 = dpull.file_md5
         WHERE ds.site_id = ?1 AND ds.project_id = ?2
         ORDER BY dp.push_timestamp DESC, dp.data_push_id DESC"
          .to_owned(),
        vec![text(site_id), text(project_id)],
        RawPushRecord::from_row,
      )
      .await?
      .into_iter()
      .map(RawPushRecord::into_push_record)
      .collect()
  }

  async fn file_history(&self, project_id: &str, site_id: &str) -> Result<Vec<FileRecord>> {
    self
      .select(
        "SELECT
           f.file_path, f.file_md5, f.file_size_mb, f.file_m_time,
           dp.subject_id, dp.data_source_name
         FROM files f
         JOIN data_pull dp
           ON f.file_path = dp.file_path AND f.file_md5 = dp.file_md5
         WHERE dp.site_id = ?1 AND dp.project_id = ?2
         ORDER BY f.file_m_time DESC, dp.data_pull_id DESC"
          .to_owned(),
        vec![text(site_id), text(project_id)],
        RawFileRecord::from_row,
      )
      .await?
      .into_iter()
      .map(RawFileRecord::into_file_record)
      .collect()
  }

  // ── Keystore ──────────────────────────────────────────────────────────────

  async fn put_key(&self, entry: KeyEntry, sealed: Vec<u8>) -> Result<u64> {
    let metadata = encode_metadata(&entry.key_metadata)?;
    self
      .execute(
        "INSERT INTO key_store (key_name, project_id, key_value, key_type, key_metadata)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (key_name, project_id) DO UPDATE SET
           key_value    = excluded.key_value,
           key_type     = excluded.key_type,
           key_metadata = excluded.key_metadata",
        vec![
          entry.keystore_name.into(),
          entry.project_id.into(),
          Value::Blob(sealed),
          entry.key_type.into(),
          metadata.into(),
        ],
      )
      .await
      .map_err(|e| e.on_foreign_key("key_store_project_id_fkey"))
  }

  async fn update_key(&self, entry: KeyEntry, sealed: Vec<u8>) -> Result<u64> {
    let metadata = encode_metadata(&entry.key_metadata)?;
    self
      .execute(
        "UPDATE key_store
         SET key_value = ?3, key_type = ?4, key_metadata = ?5
         WHERE key_name = ?1 AND project_id = ?2",
        vec![
          entry.keystore_name.into(),
          entry.project_id.into(),
          Value::Blob(sealed),
          entry.key_type.into(),
          metadata.into(),
        ],
      )
      .await
  }

  async fn get_key(&self, project_id: &str, keystore_name: &str) -> Result<Option<KeyEntry>> {
    self
      .select_one(
        format!("SELECT {KEY_COLUMNS} FROM key_store WHERE project_id = ?1 AND key_name = ?2"),
        vec![text(project_id), text(keystore_name)],
        RawKeyEntry::from_row,
      )
      .await?
      .map(RawKeyEntry::into_key_entry)
      .transpose()
  }

  async fn get_key_value(&self, project_id: &str, keystore_name: &str) -> Result<Option<Vec<u8>>> {
    self
      .select_one(
        "SELECT key_value FROM key_store WHERE project_id = ?1 AND key_name = ?2".to_owned(),
        vec![text(project_id), text(keystore_name)],
        |row| row.get(0),
      )
      .await
  }

  async fn list_keys(&self, project_id: &str) -> Result<Vec<KeyEntry>> {
    self
      .select(
        format!("SELECT {KEY_COLUMNS} FROM key_store WHERE project_id = ?1 ORDER BY key_name"),
        vec![text(project_id)],
        RawKeyEntry::from_row,
      )
      .await?
      .into_iter()
      .map(RawKeyEntry::into_key_entry)
      .collect()
  }

  async fn delete_key(&self, project_id: &str, keystore_name: &str) -> Result<bool> {
    let removed = self
      .execute(
        "DELETE FROM key_store WHERE project_id = ?1 AND key_name = ?2",
        vec![text(project_id), text(keystore_name)],
      )
      .await?;
    Ok(removed > 0)
  }

  // ── Jobs ──────────────────────────────────────────────────────────────────

  async fn submit_job(&self, job: NewJob) -> Result<Job> {
    let created_at = Utc::now().trunc_subsecs(6);
    let metadata = encode_metadata(&job.job_metadata)?;
    let params: Vec<Value> = vec![
      text(&job.job_type),
      text(&job.project_id),
      text(&job.site_id),
      job.data_source_name.clone().into(),
      job.data_sink_name.clone().into(),
      job.requested_by.clone().into(),
      text(PENDING),
      metadata.into(),
      encode_dt(created_at).into(),
    ];

    let job_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO jobs (
             job_type, project_id, site_id, data_source_name, data_sink_name,
             requested_by, status, job_metadata, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params_from_iter(params),
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(|e| Error::from(e).on_foreign_key("jobs_site_id_project_id_fkey"))?;

    Ok(Job {
      job_id,
      job_type: job.job_type,
      project_id: job.project_id,
      site_id: job.site_id,
      data_source_name: job.data_source_name,
      data_sink_name: job.data_sink_name,
      requested_by: job.requested_by,
      status: PENDING.to_owned(),
      job_metadata: job.job_metadata,
      created_at,
    })
  }

  async fn list_jobs(&self, filter: JobFilter, page: Page) -> Result<Vec<Job>> {
    let mut clauses = Vec::new();
    let mut params = Vec::new();
    for (column, value) in [
      ("project_id", filter.project_id),
      ("site_id", filter.site_id),
      ("job_type", filter.job_type),
      ("status", filter.status),
      ("data_source_name", filter.data_source_name),
    ] {
      if let Some(value) = value {
        params.push(Value::Text(value));
        clauses.push(format!("{column} = ?{}", params.len()));
      }
    }
    let where_clause = if clauses.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", clauses.join(" AND "))
    };
    let n = params.len();
    params.extend(page_params(page));

    self
      .select(
        format!(
          "SELECT {JOB_COLUMNS} FROM jobs {where_clause}
           ORDER BY created_at DESC, job_id DESC
           LIMIT ?{} OFFSET ?{}",
          n + 1,
          n + 2
        ),
        params,
        RawJob::from_row,
      )
      .await?
      .into_iter()
      .map(RawJob::into_job)
      .collect()
  }
}
