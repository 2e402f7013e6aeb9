//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with microsecond
//! precision, so lexical order equals chronological order and `ORDER BY` on
//! the text column sorts by time. Metadata maps are stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use lakeline_core::{
  catalog::{DataSink, DataSource, Metadata, Project, Site, Subject},
  jobs::Job,
  keystore::KeyEntry,
  lineage::{DataPull, DataPush, File, FileRecord, PushRecord},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Metadata ────────────────────────────────────────────────────────────────

pub fn encode_metadata(m: &Metadata) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

pub fn decode_metadata(s: &str) -> Result<Metadata> {
  Ok(serde_json::from_str(s)?)
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const PROJECT_COLUMNS: &str =
  "project_id, project_name, project_is_active, project_metadata";

pub const SITE_COLUMNS: &str =
  "site_id, project_id, site_name, site_is_active, site_metadata";

pub const DATA_SOURCE_COLUMNS: &str = "data_source_name, data_source_is_active, site_id, \
   project_id, data_source_type, data_source_metadata";

pub const DATA_SINK_COLUMNS: &str =
  "data_sink_id, data_sink_name, site_id, project_id, data_sink_metadata";

pub const SUBJECT_COLUMNS: &str = "subject_id, site_id, project_id, subject_metadata";

pub const FILE_COLUMNS: &str = "file_path, file_md5, file_size_mb, file_m_time";

pub const DATA_PULL_COLUMNS: &str = "data_pull_id, subject_id, data_source_name, site_id, \
   project_id, file_path, file_md5, pull_time_s, pull_timestamp, pull_metadata";

pub const DATA_PUSH_COLUMNS: &str = "data_push_id, data_sink_id, file_path, file_md5, \
   push_time_s, push_timestamp, push_metadata";

pub const KEY_COLUMNS: &str = "key_name, key_type, project_id, key_metadata";

pub const JOB_COLUMNS: &str = "job_id, job_type, project_id, site_id, data_source_name, \
   data_sink_name, requested_by, status, job_metadata, created_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `projects` row.
pub struct RawProject {
  pub project_id:        String,
  pub project_name:      String,
  pub project_is_active: bool,
  pub project_metadata:  String,
}

impl RawProject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project_id:        row.get(0)?,
      project_name:      row.get(1)?,
      project_is_active: row.get(2)?,
      project_metadata:  row.get(3)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:        self.project_id,
      project_name:      self.project_name,
      project_is_active: self.project_is_active,
      project_metadata:  decode_metadata(&self.project_metadata)?,
    })
  }
}

pub struct RawSite {
  pub site_id:        String,
  pub project_id:     String,
  pub site_name:      String,
  pub site_is_active: bool,
  pub site_metadata:  String,
}

impl RawSite {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      site_id:        row.get(0)?,
      project_id:     row.get(1)?,
      site_name:      row.get(2)?,
      site_is_active: row.get(3)?,
      site_metadata:  row.get(4)?,
    })
  }

  pub fn into_site(self) -> Result<Site> {
    Ok(Site {
      site_id:        self.site_id,
      project_id:     self.project_id,
      site_name:      self.site_name,
      site_is_active: self.site_is_active,
      site_metadata:  decode_metadata(&self.site_metadata)?,
    })
  }
}

pub struct RawDataSource {
  pub data_source_name:      String,
  pub data_source_is_active: bool,
  pub site_id:               String,
  pub project_id:            String,
  pub data_source_type:      String,
  pub data_source_metadata:  String,
}

impl RawDataSource {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      data_source_name:      row.get(0)?,
      data_source_is_active: row.get(1)?,
      site_id:               row.get(2)?,
      project_id:            row.get(3)?,
      data_source_type:      row.get(4)?,
      data_source_metadata:  row.get(5)?,
    })
  }

  pub fn into_data_source(self) -> Result<DataSource> {
    Ok(DataSource {
      data_source_name:      self.data_source_name,
      data_source_is_active: self.data_source_is_active,
      site_id:               self.site_id,
      project_id:            self.project_id,
      data_source_type:      self.data_source_type,
      data_source_metadata:  decode_metadata(&self.data_source_metadata)?,
    })
  }
}

pub struct RawDataSink {
  pub data_sink_id:       i64,
  pub data_sink_name:     String,
  pub site_id:            String,
  pub project_id:         String,
  pub data_sink_metadata: String,
}

impl RawDataSink {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      data_sink_id:       row.get(0)?,
      data_sink_name:     row.get(1)?,
      site_id:            row.get(2)?,
      project_id:         row.get(3)?,
      data_sink_metadata: row.get(4)?,
    })
  }

  pub fn into_data_sink(self) -> Result<DataSink> {
    Ok(DataSink {
      data_sink_id:       self.data_sink_id,
      data_sink_name:     self.data_sink_name,
      site_id:            self.site_id,
      project_id:         self.project_id,
      data_sink_metadata: decode_metadata(&self.data_sink_metadata)?,
    })
  }
}

pub struct RawSubject {
  pub subject_id:       String,
  pub site_id:          String,
  pub project_id:       String,
  pub subject_metadata: String,
}

impl RawSubject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:       row.get(0)?,
      site_id:          row.get(1)?,
      project_id:       row.get(2)?,
      subject_metadata: row.get(3)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:       self.subject_id,
      site_id:          self.site_id,
      project_id:       self.project_id,
      subject_metadata: decode_metadata(&self.subject_metadata)?,
    })
  }
}

pub struct RawFile {
  pub file_path:    String,
  pub file_md5:     String,
  pub file_size_mb: f64,
  pub file_m_time:  String,
}

impl RawFile {
  /// Reads the four file columns starting at `offset`.
  pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      file_path:    row.get(offset)?,
      file_md5:     row.get(offset + 1)?,
      file_size_mb: row.get(offset + 2)?,
      file_m_time:  row.get(offset + 3)?,
    })
  }

  pub fn into_file(self) -> Result<File> {
    Ok(File {
      file_path:    self.file_path,
      file_md5:     self.file_md5,
      file_size_mb: self.file_size_mb,
      file_m_time:  decode_dt(&self.file_m_time)?,
    })
  }
}

pub struct RawDataPull {
  pub data_pull_id:     i64,
  pub subject_id:       String,
  pub data_source_name: String,
  pub site_id:          String,
  pub project_id:       String,
  pub file_path:        String,
  pub file_md5:         String,
  pub pull_time_s:      f64,
  pub pull_timestamp:   String,
  pub pull_metadata:    String,
}

impl RawDataPull {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      data_pull_id:     row.get(0)?,
      subject_id:       row.get(1)?,
      data_source_name: row.get(2)?,
      site_id:          row.get(3)?,
      project_id:       row.get(4)?,
      file_path:        row.get(5)?,
      file_md5:         row.get(6)?,
      pull_time_s:      row.get(7)?,
      pull_timestamp:   row.get(8)?,
      pull_metadata:    row.get(9)?,
    })
  }

  pub fn into_data_pull(self) -> Result<DataPull> {
    Ok(DataPull {
      data_pull_id:     self.data_pull_id,
      subject_id:       self.subject_id,
      data_source_name: self.data_source_name,
      site_id:          self.site_id,
      project_id:       self.project_id,
      file_path:        self.file_path,
      file_md5:         self.file_md5,
      pull_time_s:      self.pull_time_s,
      pull_timestamp:   decode_dt(&self.pull_timestamp)?,
      pull_metadata:    decode_metadata(&self.pull_metadata)?,
    })
  }
}

pub struct RawDataPush {
  pub data_push_id:   i64,
  pub data_sink_id:   i64,
  pub file_path:      String,
  pub file_md5:       String,
  pub push_time_s:    f64,
  pub push_timestamp: String,
  pub push_metadata:  String,
}

impl RawDataPush {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      data_push_id:   row.get(0)?,
      data_sink_id:   row.get(1)?,
      file_path:      row.get(2)?,
      file_md5:       row.get(3)?,
      push_time_s:    row.get(4)?,
      push_timestamp: row.get(5)?,
      push_metadata:  row.get(6)?,
    })
  }

  pub fn into_data_push(self) -> Result<DataPush> {
    Ok(DataPush {
      data_push_id:   self.data_push_id,
      data_sink_id:   self.data_sink_id,
      file_path:      self.file_path,
      file_md5:       self.file_md5,
      push_time_s:    self.push_time_s,
      push_timestamp: decode_dt(&self.push_timestamp)?,
      push_metadata:  decode_metadata(&self.push_metadata)?,
    })
  }
}

/// A `data_push` row joined with its sink and any matching `data_pull`.
pub struct RawPushRecord {
  // data_push columns
  pub push:               RawDataPush,
  // data_sinks join
  pub data_sink_name:     String,
  pub data_sink_metadata: String,
  // data_pull left join
  pub subject_id:         Option<String>,
  pub data_source_name:   Option<String>,
}

impl RawPushRecord {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      push:               RawDataPush::from_row(row)?,
      data_sink_name:     row.get(7)?,
      data_sink_metadata: row.get(8)?,
      subject_id:         row.get(9)?,
      data_source_name:   row.get(10)?,
    })
  }

  pub fn into_push_record(self) -> Result<PushRecord> {
    Ok(PushRecord {
      push:               self.push.into_data_push()?,
      data_sink_name:     self.data_sink_name,
      data_sink_metadata: decode_metadata(&self.data_sink_metadata)?,
      subject_id:         self.subject_id,
      data_source_name:   self.data_source_name,
    })
  }
}

/// A `files` row joined with the `data_pull` that places it at a site.
pub struct RawFileRecord {
  pub file:             RawFile,
  pub subject_id:       String,
  pub data_source_name: String,
}

impl RawFileRecord {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      file:             RawFile::from_row_at(row, 0)?,
      subject_id:       row.get(4)?,
      data_source_name: row.get(5)?,
    })
  }

  pub fn into_file_record(self) -> Result<FileRecord> {
    Ok(FileRecord {
      file:             self.file.into_file()?,
      subject_id:       self.subject_id,
      data_source_name: self.data_source_name,
    })
  }
}

/// A `key_store` row without its sealed value.
pub struct RawKeyEntry {
  pub key_name:     String,
  pub key_type:     String,
  pub project_id:   String,
  pub key_metadata: String,
}

impl RawKeyEntry {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      key_name:     row.get(0)?,
      key_type:     row.get(1)?,
      project_id:   row.get(2)?,
      key_metadata: row.get(3)?,
    })
  }

  pub fn into_key_entry(self) -> Result<KeyEntry> {
    Ok(KeyEntry {
      keystore_name: self.key_name,
      key_type:      self.key_type,
      project_id:    self.project_id,
      key_metadata:  decode_metadata(&self.key_metadata)?,
    })
  }
}

pub struct RawJob {
  pub job_id:           i64,
  pub job_type:         String,
  pub project_id:       String,
  pub site_id:          String,
  pub data_source_name: Option<String>,
  pub data_sink_name:   Option<String>,
  pub requested_by:     Option<String>,
  pub status:           String,
  pub job_metadata:     String,
  pub created_at:       String,
}

impl RawJob {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      job_id:           row.get(0)?,
      job_type:         row.get(1)?,
      project_id:       row.get(2)?,
      site_id:          row.get(3)?,
      data_source_name: row.get(4)?,
      data_sink_name:   row.get(5)?,
      requested_by:     row.get(6)?,
      status:           row.get(7)?,
      job_metadata:     row.get(8)?,
      created_at:       row.get(9)?,
    })
  }

  pub fn into_job(self) -> Result<Job> {
    Ok(Job {
      job_id:           self.job_id,
      job_type:         self.job_type,
      project_id:       self.project_id,
      site_id:          self.site_id,
      data_source_name: self.data_source_name,
      data_sink_name:   self.data_sink_name,
      requested_by:     self.requested_by,
      status:           self.status,
      job_metadata:     decode_metadata(&self.job_metadata)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}
