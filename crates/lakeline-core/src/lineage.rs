//! Lineage records: files and the pull/push events that move them.
//!
//! A file is identified by `(file_path, file_md5)`: the same content at the
//! same path is one logical file, however many times it was pulled or pushed.
//! Pulls and pushes are append-style event rows with store-assigned ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Metadata;

// ─── Files ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
  pub file_path:    String,
  pub file_md5:     String,
  pub file_size_mb: f64,
  /// Modification time of the file on disk.
  pub file_m_time:  DateTime<Utc>,
}

// ─── Pulls ───────────────────────────────────────────────────────────────────

/// Input to [`CatalogStore::record_pull`](crate::store::CatalogStore::record_pull).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataPull {
  pub subject_id:       String,
  pub data_source_name: String,
  pub site_id:          String,
  pub project_id:       String,
  pub file_path:        String,
  pub file_md5:         String,
  /// How long the pull took, in seconds.
  pub pull_time_s:      f64,
  /// Defaults to the insertion time when `None`.
  #[serde(default)]
  pub pull_timestamp:   Option<DateTime<Utc>>,
  #[serde(default)]
  pub pull_metadata:    Metadata,
}

/// One ingestion event of a file from a data source into the lake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPull {
  pub data_pull_id:     i64,
  pub subject_id:       String,
  pub data_source_name: String,
  pub site_id:          String,
  pub project_id:       String,
  pub file_path:        String,
  pub file_md5:         String,
  pub pull_time_s:      f64,
  pub pull_timestamp:   DateTime<Utc>,
  pub pull_metadata:    Metadata,
}

// ─── Pushes ──────────────────────────────────────────────────────────────────

/// Input to [`CatalogStore::record_push`](crate::store::CatalogStore::record_push).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataPush {
  pub data_sink_id:   i64,
  pub file_path:      String,
  pub file_md5:       String,
  pub push_time_s:    f64,
  /// Defaults to the insertion time when `None`.
  #[serde(default)]
  pub push_timestamp: Option<DateTime<Utc>>,
  #[serde(default)]
  pub push_metadata:  Metadata,
}

/// One egress event of a file to a data sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPush {
  pub data_push_id:   i64,
  pub data_sink_id:   i64,
  pub file_path:      String,
  pub file_md5:       String,
  pub push_time_s:    f64,
  pub push_timestamp: DateTime<Utc>,
  pub push_metadata:  Metadata,
}

// ─── Provenance views ────────────────────────────────────────────────────────

/// A push enriched with its sink and, when one exists, the pull that brought
/// the same file content into the lake.
///
/// Serialises flat: the push's own fields sit next to the joined columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRecord {
  #[serde(flatten)]
  pub push:               DataPush,
  pub data_sink_name:     String,
  pub data_sink_metadata: Metadata,
  /// `None` when no pull shares the push's `(file_path, file_md5)`.
  pub subject_id:         Option<String>,
  pub data_source_name:   Option<String>,
}

/// A file seen at a site, with the subject and source of the pull that
/// establishes its membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
  #[serde(flatten)]
  pub file:             File,
  pub subject_id:       String,
  pub data_source_name: String,
}
