//! Catalog entities: projects, sites, and the sources, sinks and subjects
//! that belong to a site.
//!
//! Field names match the persisted column names exactly; they double as the
//! JSON field names at the HTTP boundary.

use serde::{Deserialize, Serialize};

/// Open key-value metadata attached to most catalog rows.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

fn active() -> bool { true }

// ─── Projects and sites ──────────────────────────────────────────────────────

/// Top-level organisational unit. Owns sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  pub project_id:        String,
  pub project_name:      String,
  #[serde(default = "active")]
  pub project_is_active: bool,
  #[serde(default)]
  pub project_metadata:  Metadata,
}

/// A location within a project where data sources and sinks operate.
/// Identified by `(project_id, site_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
  pub site_id:        String,
  pub project_id:     String,
  pub site_name:      String,
  #[serde(default = "active")]
  pub site_is_active: bool,
  #[serde(default)]
  pub site_metadata:  Metadata,
}

// ─── Sources and sinks ───────────────────────────────────────────────────────

/// An origin from which files are pulled into the lake.
/// Identified by `(data_source_name, site_id, project_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
  pub data_source_name:      String,
  #[serde(default = "active")]
  pub data_source_is_active: bool,
  pub site_id:               String,
  pub project_id:            String,
  /// Must be one of the store's supported data source types.
  pub data_source_type:      String,
  #[serde(default)]
  pub data_source_metadata:  Metadata,
}

/// A destination to which files are pushed out of the lake.
///
/// `data_sink_id` is a store-assigned surrogate; upserts match on the
/// natural key `(data_sink_name, site_id, project_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSink {
  pub data_sink_id:       i64,
  pub data_sink_name:     String,
  pub site_id:            String,
  pub project_id:         String,
  pub data_sink_metadata: Metadata,
}

/// Input to [`CatalogStore::put_data_sink`](crate::store::CatalogStore::put_data_sink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataSink {
  pub data_sink_name:     String,
  pub site_id:            String,
  pub project_id:         String,
  #[serde(default)]
  pub data_sink_metadata: Metadata,
}

// ─── Subjects ────────────────────────────────────────────────────────────────

/// A participant identifier scoped to a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:       String,
  pub site_id:          String,
  pub project_id:       String,
  #[serde(default)]
  pub subject_metadata: Metadata,
}

// ─── Paging ──────────────────────────────────────────────────────────────────

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub limit:  usize,
  pub offset: usize,
}

impl Page {
  pub const DEFAULT_LIMIT: usize = 100;

  pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
    Self {
      limit:  limit.unwrap_or(Self::DEFAULT_LIMIT),
      offset: offset.unwrap_or(0),
    }
  }
}

impl Default for Page {
  fn default() -> Self { Self::new(None, None) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn active_flags_default_to_true() {
    let site: Site = serde_json::from_value(json!({
      "site_id": "s1",
      "project_id": "p1",
      "site_name": "Site One",
    }))
    .unwrap();
    assert!(site.site_is_active);
    assert!(site.site_metadata.is_empty());
  }

  #[test]
  fn page_defaults() {
    assert_eq!(Page::default(), Page { limit: 100, offset: 0 });
    assert_eq!(Page::new(Some(5), None), Page { limit: 5, offset: 0 });
  }
}
