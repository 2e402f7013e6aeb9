//! Batch registration of sinks and sources across many sites.
//!
//! Each site is handled independently. A failure for one site is captured as
//! a value and recorded in [`BatchOutcome::failed`]; it never aborts the
//! remaining sites. Only the up-front argument check can fail a whole batch.

use std::{collections::BTreeSet, fmt::Display, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  catalog::{DataSource, Metadata, NewDataSink},
  store::CatalogStore,
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Which sites a batch succeeded and failed for. Both sets are unordered.
///
/// A site id repeated in the input is processed once per occurrence and may
/// therefore appear in both sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
  pub success: BTreeSet<String>,
  pub failed:  BTreeSet<String>,
}

impl BatchOutcome {
  /// Fold per-site upsert results into an outcome.
  ///
  /// `Ok(n)` counts as success only when `n > 0`.
  pub fn fold<E, I>(results: I) -> Self
  where
    E: Display,
    I: IntoIterator<Item = (String, Result<u64, E>)>,
  {
    results
      .into_iter()
      .fold(Self::default(), |mut outcome, (site_id, result)| {
        match result {
          Ok(rows) if rows > 0 => {
            outcome.success.insert(site_id);
          }
          Ok(_) => {
            warn!(%site_id, "upsert affected no rows");
            outcome.failed.insert(site_id);
          }
          Err(error) => {
            warn!(%site_id, %error, "batch item failed");
            outcome.failed.insert(site_id);
          }
        }
        outcome
      })
  }
}

// ─── Naming ──────────────────────────────────────────────────────────────────

/// Sink name synthesised for a batch item: `sink_{site_id}_{unix_micros}`.
pub fn sink_name(site_id: &str, at: DateTime<Utc>) -> String {
  format!("sink_{site_id}_{}", at.timestamp_micros())
}

/// Source name synthesised for a batch item:
/// `{data_source_type}_{site_id}_{unix_micros}`.
pub fn source_name(data_source_type: &str, site_id: &str, at: DateTime<Utc>) -> String {
  format!("{data_source_type}_{site_id}_{}", at.timestamp_micros())
}

fn check_batch(project_id: &str, site_ids: &[String]) -> Result<()> {
  if project_id.trim().is_empty() {
    return Err(Error::InvalidArgument("project_id must not be empty".into()));
  }
  if site_ids.is_empty() {
    return Err(Error::InvalidArgument("site_ids must not be empty".into()));
  }
  Ok(())
}

// ─── Registrar ───────────────────────────────────────────────────────────────

/// Registers one sink (or source) per site in a single call.
pub struct Registrar<S> {
  store: Arc<S>,
}

impl<S: CatalogStore> Registrar<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Upsert one sink per site, all carrying `metadata`.
  ///
  /// Fails with [`Error::InvalidArgument`] before touching the store if
  /// `project_id` or `site_ids` is empty. Otherwise always returns an
  /// outcome, however many sites failed.
  pub async fn register_sinks(
    &self,
    project_id: &str,
    site_ids: &[String],
    metadata: &Metadata,
  ) -> Result<BatchOutcome> {
    check_batch(project_id, site_ids)?;

    let mut results = Vec::with_capacity(site_ids.len());
    for site_id in site_ids {
      let sink = NewDataSink {
        data_sink_name:     sink_name(site_id, Utc::now()),
        site_id:            site_id.clone(),
        project_id:         project_id.to_owned(),
        data_sink_metadata: metadata.clone(),
      };
      debug!(%project_id, %site_id, data_sink_name = %sink.data_sink_name, "registering sink");
      results.push((site_id.clone(), self.store.put_data_sink(sink).await));
    }

    let outcome = BatchOutcome::fold(results);
    info!(
      %project_id,
      succeeded = outcome.success.len(),
      failed = outcome.failed.len(),
      "batch sink registration finished"
    );
    Ok(outcome)
  }

  /// Upsert one active source of `data_source_type` per site.
  ///
  /// The type is checked against the store's supported list once, up front;
  /// an unsupported type fails the whole call with
  /// [`Error::InvalidArgument`].
  pub async fn register_sources(
    &self,
    project_id: &str,
    site_ids: &[String],
    data_source_type: &str,
    metadata: &Metadata,
  ) -> Result<BatchOutcome> {
    check_batch(project_id, site_ids)?;
    if data_source_type.trim().is_empty() {
      return Err(Error::InvalidArgument("data_source_type must not be empty".into()));
    }

    let supported = self
      .store
      .supported_data_source_types()
      .await
      .map_err(Error::from_store)?;
    if !supported.iter().any(|t| t == data_source_type) {
      return Err(Error::InvalidArgument(format!(
        "unsupported data source type: {data_source_type:?}"
      )));
    }

    let mut results = Vec::with_capacity(site_ids.len());
    for site_id in site_ids {
      let source = DataSource {
        data_source_name:      source_name(data_source_type, site_id, Utc::now()),
        data_source_is_active: true,
        site_id:               site_id.clone(),
        project_id:            project_id.to_owned(),
        data_source_type:      data_source_type.to_owned(),
        data_source_metadata:  metadata.clone(),
      };
      results.push((site_id.clone(), self.store.put_data_source(source).await));
    }

    let outcome = BatchOutcome::fold(results);
    info!(
      %project_id,
      %data_source_type,
      succeeded = outcome.success.len(),
      failed = outcome.failed.len(),
      "batch source registration finished"
    );
    Ok(outcome)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn fold_splits_success_and_failure() {
    let outcome = BatchOutcome::fold(vec![
      ("a".to_string(), Ok::<u64, String>(1)),
      ("b".to_string(), Err("FOREIGN KEY".to_string())),
      ("c".to_string(), Ok(1)),
    ]);
    assert_eq!(outcome.success, ids(&["a", "c"]));
    assert_eq!(outcome.failed, ids(&["b"]));
  }

  #[test]
  fn fold_treats_zero_rows_as_failure() {
    let outcome = BatchOutcome::fold(vec![("a".to_string(), Ok::<u64, String>(0))]);
    assert!(outcome.success.is_empty());
    assert_eq!(outcome.failed, ids(&["a"]));
  }

  #[test]
  fn fold_of_nothing_is_empty() {
    let outcome = BatchOutcome::fold(Vec::<(String, Result<u64, String>)>::new());
    assert_eq!(outcome, BatchOutcome::default());
  }

  #[test]
  fn duplicate_site_can_land_in_both_sets() {
    let outcome = BatchOutcome::fold(vec![
      ("a".to_string(), Ok::<u64, String>(1)),
      ("a".to_string(), Err("busy".to_string())),
    ]);
    assert!(outcome.success.contains("a"));
    assert!(outcome.failed.contains("a"));
  }

  #[test]
  fn outcome_serialises_as_arrays() {
    let outcome = BatchOutcome::fold(vec![
      ("b".to_string(), Ok::<u64, String>(1)),
      ("a".to_string(), Ok(1)),
    ]);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json, serde_json::json!({ "success": ["a", "b"], "failed": [] }));
  }

  #[test]
  fn names_embed_site_and_microseconds() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let micros = at.timestamp_micros();
    assert_eq!(sink_name("ME", at), format!("sink_ME_{micros}"));
    assert_eq!(source_name("redcap", "ME", at), format!("redcap_ME_{micros}"));
  }

  #[test]
  fn batch_check_rejects_empty_inputs() {
    assert!(matches!(
      check_batch("", &["a".to_string()]),
      Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(check_batch("p", &[]), Err(Error::InvalidArgument(_))));
    assert!(check_batch("p", &["a".to_string()]).is_ok());
  }
}
