//! Router tests: real in-memory store, requests driven through `oneshot`.

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{TimeZone as _, Utc};
use lakeline_core::{
  catalog::{DataSource, Metadata, NewDataSink, Project, Site, Subject},
  lineage::{File, NewDataPull, NewDataPush},
  store::CatalogStore,
};
use lakeline_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, AuthConfig, api_router};

fn state(store: SqliteStore) -> AppState<SqliteStore> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(b"secret", &salt)
    .unwrap()
    .to_string();
  AppState::new(store, AuthConfig {
    username:      "user".into(),
    password_hash: hash,
  })
}

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(state(store).with_keystore("test passphrase"))
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
  let auth = format!("Basic {}", B64.encode("user:secret"));
  let builder = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::AUTHORIZATION, auth);
  match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
    .await
    .unwrap();
  let body = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, body)
}

/// Project `P1` with sites `S1` and `S2`.
async fn seeded() -> Router {
  let app = app().await;
  let (status, _) = send(
    &app,
    request(
      Method::POST,
      "/projects",
      Some(json!({"project_id": "P1", "project_name": "Pronet"})),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  for site in ["S1", "S2"] {
    let (status, _) = send(
      &app,
      request(
        Method::POST,
        "/projects/P1/sites",
        Some(json!({"site_id": site, "site_name": site})),
      ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }
  app
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_without_credentials_are_challenged() {
  let app = app().await;
  let req = Request::builder()
    .uri("/projects")
    .body(Body::empty())
    .unwrap();
  let res = app.oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
  assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
}

// ─── Projects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_project_and_missing_project() {
  let app = seeded().await;

  let (status, body) = send(&app, request(Method::GET, "/projects/P1", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["project_name"], "Pronet");
  assert_eq!(body["project_is_active"], true);

  let (status, body) = send(&app, request(Method::GET, "/projects/nope", None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn list_projects_reports_paging() {
  let app = seeded().await;
  let (status, body) = send(&app, request(Method::GET, "/projects?limit=5", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["metadata"], json!({"total_rows": 1, "limit": 5, "offset": 0}));
  assert_eq!(body["rows"][0]["project_id"], "P1");
}

#[tokio::test]
async fn delete_project_outcomes() {
  let app = seeded().await;

  let (status, _) = send(&app, request(Method::DELETE, "/projects/ghost", None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(&app, request(Method::DELETE, "/projects/P1", None)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  send(
    &app,
    request(Method::POST, "/projects", Some(json!({"project_id": "P2", "project_name": "x"}))),
  )
  .await;
  let (status, body) = send(&app, request(Method::DELETE, "/projects/P2", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Project deleted successfully");
}

// ─── Sites ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn site_delete_outcomes() {
  let app = seeded().await;
  let source_uri = "/projects/P1/sites/S1/sources/main";
  send(
    &app,
    request(
      Method::POST,
      "/projects/P1/sites/S1/sources",
      Some(json!({"data_source_name": "main", "data_source_type": "redcap"})),
    ),
  )
  .await;

  let (status, body) = send(&app, request(Method::DELETE, "/projects/P1/sites/S1", None)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "Conflict with existing data");
  let (status, _) = send(&app, request(Method::GET, "/projects/P1/sites/S1", None)).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(&app, request(Method::DELETE, "/projects/P1/sites/S9", None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = send(&app, request(Method::DELETE, "/projects/P1/sites/S2", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Site deleted successfully");
}

#[tokio::test]
async fn emptying_a_project_makes_it_deletable() {
  let app = seeded().await;
  let (status, _) = send(&app, request(Method::DELETE, "/projects/P1", None)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  for site in ["S1", "S2"] {
    let uri = format!("/projects/P1/sites/{site}");
    let (status, _) = send(&app, request(Method::DELETE, &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
  }
  let (status, _) = send(&app, request(Method::DELETE, "/projects/P1", None)).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = send(&app, request(Method::GET, "/projects/P1", None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Batch registration ──────────────────────────────────────────────────────

#[tokio::test]
async fn batch_sinks_report_success_and_failure() {
  let app = seeded().await;
  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/projects/P1/batch-add-data-sinks",
      Some(json!({"site_ids": ["S1", "S9"], "data_sink_metadata": {"bucket": "lake"}})),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], json!(["S1"]));
  assert_eq!(body["failed"], json!(["S9"]));

  let (_, sinks) = send(&app, request(Method::GET, "/projects/P1/sites/S1/sinks", None)).await;
  assert_eq!(sinks.as_array().map(Vec::len), Some(1));
  assert_eq!(sinks[0]["data_sink_metadata"]["bucket"], "lake");
}

#[tokio::test]
async fn batch_sinks_with_missing_fields_is_a_bad_request() {
  let app = seeded().await;
  for body in [
    json!({"site_ids": ["S1"]}),
    json!({"data_sink_metadata": {}}),
    json!({"site_ids": ["S1"], "data_sink_metadata": "not an object"}),
    json!({"site_ids": [], "data_sink_metadata": {}}),
  ] {
    let (status, _) = send(
      &app,
      request(Method::POST, "/projects/P1/batch-add-data-sinks", Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}

#[tokio::test]
async fn malformed_batch_bodies_name_the_required_fields() {
  let app = seeded().await;
  let expected = "Missing required fields: site_ids, data_sink_metadata";

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/projects/P1/batch-add-data-sinks",
      Some(json!({"site_ids": "S1", "data_sink_metadata": {}})),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], expected);

  // No content type at all.
  let req = Request::builder()
    .method(Method::POST)
    .uri("/projects/P1/batch-add-data-sinks")
    .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("user:secret")))
    .body(Body::from(r#"{"site_ids": ["S1"], "data_sink_metadata": {}}"#))
    .unwrap();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], expected);

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/projects/P1/batch-add-data-sources",
      Some(json!({
        "site_ids": {"S1": true},
        "data_source_type": "redcap",
        "data_source_metadata": {},
      })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().starts_with("Missing required fields"));
}

#[tokio::test]
async fn wrongly_typed_bodies_and_queries_are_json_bad_requests() {
  let app = seeded().await;

  let (status, body) = send(
    &app,
    request(Method::POST, "/projects/P1/sites/S1/subjects", Some(json!({"subject_id": 5}))),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Invalid JSON body");

  let (status, body) = send(&app, request(Method::GET, "/projects?limit=many", None)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn batch_sources_validate_the_type() {
  let app = seeded().await;

  let (status, _) = send(
    &app,
    request(
      Method::POST,
      "/projects/P1/batch-add-data-sources",
      Some(json!({
        "site_ids": ["S1"],
        "data_source_type": "fax",
        "data_source_metadata": {},
      })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/projects/P1/batch-add-data-sources",
      Some(json!({
        "site_ids": ["S1", "S2"],
        "data_source_type": "redcap",
        "data_source_metadata": {"endpoint": "https://redcap.example"},
      })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], json!(["S1", "S2"]));
}

// ─── Sources, sinks, subjects ────────────────────────────────────────────────

#[tokio::test]
async fn source_lifecycle() {
  let app = seeded().await;
  let (status, body) = send(&app, request(Method::GET, "/data-sources/supported", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.as_array().unwrap().contains(&json!("xnat")));

  let (status, _) = send(
    &app,
    request(
      Method::POST,
      "/projects/P1/sites/S1/sources",
      Some(json!({"data_source_name": "xnat_main", "data_source_type": "xnat"})),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let uri = "/projects/P1/sites/S1/sources/xnat_main";
  let (status, body) = send(&app, request(Method::GET, uri, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data_source_is_active"], true);

  let (status, _) = send(&app, request(Method::DELETE, uri, None)).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = send(&app, request(Method::GET, uri, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sink_put_replaces_metadata() {
  let app = seeded().await;
  let uri = "/projects/P1/sites/S1/sinks/archive";

  let (status, first) = send(
    &app,
    request(Method::PUT, uri, Some(json!({"data_sink_metadata": {"v": 1}}))),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, second) = send(
    &app,
    request(Method::PUT, uri, Some(json!({"data_sink_metadata": {"v": 2}}))),
  )
  .await;
  assert_eq!(second["data_sink_id"], first["data_sink_id"]);
  assert_eq!(second["data_sink_metadata"]["v"], 2);
}

#[tokio::test]
async fn duplicate_subject_conflicts() {
  let app = seeded().await;
  let uri = "/projects/P1/sites/S1/subjects";
  let body = json!({"subject_id": "AB00001"});

  let (status, _) = send(&app, request(Method::POST, uri, Some(body.clone()))).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, conflict) = send(&app, request(Method::POST, uri, Some(body))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(conflict["error"], "Conflict with existing data");

  let (_, subjects) = send(&app, request(Method::GET, uri, None)).await;
  assert_eq!(subjects[0]["subject_id"], "AB00001");
}

// ─── Provenance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_site_views_have_wrapped_empty_lists() {
  let app = seeded().await;
  for (path, key) in [
    ("data-pulls", "data_pulls"),
    ("data-pushes", "data_pushes"),
    ("files", "files"),
  ] {
    let uri = format!("/projects/P1/sites/S1/{path}");
    let (status, body) = send(&app, request(Method::GET, &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[key], json!([]));
    assert_eq!(body.as_object().map(|o| o.len()), Some(1));
  }
}

/// A store with one pull at `S1` and one push to an `S1` sink of the same
/// file, recorded directly rather than over HTTP.
async fn with_lineage() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let none = Metadata::new;
  store
    .create_project(Project {
      project_id:        "P1".into(),
      project_name:      "Pronet".into(),
      project_is_active: true,
      project_metadata:  none(),
    })
    .await
    .unwrap();
  for site_id in ["S1", "S2"] {
    store
      .put_site(Site {
        site_id:        site_id.into(),
        project_id:     "P1".into(),
        site_name:      site_id.into(),
        site_is_active: true,
        site_metadata:  none(),
      })
      .await
      .unwrap();
  }
  store
    .put_data_source(DataSource {
      data_source_name:      "redcap_main".into(),
      data_source_is_active: true,
      site_id:               "S1".into(),
      project_id:            "P1".into(),
      data_source_type:      "redcap".into(),
      data_source_metadata:  none(),
    })
    .await
    .unwrap();
  store
    .add_subject(Subject {
      subject_id:       "AB00001".into(),
      site_id:          "S1".into(),
      project_id:       "P1".into(),
      subject_metadata: none(),
    })
    .await
    .unwrap();
  store
    .put_file(File {
      file_path:    "/lake/AB00001/visit1.csv".into(),
      file_md5:     "d41d8cd9".into(),
      file_size_mb: 0.5,
      file_m_time:  Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    })
    .await
    .unwrap();
  store
    .record_pull(NewDataPull {
      subject_id:       "AB00001".into(),
      data_source_name: "redcap_main".into(),
      site_id:          "S1".into(),
      project_id:       "P1".into(),
      file_path:        "/lake/AB00001/visit1.csv".into(),
      file_md5:         "d41d8cd9".into(),
      pull_time_s:      2.5,
      pull_timestamp:   None,
      pull_metadata:    none(),
    })
    .await
    .unwrap();
  store
    .put_data_sink(NewDataSink {
      data_sink_name:     "archive".into(),
      site_id:            "S1".into(),
      project_id:         "P1".into(),
      data_sink_metadata: none(),
    })
    .await
    .unwrap();
  let sink = store.get_data_sink("P1", "S1", "archive").await.unwrap().unwrap();
  store
    .record_push(NewDataPush {
      data_sink_id:   sink.data_sink_id,
      file_path:      "/lake/AB00001/visit1.csv".into(),
      file_md5:       "d41d8cd9".into(),
      push_time_s:    1.0,
      push_timestamp: None,
      push_metadata:  none(),
    })
    .await
    .unwrap();
  api_router(state(store))
}

#[tokio::test]
async fn site_views_carry_recorded_lineage() {
  let app = with_lineage().await;
  let view = |path: &str| format!("/projects/P1/sites/S1/{path}");

  let (status, body) = send(&app, request(Method::GET, &view("data-pulls"), None)).await;
  assert_eq!(status, StatusCode::OK);
  let pulls = body["data_pulls"].as_array().unwrap();
  assert_eq!(pulls.len(), 1);
  assert_eq!(pulls[0]["subject_id"], "AB00001");
  assert_eq!(pulls[0]["pull_time_s"], 2.5);
  assert!(pulls[0]["data_pull_id"].is_i64());

  let (_, body) = send(&app, request(Method::GET, &view("data-pushes"), None)).await;
  let pushes = body["data_pushes"].as_array().unwrap();
  assert_eq!(pushes.len(), 1);
  assert_eq!(pushes[0]["data_sink_name"], "archive");
  assert_eq!(pushes[0]["file_path"], "/lake/AB00001/visit1.csv");
  assert_eq!(pushes[0]["subject_id"], "AB00001");
  assert_eq!(pushes[0]["data_source_name"], "redcap_main");

  let (_, body) = send(&app, request(Method::GET, &view("files"), None)).await;
  let files = body["files"].as_array().unwrap();
  assert_eq!(files.len(), 1);
  assert_eq!(files[0]["file_md5"], "d41d8cd9");
  assert_eq!(files[0]["file_m_time"], "2023-11-14T22:13:20Z");
  assert_eq!(files[0]["data_source_name"], "redcap_main");

  let (_, body) = send(&app, request(Method::GET, "/projects/P1/sites/S2/files", None)).await;
  assert_eq!(body["files"], json!([]));
}

// ─── Keystore ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn keystore_lifecycle_never_returns_values() {
  let app = seeded().await;
  let secret = "s3cr3t-token-value";

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/keystore",
      Some(json!({
        "keystore_name": "redcap",
        "key_value": secret,
        "key_type": "api_token",
        "project_id": "P1",
        "key_metadata": {"host": "redcap.example"},
      })),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["message"], "Keystore entry created successfully");
  assert_eq!(body["keystore_name"], "redcap");

  let (status, listing) = send(&app, request(Method::GET, "/keystore?project_id=P1", None)).await;
  assert_eq!(status, StatusCode::OK);
  let entries = listing["entries"].as_array().unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0]["key_type"], "api_token");
  assert!(entries[0].get("key_value").is_none());

  let (status, one) =
    send(&app, request(Method::GET, "/keystore/redcap?project_id=P1", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(one["entry"]["key_metadata"]["host"], "redcap.example");
  assert!(!one.to_string().contains(secret));
  assert!(!listing.to_string().contains(secret));

  let update = json!({"key_value": "rotated", "key_type": "api_token", "project_id": "P1"});
  let (status, body) =
    send(&app, request(Method::PUT, "/keystore/redcap", Some(update.clone()))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Keystore entry updated successfully");
  let (status, _) = send(&app, request(Method::PUT, "/keystore/ghost", Some(update))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let uri = "/keystore/redcap?project_id=P1";
  let (status, body) = send(&app, request(Method::DELETE, uri, None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Keystore entry deleted successfully");
  let (status, _) = send(&app, request(Method::DELETE, uri, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&app, request(Method::GET, uri, None)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn keystore_requires_its_fields() {
  let app = seeded().await;

  let (status, body) = send(&app, request(Method::GET, "/keystore", None)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Project ID is required");

  let (status, body) = send(
    &app,
    request(Method::POST, "/keystore", Some(json!({"keystore_name": "k", "project_id": "P1"}))),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(
    body["error"],
    "Missing required fields: keystore_name, key_value, key_type, project_id"
  );
}

#[tokio::test]
async fn keystore_writes_need_a_passphrase() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let app = api_router(state(store));
  send(
    &app,
    request(Method::POST, "/projects", Some(json!({"project_id": "P1", "project_name": "x"}))),
  )
  .await;

  let (status, body) = send(
    &app,
    request(
      Method::POST,
      "/keystore",
      Some(json!({"keystore_name": "k", "key_value": "v", "key_type": "t", "project_id": "P1"})),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["error"], "Internal server error");
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn jobs_are_queued_for_the_caller_and_filtered() {
  let app = seeded().await;
  let submit = |site: &str, job_type: &str| {
    request(
      Method::POST,
      "/jobs",
      Some(json!({
        "job_type": job_type,
        "project_id": "P1",
        "site_id": site,
        "data_source_name": "redcap_main",
      })),
    )
  };

  let (status, first) = send(&app, submit("S1", "pull")).await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(first["job_id"].is_i64());
  let (_, second) = send(&app, submit("S2", "pull")).await;
  let (_, third) = send(&app, submit("S1", "push")).await;

  let (status, body) = send(&app, request(Method::GET, "/jobs?site_id=S1", None)).await;
  assert_eq!(status, StatusCode::OK);
  let jobs = body["jobs"].as_array().unwrap();
  let ids: Vec<_> = jobs.iter().map(|j| j["job_id"].clone()).collect();
  assert_eq!(ids, [third["job_id"].clone(), first["job_id"].clone()]);
  assert_eq!(jobs[0]["status"], "pending");
  assert_eq!(jobs[0]["requested_by"], "user");

  let (_, body) = send(&app, request(Method::GET, "/jobs?job_type=pull&limit=1", None)).await;
  assert_eq!(body["jobs"][0]["job_id"], second["job_id"]);
  assert_eq!(body["jobs"].as_array().map(Vec::len), Some(1));

  let (_, body) = send(&app, request(Method::GET, "/jobs?status=done", None)).await;
  assert_eq!(body["jobs"], json!([]));
}

#[tokio::test]
async fn job_submission_outcomes() {
  let app = seeded().await;

  let (status, body) = send(
    &app,
    request(Method::POST, "/jobs", Some(json!({"job_type": "pull", "project_id": "P1"}))),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Missing required fields");

  let (status, _) = send(
    &app,
    request(
      Method::POST,
      "/jobs",
      Some(json!({"job_type": "pull", "project_id": "P1", "site_id": "S9"})),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}
