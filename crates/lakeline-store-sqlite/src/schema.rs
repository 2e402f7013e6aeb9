//! SQL schema for the Lakeline SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision; nothing reads it yet.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Foreign keys use the default `NO ACTION`, so deleting a parent row that is
/// still referenced fails instead of cascading.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    project_id        TEXT PRIMARY KEY,
    project_name      TEXT NOT NULL,
    project_is_active INTEGER NOT NULL DEFAULT 1,
    project_metadata  TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS sites (
    site_id        TEXT NOT NULL,
    project_id     TEXT NOT NULL,
    site_name      TEXT NOT NULL,
    site_is_active INTEGER NOT NULL DEFAULT 1,
    site_metadata  TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (project_id, site_id),
    FOREIGN KEY (project_id) REFERENCES projects(project_id)
);

CREATE TABLE IF NOT EXISTS supported_data_source_types (
    data_source_type TEXT PRIMARY KEY
);

INSERT OR IGNORE INTO supported_data_source_types (data_source_type)
VALUES ('redcap'), ('xnat'), ('sharepoint'), ('cantab'), ('mindlamp');

CREATE TABLE IF NOT EXISTS data_sources (
    data_source_name      TEXT NOT NULL,
    data_source_is_active INTEGER NOT NULL DEFAULT 1,
    site_id               TEXT NOT NULL,
    project_id            TEXT NOT NULL,
    data_source_type      TEXT NOT NULL
        REFERENCES supported_data_source_types(data_source_type),
    data_source_metadata  TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (data_source_name, site_id, project_id),
    FOREIGN KEY (project_id, site_id) REFERENCES sites(project_id, site_id)
);

-- data_sink_id is the surrogate; upserts match on the natural key.
CREATE TABLE IF NOT EXISTS data_sinks (
    data_sink_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    data_sink_name     TEXT NOT NULL,
    site_id            TEXT NOT NULL,
    project_id         TEXT NOT NULL,
    data_sink_metadata TEXT NOT NULL DEFAULT '{}',
    UNIQUE (data_sink_name, site_id, project_id),
    FOREIGN KEY (project_id, site_id) REFERENCES sites(project_id, site_id)
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id       TEXT NOT NULL,
    site_id          TEXT NOT NULL,
    project_id       TEXT NOT NULL,
    subject_metadata TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (subject_id, site_id, project_id),
    FOREIGN KEY (project_id, site_id) REFERENCES sites(project_id, site_id)
);

CREATE TABLE IF NOT EXISTS files (
    file_path    TEXT NOT NULL,
    file_md5     TEXT NOT NULL,
    file_size_mb REAL NOT NULL,
    file_m_time  TEXT NOT NULL,   -- RFC 3339 UTC, microseconds
    PRIMARY KEY (file_path, file_md5)
);

CREATE TABLE IF NOT EXISTS data_pull (
    data_pull_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id       TEXT NOT NULL,
    data_source_name TEXT NOT NULL,
    site_id          TEXT NOT NULL,
    project_id       TEXT NOT NULL,
    file_path        TEXT NOT NULL,
    file_md5         TEXT NOT NULL,
    pull_time_s      REAL NOT NULL,
    pull_timestamp   TEXT NOT NULL,
    pull_metadata    TEXT NOT NULL DEFAULT '{}',
    FOREIGN KEY (file_path, file_md5) REFERENCES files(file_path, file_md5),
    FOREIGN KEY (subject_id, site_id, project_id)
        REFERENCES subjects(subject_id, site_id, project_id),
    FOREIGN KEY (data_source_name, site_id, project_id)
        REFERENCES data_sources(data_source_name, site_id, project_id)
);

CREATE TABLE IF NOT EXISTS data_push (
    data_push_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    data_sink_id   INTEGER NOT NULL REFERENCES data_sinks(data_sink_id),
    file_path      TEXT NOT NULL,
    file_md5       TEXT NOT NULL,
    push_time_s    REAL NOT NULL,
    push_timestamp TEXT NOT NULL,
    push_metadata  TEXT NOT NULL DEFAULT '{}',
    FOREIGN KEY (file_path, file_md5) REFERENCES files(file_path, file_md5)
);

-- key_value holds salt, nonce and ciphertext; never plaintext.
CREATE TABLE IF NOT EXISTS key_store (
    key_name     TEXT NOT NULL,
    project_id   TEXT NOT NULL REFERENCES projects(project_id),
    key_value    BLOB NOT NULL,
    key_type     TEXT NOT NULL,
    key_metadata TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (key_name, project_id)
);

CREATE TABLE IF NOT EXISTS jobs (
    job_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    job_type         TEXT NOT NULL,
    project_id       TEXT NOT NULL,
    site_id          TEXT NOT NULL,
    data_source_name TEXT,
    data_sink_name   TEXT,
    requested_by     TEXT,
    status           TEXT NOT NULL DEFAULT 'pending',
    job_metadata     TEXT NOT NULL DEFAULT '{}',
    created_at       TEXT NOT NULL,
    FOREIGN KEY (project_id, site_id) REFERENCES sites(project_id, site_id)
);

CREATE INDEX IF NOT EXISTS data_pull_scope_idx ON data_pull(project_id, site_id);
CREATE INDEX IF NOT EXISTS data_pull_file_idx  ON data_pull(file_path, file_md5);
CREATE INDEX IF NOT EXISTS data_push_sink_idx  ON data_push(data_sink_id);
CREATE INDEX IF NOT EXISTS data_push_file_idx  ON data_push(file_path, file_md5);
CREATE INDEX IF NOT EXISTS jobs_scope_idx       ON jobs(project_id, site_id, created_at);

PRAGMA user_version = 2;
";
