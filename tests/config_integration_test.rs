//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use healthmark::config::{load_config, StoreTarget, ZeroIqrPolicy};
use healthmark::domain::MarkerRange;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("HEALTHMARK_APPLICATION_LOG_LEVEL");
    std::env::remove_var("HEALTHMARK_APPLICATION_DRY_RUN");
    std::env::remove_var("HEALTHMARK_STORE_TARGET");
    std::env::remove_var("HEALTHMARK_PIPELINE_SOURCE_TABLE");
    std::env::remove_var("HEALTHMARK_PIPELINE_QUALITY_THRESHOLD");
    std::env::remove_var("HEALTHMARK_POSTGRESQL_CONNECTION_STRING");
    std::env::remove_var("TEST_HM_PG_URL");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let toml_content = r#"
store_target = "sqlite"

[application]
log_level = "debug"
dry_run = true

[sqlite]
path = "/tmp/healthmark/markers.db"
busy_timeout_ms = 2000

[ingest]
data_dir = "/srv/incoming"
extensions = ["csv", "txt"]
delimiter = ";"

[pipeline]
source_table = "markers_2024"
raw_table = "markers_raw"
curated_table = "markers_curated"
analytics_table = "markers_analytics"
metadata_table = "markers_runs"
pipeline_version = "v2.3"
quality_threshold = 90

[pipeline.retry]
max_retries = 5
initial_delay_ms = 100
max_delay_ms = 2000
backoff_multiplier = 3.0

[validation]
categorical_columns = ["Condition", "Sex"]
iqr_multiplier = 3.0
zero_iqr_policy = "skip"

[validation.weights]
missing = 2.5
invalid = 20
outlier = 1

[[validation.markers]]
name = "Blood_glucose"
min = 50
max = 400

[[validation.markers]]
name = "HbA1C"
min = 4
max = 15

[logging]
local_enabled = false
local_path = "/tmp/healthmark/logs"
local_rotation = "hourly"
format = "text"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    // Application
    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);

    // Store
    assert_eq!(config.store_target, StoreTarget::Sqlite);
    assert_eq!(config.sqlite.path, "/tmp/healthmark/markers.db");
    assert_eq!(config.sqlite.busy_timeout_ms, 2000);
    assert!(config.postgresql.is_none());

    // Ingest
    assert_eq!(config.ingest.data_dir, "/srv/incoming");
    assert_eq!(config.ingest.extensions, vec!["csv", "txt"]);
    assert_eq!(config.ingest.delimiter_byte().unwrap(), b';');

    // Pipeline
    let p = &config.pipeline;
    assert_eq!(p.source_table.as_str(), "markers_2024");
    assert_eq!(p.raw_table.as_str(), "markers_raw");
    assert_eq!(p.curated_table.as_str(), "markers_curated");
    assert_eq!(p.analytics_table.as_str(), "markers_analytics");
    assert_eq!(p.metadata_table.as_str(), "markers_runs");
    assert_eq!(p.pipeline_version, "v2.3");
    assert_eq!(p.quality_threshold, 90.0);
    assert_eq!(p.retry.max_retries, 5);
    assert_eq!(p.retry.backoff_multiplier, 3.0);

    // Validation
    let v = &config.validation;
    assert_eq!(v.categorical_columns, vec!["Condition", "Sex"]);
    assert_eq!(v.iqr_multiplier, 3.0);
    assert_eq!(v.zero_iqr_policy, ZeroIqrPolicy::Skip);
    assert_eq!(v.weights.missing, 2.5);
    assert_eq!(v.weights.invalid, 20.0);
    assert_eq!(v.markers.len(), 2);
    assert_eq!(
        v.markers.get("HbA1C"),
        Some(&MarkerRange::new("HbA1C", 4.0, 15.0))
    );

    // Logging
    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_empty_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert!(!config.application.dry_run);
    assert_eq!(config.store_target, StoreTarget::Sqlite);
    assert_eq!(config.sqlite.path, "data/Health_markers_datasets.db");
    assert_eq!(config.ingest.data_dir, "data");
    assert_eq!(config.pipeline.source_table.as_str(), "Health_markers_dataset");
    assert_eq!(config.pipeline.raw_table.as_str(), "health_markers_raw");
    assert_eq!(config.pipeline.curated_table.as_str(), "health_markers_curated");
    assert_eq!(
        config.pipeline.analytics_table.as_str(),
        "health_markers_analytics"
    );
    assert_eq!(config.pipeline.metadata_table.as_str(), "etl_metadata");
    assert_eq!(config.pipeline.pipeline_version, "v1.0");
    assert_eq!(config.pipeline.quality_threshold, 80.0);
    assert_eq!(config.validation.markers.len(), 9);
    assert_eq!(config.validation.categorical_columns, vec!["Condition"]);
    assert_eq!(config.validation.weights.missing, 5.0);
    assert_eq!(config.validation.weights.invalid, 10.0);
    assert_eq!(config.validation.weights.outlier, 3.0);
    assert_eq!(config.validation.zero_iqr_policy, ZeroIqrPolicy::Flag);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_HM_PG_URL", "postgresql://etl:secret@db:5432/markers");

    let toml_content = r#"
store_target = "postgresql"

[postgresql]
connection_string = "${TEST_HM_PG_URL}"
ssl_mode = "require"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    let pg = config.postgresql.expect("postgresql section");
    assert_eq!(
        pg.connection_string.expose_secret().as_ref(),
        "postgresql://etl:secret@db:5432/markers"
    );
    assert_eq!(pg.ssl_mode, "require");

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
store_target = "postgresql"

[postgresql]
connection_string = "${TEST_HM_PG_URL}"
"#;

    let temp_file = write_config(toml_content);
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_HM_PG_URL"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("HEALTHMARK_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("HEALTHMARK_PIPELINE_SOURCE_TABLE", "markers_override");
    std::env::set_var("HEALTHMARK_PIPELINE_QUALITY_THRESHOLD", "95");

    let toml_content = r#"
[application]
log_level = "info"

[pipeline]
source_table = "Health_markers_dataset"
quality_threshold = 80
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.pipeline.source_table.as_str(), "markers_override");
    assert_eq!(config.pipeline.quality_threshold, 95.0);

    cleanup_env_vars();
}

#[test]
fn test_env_override_can_select_postgresql() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("HEALTHMARK_STORE_TARGET", "postgresql");
    std::env::set_var(
        "HEALTHMARK_POSTGRESQL_CONNECTION_STRING",
        "postgresql://etl@localhost/markers",
    );

    let temp_file = write_config("");
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.store_target, StoreTarget::PostgreSQL);
    assert!(config.postgresql.is_some());

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        "[application]\nlog_level = \"invalid_level\"\n",
        "[pipeline]\nquality_threshold = -1\n",
        "[pipeline]\nraw_table = \"Health_markers_dataset\"\n",
        "[pipeline]\nsource_table = \" padded\"\n",
        "[ingest]\ndelimiter = \";;\"\n",
        "[validation]\ncategorical_columns = [\"HbA1C\"]\n",
        "[[validation.markers]]\nname = \"LDL\"\nmin = 400\nmax = 20\n",
        "store_target = \"postgresql\"\n",
        "[logging]\nformat = \"xml\"\n",
    ];

    for toml_content in cases {
        let temp_file = write_config(toml_content);
        let result = load_config(temp_file.path());
        assert!(result.is_err(), "expected rejection of:\n{toml_content}");
    }
}
