//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{HealthmarkConfig, PostgreSQLConfig, StoreTarget};
use super::secret::secret_string;
use crate::domain::errors::HealthmarkError;
use crate::domain::ids::TableName;
use crate::domain::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix for environment overrides: `HEALTHMARK_<SECTION>_<KEY>`
const ENV_PREFIX: &str = "HEALTHMARK";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into HealthmarkConfig
/// 4. Applies environment variable overrides (HEALTHMARK_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `HealthmarkError::Configuration` if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is unset
/// - An override holds an unusable value
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use healthmark::config::loader::load_config;
///
/// let config = load_config("healthmark.toml").expect("Failed to load config");
/// println!("Source table: {}", config.pipeline.source_table);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<HealthmarkConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(HealthmarkError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        HealthmarkError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Parses, overrides and validates configuration text
///
/// Used by [`load_config`] and by `healthmark init` to check the template
/// it writes.
pub fn load_config_from_str(contents: &str) -> Result<HealthmarkConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: HealthmarkConfig = toml::from_str(&contents)
        .map_err(|e| HealthmarkError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        HealthmarkError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| HealthmarkError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
    }

    if !missing_vars.is_empty() {
        return Err(HealthmarkError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{key}")).ok()
}

fn env_table(key: &str) -> Result<Option<TableName>> {
    env(key)
        .map(|val| {
            TableName::new(val).map_err(|e| {
                HealthmarkError::Configuration(format!("{ENV_PREFIX}_{key}: {e}"))
            })
        })
        .transpose()
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    env(key)
        .map(|val| {
            val.parse::<T>().map_err(|_| {
                HealthmarkError::Configuration(format!(
                    "{ENV_PREFIX}_{key} has an invalid value '{val}'"
                ))
            })
        })
        .transpose()
}

/// Applies environment variable overrides using the HEALTHMARK_* prefix
///
/// Environment variables follow the pattern: HEALTHMARK_<SECTION>_<KEY>
/// For example: HEALTHMARK_SQLITE_PATH, HEALTHMARK_PIPELINE_SOURCE_TABLE
fn apply_env_overrides(config: &mut HealthmarkConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env("APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Store selection
    if let Some(val) = env("STORE_TARGET") {
        config.store_target = match val.to_lowercase().as_str() {
            "sqlite" => StoreTarget::Sqlite,
            "postgresql" => StoreTarget::PostgreSQL,
            other => {
                return Err(HealthmarkError::Configuration(format!(
                    "{ENV_PREFIX}_STORE_TARGET must be 'sqlite' or 'postgresql', got '{other}'"
                )))
            }
        };
    }

    // SQLite overrides
    if let Some(val) = env("SQLITE_PATH") {
        config.sqlite.path = val;
    }
    if let Some(val) = env_parsed("SQLITE_BUSY_TIMEOUT_MS")? {
        config.sqlite.busy_timeout_ms = val;
    }

    // PostgreSQL overrides; a connection string alone is enough to
    // create the section
    if let Some(val) = env("POSTGRESQL_CONNECTION_STRING") {
        if let Some(ref mut pg) = config.postgresql {
            pg.connection_string = secret_string(val);
        } else {
            config.postgresql = Some(PostgreSQLConfig::with_connection_string(secret_string(
                val,
            )));
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = env_parsed("POSTGRESQL_MAX_CONNECTIONS")? {
            pg.max_connections = val;
        }
        if let Some(val) = env("POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // Ingest overrides
    if let Some(val) = env("INGEST_DATA_DIR") {
        config.ingest.data_dir = val;
    }
    if let Some(val) = env("INGEST_DELIMITER") {
        config.ingest.delimiter = val;
    }

    // Pipeline overrides
    if let Some(name) = env_table("PIPELINE_SOURCE_TABLE")? {
        config.pipeline.source_table = name;
    }
    if let Some(name) = env_table("PIPELINE_RAW_TABLE")? {
        config.pipeline.raw_table = name;
    }
    if let Some(name) = env_table("PIPELINE_CURATED_TABLE")? {
        config.pipeline.curated_table = name;
    }
    if let Some(name) = env_table("PIPELINE_ANALYTICS_TABLE")? {
        config.pipeline.analytics_table = name;
    }
    if let Some(name) = env_table("PIPELINE_METADATA_TABLE")? {
        config.pipeline.metadata_table = name;
    }
    if let Some(val) = env("PIPELINE_PIPELINE_VERSION") {
        config.pipeline.pipeline_version = val;
    }
    if let Some(val) = env_parsed("PIPELINE_QUALITY_THRESHOLD")? {
        config.pipeline.quality_threshold = val;
    }
    if let Some(val) = env_parsed("PIPELINE_RETRY_MAX_RETRIES")? {
        config.pipeline.retry.max_retries = val;
    }

    // Logging overrides
    if let Some(val) = env("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Some(val) = env("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("LOGGING_FORMAT") {
        config.logging.format = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("HM_LOADER_TEST_VAR", "test_value");
        let input = "connection_string = \"${HM_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "connection_string = \"test_value\"");
        std::env::remove_var("HM_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("HM_LOADER_MISSING_VAR");
        let input = "connection_string = \"${HM_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("HM_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("HM_LOADER_COMMENTED_VAR");
        let input = "# path = \"${HM_LOADER_COMMENTED_VAR}\"\n[sqlite]\n";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-healthmark.toml");
        assert!(matches!(result, Err(HealthmarkError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
store_target = "sqlite"

[application]
log_level = "debug"

[sqlite]
path = ":memory:"

[pipeline]
source_table = "markers_in"
quality_threshold = 70
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.sqlite.path, ":memory:");
        assert_eq!(config.pipeline.source_table.as_str(), "markers_in");
        assert_eq!(config.pipeline.quality_threshold, 70.0);
        assert_eq!(config.pipeline.raw_table.as_str(), "health_markers_raw");
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let result = load_config_from_str("[pipeline]\nquality_threshold = 120\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("quality_threshold"));
    }
}
