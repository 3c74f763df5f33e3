//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::commands::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "healthmark.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Healthmark configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Put the input CSV files in the data directory");
                println!("  3. For PostgreSQL: set store_target and HEALTHMARK_PG_URL");
                println!("  4. Validate configuration: healthmark validate-config");
                println!("  5. Load the files: healthmark ingest");
                println!("  6. Run the pipeline: healthmark run");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Healthmark Configuration File
# Health-markers data-quality ETL

store_target = "sqlite"  # sqlite | postgresql

[application]
log_level = "info"
dry_run = false

[sqlite]
path = "data/Health_markers_datasets.db"

# [postgresql]
# connection_string = "${HEALTHMARK_PG_URL}"
# ssl_mode = "prefer"

[ingest]
data_dir = "data"

[pipeline]
source_table = "Health_markers_dataset"
pipeline_version = "v1.0"
quality_threshold = 80

[logging]
local_enabled = true
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Healthmark Configuration File
# Health-markers data-quality ETL
#
# This file lists every option with its default value.
#
# Healthmark supports two table stores:
#   - SQLite (single file, the default)
#   - PostgreSQL 14+
#
# Any key can be overridden with HEALTHMARK_<SECTION>_<KEY>, for example
# HEALTHMARK_PIPELINE_QUALITY_THRESHOLD=90.

# ============================================================================
# Store Selection
# ============================================================================
store_target = "sqlite"  # sqlite | postgresql

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (extract and validate, write nothing)
dry_run = false

# ============================================================================
# Table Store Configuration
# ============================================================================

# ----------------------------------------------------------------------------
# Option 1: SQLite
# ----------------------------------------------------------------------------
[sqlite]
# Database file, created if missing
path = "data/Health_markers_datasets.db"

# How long a writer waits on a locked database
busy_timeout_ms = 5000

# ----------------------------------------------------------------------------
# Option 2: PostgreSQL
# ----------------------------------------------------------------------------
# Uncomment this section if using PostgreSQL (store_target = "postgresql")
#
# [postgresql]
# # Connection string format: postgresql://[user[:password]@][host][:port][/dbname]
# connection_string = "${HEALTHMARK_PG_URL}"
#
# # Connection pool settings
# max_connections = 4                 # Maximum connections in pool (1-100)
# connection_timeout_seconds = 30     # Timeout for acquiring connection
# statement_timeout_seconds = 300     # Timeout for SQL statement execution
#
# # SSL/TLS mode: disable | allow | prefer | require | verify-ca | verify-full
# ssl_mode = "prefer"

# ============================================================================
# Ingestion
# ============================================================================
[ingest]
# Directory scanned (non-recursively) for input files
data_dir = "data"

# File extensions to load, compared case-insensitively
extensions = ["csv"]

# Single-byte field delimiter
delimiter = ","

# ============================================================================
# Pipeline
# ============================================================================
[pipeline]
source_table = "Health_markers_dataset"
raw_table = "health_markers_raw"
curated_table = "health_markers_curated"
analytics_table = "health_markers_analytics"
metadata_table = "etl_metadata"

# Version tag written to every metadata row
pipeline_version = "v1.0"

# Minimum quality score for the analytics table (0-100)
quality_threshold = 80

# Retry policy for idempotent store operations
[pipeline.retry]
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 2.0

# ============================================================================
# Validation
# ============================================================================
[validation]
# Text columns that are trimmed and title-cased
categorical_columns = ["Condition"]

# Tukey fence multiplier
iqr_multiplier = 1.5

# Markers with zero interquartile range: "flag" or "skip"
zero_iqr_policy = "flag"

# Score penalty per affected marker
[validation.weights]
missing = 5.0
invalid = 10.0
outlier = 3.0

# Numeric markers and their inclusive clinical ranges (catalog order is
# the order of the diagnostic columns)
[[validation.markers]]
name = "Blood_glucose"
min = 40
max = 500

[[validation.markers]]
name = "HbA1C"
min = 3
max = 20

[[validation.markers]]
name = "Systolic_BP"
min = 70
max = 250

[[validation.markers]]
name = "Diastolic_BP"
min = 40
max = 150

[[validation.markers]]
name = "LDL"
min = 20
max = 400

[[validation.markers]]
name = "HDL"
min = 10
max = 150

[[validation.markers]]
name = "Triglycerides"
min = 30
max = 1000

[[validation.markers]]
name = "Haemoglobin"
min = 5
max = 25

[[validation.markers]]
name = "MCV"
min = 50
max = 130

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local file logging
local_enabled = true

# Directory for log files
local_path = "logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"

# Log file name
file_name = "healthmark.log"

# File log format (json or text)
format = "json"
"#
        .to_string()
    }
}
