//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SiphonConfig;
use super::secret_string;
use crate::domain::errors::SiphonError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`SiphonConfig`]
/// 4. Applies environment variable overrides (`SIPHON_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Every failure is reported as [`SiphonError::Configuration`]: unreadable
/// file, missing section, a policy flag that is not a boolean, a missing
/// `${VAR}`, or a failed validation rule.
///
/// # Examples
///
/// ```no_run
/// use siphon::config::loader::load_config;
///
/// let config = load_config("siphon.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SiphonConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SiphonError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SiphonError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses and validates configuration from TOML text
///
/// Same pipeline as [`load_config`] minus the file read.
pub fn parse_config(contents: &str) -> Result<SiphonConfig> {
    let contents = substitute_env_vars(contents)?;

    // serde reports missing sections and non-boolean flags with the field name
    let mut config: SiphonConfig = toml::from_str(&contents)
        .map_err(|e| SiphonError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SiphonError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SiphonError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SiphonError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_bool_override(name: &str, value: &str) -> Result<bool> {
    value.trim().parse().map_err(|_| {
        SiphonError::Configuration(format!("{name} must be true or false, got '{value}'"))
    })
}

/// Applies environment variable overrides using the `SIPHON_*` prefix
///
/// Environment variables follow the pattern `SIPHON_<SECTION>_<KEY>`, for
/// example `SIPHON_TARGET_URI` or `SIPHON_AGGREGATION_BATCH_SIZE`.
/// Boolean and numeric overrides that do not parse are configuration errors
/// rather than silently ignored.
fn apply_env_overrides(config: &mut SiphonConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("SIPHON_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("SIPHON_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_bool_override("SIPHON_APPLICATION_DRY_RUN", &val)?;
    }

    // Source overrides
    if let Ok(val) = std::env::var("SIPHON_SOURCE_URI") {
        config.source.uri = secret_string(val);
    }
    if let Ok(val) = std::env::var("SIPHON_SOURCE_DB") {
        config.source.db = val;
    }
    if let Ok(val) = std::env::var("SIPHON_SOURCE_COLLECTION") {
        config.source.collection = val;
    }
    if let Ok(val) = std::env::var("SIPHON_SOURCE_FIELD") {
        config.source.field = val;
    }

    // Target overrides
    if let Ok(val) = std::env::var("SIPHON_TARGET_URI") {
        config.target.uri = secret_string(val);
    }
    if let Ok(val) = std::env::var("SIPHON_TARGET_DB") {
        config.target.db = val;
    }
    if let Ok(val) = std::env::var("SIPHON_TARGET_COLLECTION") {
        config.target.collection = val;
    }
    if let Ok(val) = std::env::var("SIPHON_TARGET_FIELD") {
        config.target.field = val;
    }
    if let Ok(val) = std::env::var("SIPHON_TARGET_REWRITE_DOCUMENTS") {
        config.target.rewrite_documents =
            parse_bool_override("SIPHON_TARGET_REWRITE_DOCUMENTS", &val)?;
    }
    if let Ok(val) = std::env::var("SIPHON_TARGET_REWRITE_ARRAY") {
        config.target.rewrite_array = parse_bool_override("SIPHON_TARGET_REWRITE_ARRAY", &val)?;
    }
    if let Ok(val) = std::env::var("SIPHON_TARGET_DUPLICATES_IN_ARRAY") {
        config.target.duplicates_in_array =
            parse_bool_override("SIPHON_TARGET_DUPLICATES_IN_ARRAY", &val)?;
    }
    if let Ok(val) = std::env::var("SIPHON_TARGET_UNWRAP_OBJECT_ID") {
        config.target.unwrap_object_id =
            parse_bool_override("SIPHON_TARGET_UNWRAP_OBJECT_ID", &val)?;
    }

    // Aggregation overrides
    if let Ok(val) = std::env::var("SIPHON_AGGREGATION_ALLOW_DISK_USE") {
        config.aggregation.allow_disk_use =
            parse_bool_override("SIPHON_AGGREGATION_ALLOW_DISK_USE", &val)?;
    }
    if let Ok(val) = std::env::var("SIPHON_AGGREGATION_BATCH_SIZE") {
        config.aggregation.batch_size = val.trim().parse().map_err(|_| {
            SiphonError::Configuration(format!(
                "SIPHON_AGGREGATION_BATCH_SIZE must be a positive integer, got '{val}'"
            ))
        })?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("SIPHON_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_bool_override("SIPHON_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("SIPHON_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
