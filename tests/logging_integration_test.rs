//! Integration tests for logging functionality

use siphon::config::LoggingConfig;
use siphon::domain::SiphonError;
use siphon::logging::{init_logging, parse_log_level};
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_invalid_level_is_config_error() {
    let err = parse_log_level("loud").unwrap_err();
    assert!(matches!(err, SiphonError::Configuration(_)));
    assert_eq!(err.exit_code(), 2);
}

// The global subscriber can be installed once per process, so file output and
// double initialization are checked in a single test.
#[test]
fn test_file_logging_and_single_initialization() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    let guard = init_logging("info", &config).unwrap();
    siphon::log_transfer_start!("crystal.users", "_id", "pool.ids", "insert", 3usize);
    drop(guard);

    assert!(log_path.is_dir());
    let names: Vec<String> = std::fs::read_dir(&log_path)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(names.iter().any(|name| name.starts_with("siphon.log")));

    let second = init_logging("info", &LoggingConfig::default());
    assert!(matches!(second, Err(SiphonError::Other(_))));
}
