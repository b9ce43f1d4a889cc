//! Tests for config file resolution and loading
//!
//! Uses serial_test to prevent environment variable races: tests that
//! manipulate NUMLAB_CONFIG are marked #[serial].

use numlab_common::config::{resolve_config_path, LabConfig, CONFIG_ENV_VAR};
use numlab_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;

#[test]
#[serial]
fn test_cli_argument_wins_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(Some(std::path::Path::new("/tmp/from-cli.toml")), CONFIG_ENV_VAR);
    assert_eq!(resolved.unwrap().to_str().unwrap(), "/tmp/from-cli.toml");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    assert_eq!(resolved.unwrap().to_str().unwrap(), "/tmp/from-env.toml");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_reads_file_from_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
log_level = "debug"

[audio]
enabled = false
ambient_gain = 0.1

[storage]
database = "/tmp/numlab-test.db"
"#
    )
    .unwrap();

    env::set_var(CONFIG_ENV_VAR, file.path());
    let config = LabConfig::load(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.log_level, "debug");
    assert!(!config.audio.enabled);
    assert_eq!(config.audio.ambient_gain, 0.1);
    assert_eq!(config.storage.database.to_str().unwrap(), "/tmp/numlab-test.db");
    // Untouched sections keep their defaults
    assert!(config.session.auto_advance);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let result = LabConfig::load(Some(std::path::Path::new("/nonexistent/numlab/config.toml")));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_out_of_range_gain_rejected() {
    let result = LabConfig::from_toml("[audio]\nambient_gain = 1.5\n");
    assert!(matches!(result, Err(Error::Config(_))));
}
