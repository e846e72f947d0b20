//! Integration tests for config file discovery
//!
//! Tests that manipulate VCB_CONFIG are marked with #[serial] so they do not
//! race each other.

use serial_test::serial;
use std::env;
use std::path::Path;
use tempfile::TempDir;
use vcb_common::config::{ConfigLocator, CONFIG_ENV_VAR};
use vcb_common::Error;

#[test]
#[serial]
fn test_explicit_path_takes_precedence_over_env() {
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("explicit.toml");
    let from_env = dir.path().join("env.toml");
    std::fs::write(&explicit, "").unwrap();
    std::fs::write(&from_env, "").unwrap();
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let located = ConfigLocator::new("test-module")
        .locate(Some(&explicit))
        .unwrap();
    assert_eq!(located.as_deref(), Some(explicit.as_path()));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_explicit_path() {
    let dir = TempDir::new().unwrap();
    let from_env = dir.path().join("env.toml");
    std::fs::write(&from_env, "").unwrap();
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let located = ConfigLocator::new("test-module").locate(None).unwrap();
    assert_eq!(located, Some(from_env));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_not_found() {
    env::remove_var(CONFIG_ENV_VAR);

    let result = ConfigLocator::new("test-module")
        .locate(Some(Path::new("/nonexistent/vcb/explicit.toml")));
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
#[serial]
fn test_missing_env_file_is_not_found() {
    env::set_var(CONFIG_ENV_VAR, "/nonexistent/vcb/env.toml");

    let result = ConfigLocator::new("test-module").locate(None);
    assert!(matches!(result, Err(Error::NotFound(_))));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    // Falls through to platform locations; a module name nobody installs
    // resolves to no file at all.
    let located = ConfigLocator::new("vcb-test-module-without-config")
        .locate(None)
        .unwrap();
    assert!(located.is_none());

    env::remove_var(CONFIG_ENV_VAR);
}
