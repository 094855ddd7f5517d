//! Configuration loading and root folder resolution
//!
//! Tests that touch DCCN_ROOT_FOLDER are marked #[serial] so they do not
//! race on the process environment.

use dccn_common::config::{
    CompiledDefaults, LoggingConfig, NotificationsConfig, RootFolderInitializer,
    RootFolderResolver, TomlConfig, DEFAULT_PORT, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.port, DEFAULT_PORT);
    assert!(defaults.root_folder.to_string_lossy().contains("dccn"));
}

#[test]
#[serial]
fn test_resolver_cli_arg_wins_over_env() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/dccn-from-env");

    let root = RootFolderResolver::new("test-module")
        .with_cli_arg(Some(PathBuf::from("/tmp/dccn-from-cli")))
        .resolve();
    assert_eq!(root, PathBuf::from("/tmp/dccn-from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_env_var() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/dccn-test-env-folder");

    let root = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root, PathBuf::from("/tmp/dccn-test-env-folder"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_ignores_empty_env_var() {
    env::set_var(ROOT_FOLDER_ENV, "");

    let root = RootFolderResolver::new("test-module").resolve();
    assert!(!root.as_os_str().is_empty());

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
fn test_initializer_database_path() {
    let root = PathBuf::from("/tmp/dccn-test-root");
    let initializer = RootFolderInitializer::new(root.clone());

    assert_eq!(initializer.database_path(), root.join("dccn.db"));
    assert_eq!(initializer.root_folder(), root.as_path());
}

#[test]
fn test_initializer_creates_nested_directory_idempotently() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("a").join("b");
    let initializer = RootFolderInitializer::new(root.clone());

    assert!(!initializer.database_exists());
    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();
    assert!(root.is_dir());
    assert!(!initializer.database_exists());
}

#[test]
fn test_toml_config_partial_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/dccn"
port = 8080

[notifications]
submission_status_submit = false
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/dccn")));
    assert_eq!(config.port, Some(8080));
    assert_eq!(config.logging, LoggingConfig::default());
    assert!(config.notifications.submission_status_review);
    assert!(!config.notifications.submission_status_submit);
}

#[test]
fn test_listen_port_priority() {
    let config = TomlConfig {
        port: Some(8080),
        ..Default::default()
    };
    assert_eq!(config.listen_port(Some(9000)), 9000);
    assert_eq!(config.listen_port(None), 8080);
    assert_eq!(TomlConfig::default().listen_port(None), DEFAULT_PORT);
}

#[test]
fn test_toml_config_roundtrip() {
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/var/lib/dccn")),
        port: Some(5780),
        logging: LoggingConfig {
            level: "debug".to_string(),
            file: None,
        },
        notifications: NotificationsConfig::default(),
    };

    let text = toml::to_string(&config).unwrap();
    let parsed: TomlConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(matches!(err, dccn_common::Error::Config(_)));
}
