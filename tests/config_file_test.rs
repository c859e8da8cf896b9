// Integration test for configuration file support

use devlogs::config::Config;
use devlogs::delivery::SocketDelivery;
use devlogs::error::LogsError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_load_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devlogs.toml");

    let toml_content = r#"
        socket_path = "/run/devlogs/delivery.sock"
        subscription_buffer = 64
        log_level = "devlogs=debug"
    "#;

    fs::write(&config_path, toml_content).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.socket_path, PathBuf::from("/run/devlogs/delivery.sock"));
    assert_eq!(config.subscription_buffer, 64);
    assert_eq!(config.log_level, "devlogs=debug");
}

#[test]
fn test_load_json_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devlogs.json");

    let json_content = r#"{
        "socket_path": "/tmp/json-devlogs.sock",
        "subscription_buffer": 16
    }"#;

    fs::write(&config_path, json_content).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.socket_path, PathBuf::from("/tmp/json-devlogs.sock"));
    assert_eq!(config.subscription_buffer, 16);
    assert_eq!(config.log_level, "warn");

    let client = SocketDelivery::from_config(&config);
    assert_eq!(client.socket_path(), Path::new("/tmp/json-devlogs.sock"));
}

#[test]
fn test_env_var_expansion_in_socket_path() {
    std::env::set_var("DEVLOGS_IT_SOCKET_DIR", "/var/run/devlogs-it");

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devlogs.toml");
    fs::write(
        &config_path,
        "socket_path = \"${DEVLOGS_IT_SOCKET_DIR}/delivery.sock\"\n",
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(
        config.socket_path,
        PathBuf::from("/var/run/devlogs-it/delivery.sock")
    );
}

#[test]
fn test_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devlogs.yaml");
    fs::write(&config_path, "socket_path: /tmp/x.sock\n").unwrap();

    assert!(matches!(
        Config::from_file(&config_path),
        Err(LogsError::InvalidConfig(_))
    ));
}

#[test]
fn test_malformed_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devlogs.toml");
    fs::write(&config_path, "subscription_buffer = \"lots\"\n").unwrap();

    assert!(matches!(
        Config::from_file(&config_path),
        Err(LogsError::InvalidConfig(_))
    ));
}

#[test]
fn test_invalid_buffer_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("devlogs.toml");
    fs::write(&config_path, "subscription_buffer = 0\n").unwrap();

    assert!(matches!(
        Config::from_file(&config_path),
        Err(LogsError::ConfigValidation(_))
    ));
}

#[test]
fn test_missing_file() {
    let result = Config::from_file(Path::new("/nonexistent/devlogs.toml"));
    assert!(matches!(result, Err(LogsError::ConfigError(_))));
}
