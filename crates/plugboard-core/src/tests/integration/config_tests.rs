#![cfg(test)]

use std::io::Write;

use tempfile::{Builder, NamedTempFile};

use crate::kernel::bootstrap::Application;
use crate::kernel::error::Error;
use crate::storage::{PluginOptions, StorageSystemError};

use super::common::{tracker, TrackedPlugin};

fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[cfg(feature = "toml-config")]
#[tokio::test]
async fn test_toml_config_reaches_initializer() {
    let file = config_file(
        ".toml",
        r#"
[cache]
size = 64
eviction = "lru"

[metrics]
enabled = false
"#,
    );
    let app = Application::from_config_file(file.path()).unwrap();

    let log = tracker();
    let plugin = TrackedPlugin::new("cache", "cache", &log);
    let seen = plugin.seen_options();
    app.plug_with_options(plugin, PluginOptions::new().with("size", 128))
        .await
        .unwrap();

    let seen = seen.lock().unwrap().clone().expect("initializer called");
    assert_eq!(seen.get::<u64>("size"), Some(128));
    assert_eq!(seen.get::<String>("eviction").as_deref(), Some("lru"));
    assert_eq!(app.options("metrics").await.and_then(|o| o.get::<bool>("enabled")), Some(false));
}

#[cfg(feature = "yaml-config")]
#[tokio::test]
async fn test_yaml_config_seeds_options() {
    let file = config_file(
        ".yml",
        "cache:\n  size: 8\n  tags: [hot, warm]\n",
    );
    let app = Application::from_config_file(file.path()).unwrap();

    let options = app.options("cache").await.unwrap();
    assert_eq!(options.get::<u64>("size"), Some(8));
    assert_eq!(options.get::<Vec<String>>("tags"), Some(vec!["hot".to_string(), "warm".to_string()]));
}

#[tokio::test]
async fn test_nested_values_are_replaced_wholesale() {
    let file = config_file(".json", r#"{"cache": {"limits": {"soft": 1, "hard": 2}}}"#);
    let app = Application::from_config_file(file.path()).unwrap();

    let log = tracker();
    app.plug_with_options(
        TrackedPlugin::new("cache", "cache", &log),
        PluginOptions::new().with("limits", serde_json::json!({"soft": 5})),
    )
    .await
    .unwrap();

    let limits = app.options("cache").await.unwrap().get_value("limits").cloned();
    assert_eq!(limits, Some(serde_json::json!({"soft": 5})));
}

#[test]
fn test_malformed_config_file() {
    let file = config_file(".json", "{ not json");
    let err = Application::from_config_file(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::StorageSystem(StorageSystemError::DeserializationError { ref format, .. }) if format == "json"
    ));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Application::from_config_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::StorageSystem(StorageSystemError::Io { .. })));
    assert!(err.to_string().contains("absent.json"));
}
