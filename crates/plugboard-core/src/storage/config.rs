use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::error::StorageSystemError;

type Result<T> = std::result::Result<T, StorageSystemError>;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Configuration of a single plugin: option key to JSON value.
///
/// Merging is shallow. A key present in the incoming map replaces the stored
/// value wholesale, nested objects included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginOptions {
    values: HashMap<String, Value>,
}

impl PluginOptions {
    /// Create a new empty option map
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get an option value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get an option value with default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// The raw JSON value stored under `key`
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set an option value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| StorageSystemError::SerializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })?;
        self.values.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Check if key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get all keys
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge with other options, overriding existing values
    pub fn merge(&mut self, other: &PluginOptions) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PluginOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Application-wide configuration: plugin name to its seed options.
///
/// On disk this is a map of tables, one per plugin:
///
/// ```toml
/// [core-logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppConfig {
    plugins: HashMap<String, PluginOptions>,
}

impl AppConfig {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Builder-style insert of a plugin's seed options
    pub fn with_plugin(mut self, name: impl Into<String>, options: PluginOptions) -> Self {
        self.plugins.insert(name.into(), options);
        self
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginOptions> {
        self.plugins.get(name)
    }

    /// Seed options for `name`, created empty when absent
    pub fn plugin_mut(&mut self, name: &str) -> &mut PluginOptions {
        self.plugins.entry(name.to_string()).or_default()
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.keys().cloned().collect()
    }

    /// Consume into the underlying map
    pub fn into_plugins(self) -> HashMap<String, PluginOptions> {
        self.plugins
    }

    /// Load from a file, picking the format from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| StorageSystemError::UnsupportedConfigFormat(path.display().to_string()))?;
        let data = fs::read_to_string(path)
            .map_err(|e| StorageSystemError::io(e, "read_config", path.to_path_buf()))?;
        log::debug!("Loaded configuration from {} ({:?})", path.display(), format);
        Self::deserialize(&data, format)
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String> {
        let serialization_error = |source: Box<dyn std::error::Error + Send + Sync>| {
            StorageSystemError::SerializationError {
                format: format.extension().to_string(),
                source,
            }
        };
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(&self).map_err(|e| serialization_error(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(&self).map_err(|e| serialization_error(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(&self).map_err(|e| serialization_error(Box::new(e))),
        }
    }

    /// Deserialize from string based on format
    pub fn deserialize(data: &str, format: ConfigFormat) -> Result<Self> {
        let deserialization_error = |source: Box<dyn std::error::Error + Send + Sync>| {
            StorageSystemError::DeserializationError {
                format: format.extension().to_string(),
                source,
            }
        };
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| deserialization_error(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| deserialization_error(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| deserialization_error(Box::new(e))),
        }
    }
}

impl From<HashMap<String, PluginOptions>> for AppConfig {
    fn from(plugins: HashMap<String, PluginOptions>) -> Self {
        Self { plugins }
    }
}
