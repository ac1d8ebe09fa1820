//! Command-line plumbing: the table of plugins compiled into the binary and
//! `--set NAME.KEY=VALUE` option overrides.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use core_logging::LoggingPlugin;
use plugboard_core::plugin_system::Plugin;
use plugboard_core::storage::PluginOptions;
use serde_json::Value;

/// A plugin the binary can plug by name
pub struct BuiltinPlugin {
    pub name: &'static str,
    pub description: &'static str,
    factory: fn() -> Arc<dyn Plugin>,
}

impl BuiltinPlugin {
    /// A fresh instance, ready to be plugged
    pub fn create(&self) -> Arc<dyn Plugin> {
        (self.factory)()
    }
}

impl fmt::Debug for BuiltinPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinPlugin").field("name", &self.name).finish_non_exhaustive()
    }
}

fn logging_plugin() -> Arc<dyn Plugin> {
    Arc::new(LoggingPlugin::new())
}

/// Plugins compiled into the binary, in the order `run` plugs them
pub const BUILTIN_PLUGINS: &[BuiltinPlugin] = &[BuiltinPlugin {
    name: core_logging::PLUGIN_NAME,
    description: "Installs the tracing subscriber (options: level, format)",
    factory: logging_plugin,
}];

pub fn find_builtin(name: &str) -> Option<&'static BuiltinPlugin> {
    BUILTIN_PLUGINS.iter().find(|plugin| plugin.name == name)
}

/// One `--set NAME.KEY=VALUE` argument.
///
/// `VALUE` is read as JSON when it parses as such (`8`, `true`, `[1,2]`) and
/// kept as a plain string otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionOverride {
    pub plugin: String,
    pub key: String,
    pub value: Value,
}

impl FromStr for OptionOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME.KEY=VALUE, got '{}'", s))?;
        let (plugin, key) = target
            .split_once('.')
            .ok_or_else(|| format!("expected NAME.KEY before '=', got '{}'", target))?;
        if plugin.is_empty() || key.is_empty() {
            return Err(format!("plugin name and key must not be empty in '{}'", s));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(Self {
            plugin: plugin.to_string(),
            key: key.to_string(),
            value,
        })
    }
}

/// Collect the overrides aimed at `plugin`, later ones winning
pub fn options_for(overrides: &[OptionOverride], plugin: &str) -> PluginOptions {
    overrides
        .iter()
        .filter(|o| o.plugin == plugin)
        .map(|o| (o.key.clone(), o.value.clone()))
        .collect()
}
