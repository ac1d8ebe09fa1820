use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::plugin_system::traits::Plugin;
use crate::storage::{AppConfig, PluginOptions};

/// A plugged plugin and when it was plugged
struct PluginEntry {
    plugin: Arc<dyn Plugin>,
    sequence: u64,
}

/// Registry state: live plugins by name and the configuration owned for each
/// name.
///
/// Plain synchronous data; the [`Application`](crate::kernel::Application)
/// wraps it in a lock and runs hooks outside of it.
pub struct PluginRegistry {
    /// Registered plugins
    plugins: HashMap<String, PluginEntry>,
    /// Merged configuration per name. Outlives `remove`.
    options: HashMap<String, PluginOptions>,
    next_sequence: u64,
}

impl PluginRegistry {
    /// Create a registry seeded with the application configuration
    pub fn new(config: AppConfig) -> Self {
        Self {
            plugins: HashMap::new(),
            options: config.into_plugins(),
            next_sequence: 0,
        }
    }

    /// Store `plugin` under its name, returning the plugin it replaced
    pub fn insert(&mut self, plugin: Arc<dyn Plugin>) -> Option<Arc<dyn Plugin>> {
        let name = plugin.name().to_string();
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.plugins
            .insert(name, PluginEntry { plugin, sequence })
            .map(|entry| entry.plugin)
    }

    /// Remove `plugin` if it is still the instance registered under `name`.
    /// Configuration for the name is kept.
    pub fn remove(&mut self, name: &str, plugin: &Arc<dyn Plugin>) -> bool {
        match self.plugins.get(name) {
            Some(entry) if Arc::ptr_eq(&entry.plugin, plugin) => {
                self.plugins.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Get a plugin Arc by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(name).map(|entry| Arc::clone(&entry.plugin))
    }

    /// Check if a plugin is registered by name
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Overlay `incoming` onto the stored configuration for `name`, creating
    /// it if absent, and return a snapshot of the result
    pub fn merge_options(&mut self, name: &str, incoming: &PluginOptions) -> PluginOptions {
        let stored = self.options.entry(name.to_string()).or_default();
        stored.merge(incoming);
        stored.clone()
    }

    pub fn options(&self, name: &str) -> Option<&PluginOptions> {
        self.options.get(name)
    }

    /// Names of registered plugins, oldest plug first
    pub fn names(&self) -> Vec<String> {
        let mut entries: Vec<(&String, u64)> = self
            .plugins
            .iter()
            .map(|(name, entry)| (name, entry.sequence))
            .collect();
        entries.sort_by_key(|(_, sequence)| *sequence);
        entries.into_iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .field("configured", &self.options.len())
            .finish()
    }
}
