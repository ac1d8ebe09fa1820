use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::event::{create_dispatcher, Event, EventBus, Topic};
use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::plugin_system::{Hook, LifecycleError, Plugin, PluginContext, PluginRegistry};
use crate::storage::{AppConfig, PluginOptions};

type LifecycleResult = std::result::Result<(), LifecycleError>;

tokio::task_local! {
    /// Names whose lifecycle lock the current task holds
    static HELD_NAMES: HashSet<String>;
}

/// The plugin container.
///
/// Cloning yields another handle to the same registry and event bus.
/// Lifecycle calls on one name run one at a time; calls on different names
/// do not wait for each other.
#[derive(Clone)]
pub struct Application {
    registry: Arc<Mutex<PluginRegistry>>,
    events: Arc<dyn EventBus>,
    name_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Application {
    /// Creates an application seeded with `config`, using the default event dispatcher.
    pub fn new(config: AppConfig) -> Self {
        Self::with_event_bus(config, Arc::new(create_dispatcher()))
    }

    /// Creates an application that announces lifecycle outcomes on `events`.
    pub fn with_event_bus(config: AppConfig, events: Arc<dyn EventBus>) -> Self {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        Self {
            registry: Arc::new(Mutex::new(PluginRegistry::new(config))),
            events,
            name_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates an application seeded from a JSON, YAML or TOML file.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = AppConfig::from_path(path)?;
        Ok(Self::new(config))
    }

    /// The bus lifecycle events are emitted on
    pub fn events(&self) -> &Arc<dyn EventBus> {
        &self.events
    }

    /// Plug a plugin with no call-site options.
    pub async fn plug<P: Plugin + 'static>(&self, plugin: P) -> LifecycleResult {
        self.plug_shared(Arc::new(plugin), PluginOptions::new()).await
    }

    /// Plug a plugin, overlaying `options` onto its stored configuration.
    pub async fn plug_with_options<P: Plugin + 'static>(&self, plugin: P, options: PluginOptions) -> LifecycleResult {
        self.plug_shared(Arc::new(plugin), options).await
    }

    /// Register `plugin` under its name and run its initializer.
    ///
    /// A plugin already registered under the same name has its destructor run
    /// first; that outcome is reported on the event bus only. The stored
    /// configuration for the name accumulates across calls.
    pub async fn plug_shared(&self, plugin: Arc<dyn Plugin>, options: PluginOptions) -> LifecycleResult {
        let name = plugin.name().to_string();
        if name.is_empty() {
            return self.fail(&name, LifecycleError::MissingName).await;
        }

        let outcome = self
            .with_name_lock(&name, async {
                let previous = self.registry.lock().await.get(&name);
                if let Some(previous) = previous {
                    log::info!("Replacing plugin '{}'", name);
                    let replaced = self.run_hook(&name, Some(previous), Hook::Destructor, None).await;
                    if let Err(e) = self.announce(&name, Hook::Destructor, replaced).await {
                        log::warn!("Destructor of replaced plugin '{}' failed: {}", name, e);
                    }
                }

                let merged = {
                    let mut registry = self.registry.lock().await;
                    registry.insert(Arc::clone(&plugin));
                    registry.merge_options(&name, &options)
                };
                log::info!("Plugged '{}'", name);

                self.run_hook(&name, Some(plugin), Hook::Initializer, Some(&merged)).await
            })
            .await;

        self.announce(&name, Hook::Initializer, outcome).await
    }

    /// Run the destructor of the plugin registered under `name`, then remove it.
    ///
    /// The plugin is still registered while its destructor runs and is gone
    /// by the time the outcome is announced, whatever the destructor
    /// reported. The stored configuration for the name is kept for a later
    /// `plug`.
    pub async fn unplug(&self, name: &str) -> LifecycleResult {
        let outcome = self
            .with_name_lock(name, async {
                let current = self.registry.lock().await.get(name);
                let result = self.run_hook(name, current.clone(), Hook::Destructor, None).await;
                if let Some(plugin) = current {
                    if self.registry.lock().await.remove(name, &plugin) {
                        log::info!("Unplugged '{}'", name);
                    }
                }
                result
            })
            .await;

        self.announce(name, Hook::Destructor, outcome).await
    }

    /// Unplug every plugin, most recently plugged first. Returns the errors
    /// encountered along the way.
    pub async fn shutdown(&self) -> Vec<LifecycleError> {
        let names = self.registry.lock().await.names();
        log::info!("Shutting down {} plugin(s)", names.len());

        let mut errors = Vec::new();
        for name in names.iter().rev() {
            if let Err(e) = self.unplug(name).await {
                errors.push(e);
            }
        }
        errors
    }

    pub async fn is_plugged(&self, name: &str) -> bool {
        self.registry.lock().await.contains(name)
    }

    /// The plugin currently registered under `name`
    pub async fn plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.registry.lock().await.get(name)
    }

    /// Registered plugin names, oldest plug first
    pub async fn plugin_names(&self) -> Vec<String> {
        self.registry.lock().await.names()
    }

    /// Snapshot of the configuration stored for `name`
    pub async fn options(&self, name: &str) -> Option<PluginOptions> {
        self.registry.lock().await.options(name).cloned()
    }

    /// Run one hook of a looked-up plugin.
    ///
    /// `None` means the name is not registered. An empty hook slot counts as
    /// success.
    async fn run_hook(
        &self,
        name: &str,
        plugin: Option<Arc<dyn Plugin>>,
        hook: Hook,
        options: Option<&PluginOptions>,
    ) -> LifecycleResult {
        let Some(plugin) = plugin else {
            return Err(LifecycleError::UnknownPlugin { name: name.to_string() });
        };

        let ctx = PluginContext::new(name, Arc::clone(&self.events));
        let outcome = match hook {
            Hook::Initializer => match plugin.initializer() {
                Some(initializer) => {
                    log::debug!("Calling initializer of '{}'", name);
                    let empty = PluginOptions::new();
                    initializer.initialize(&ctx, options.unwrap_or(&empty)).await
                }
                None => Ok(()),
            },
            Hook::Destructor => match plugin.destructor() {
                Some(destructor) => {
                    log::debug!("Calling destructor of '{}'", name);
                    destructor.destroy(&ctx).await
                }
                None => Ok(()),
            },
        };

        outcome.map_err(|source| LifecycleError::Hook {
            plugin: name.to_string(),
            hook,
            source: Arc::from(source),
        })
    }

    /// Emit `plugin:<name>:<hook>` on success or `plugin:<name>:error` on
    /// failure, and hand the outcome back
    async fn announce(&self, name: &str, hook: Hook, outcome: LifecycleResult) -> LifecycleResult {
        match outcome {
            Ok(()) => {
                self.events.emit(Event::signal(Topic::plugin(name, hook.as_str()))).await;
                Ok(())
            }
            Err(error) => self.fail(name, error).await,
        }
    }

    /// Emit `error` on `plugin:<name>:error` and hand it back for the caller
    async fn fail(&self, name: &str, error: LifecycleError) -> LifecycleResult {
        log::warn!("Plugin '{}': {}", if name.is_empty() { "<anonymous>" } else { name }, error);
        self.events
            .emit(Event::error(Topic::plugin_error(name), error.clone()))
            .await;
        Err(error)
    }

    /// Run `body` holding the lifecycle lock of `name`.
    ///
    /// Calls made from inside `body` on the same task (a hook plugging or
    /// unplugging its own name, a subscriber reacting to a mid-call event)
    /// already own the lock and run straight through.
    async fn with_name_lock<F, T>(&self, name: &str, body: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut held = HELD_NAMES.try_with(|names| names.clone()).unwrap_or_default();
        if held.contains(name) {
            return body.await;
        }

        let guard = self.lock_name(name).await;
        held.insert(name.to_string());
        let output = HELD_NAMES.scope(held, body).await;
        drop(guard);
        self.release_name(name).await;
        output
    }

    async fn lock_name(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.name_locks.lock().await;
            Arc::clone(locks.entry(name.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the lock entry for `name` once nobody holds or waits on it
    async fn release_name(&self, name: &str) {
        let mut locks = self.name_locks.lock().await;
        if locks.get(name).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(name);
        }
    }

    #[cfg(test)]
    pub(crate) async fn name_lock_count(&self) -> usize {
        self.name_locks.lock().await.len()
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
