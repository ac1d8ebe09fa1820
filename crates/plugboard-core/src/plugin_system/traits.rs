use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::event::topic::PLUGIN_NAMESPACE;
use crate::event::{Event, EventBus, EventPayload, Topic};
use crate::storage::PluginOptions;

/// Lifecycle hooks a plugin may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Runs on `plug`, receiving the merged options
    Initializer,
    /// Runs on `unplug` and when a plugin is replaced
    Destructor,
}

impl Hook {
    /// Outcome segment used in success topics
    pub fn as_str(&self) -> &'static str {
        match self {
            Hook::Initializer => "initializer",
            Hook::Destructor => "destructor",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type hooks report failures with
pub type HookError = Box<dyn StdError + Send + Sync>;

/// Completion of a single hook invocation
pub type HookResult = std::result::Result<(), HookError>;

/// What a hook gets to see of the application while it runs
#[derive(Clone)]
pub struct PluginContext {
    name: String,
    events: Arc<dyn EventBus>,
}

impl PluginContext {
    pub fn new(name: impl Into<String>, events: Arc<dyn EventBus>) -> Self {
        Self {
            name: name.into(),
            events,
        }
    }

    /// Name the plugin is registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> &Arc<dyn EventBus> {
        &self.events
    }

    /// Emit a plugin-defined event under `plugin:<name>:<segments...>`
    pub fn emit<I, S>(&self, segments: I, payload: EventPayload) -> impl Future<Output = usize> + Send + '_
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let topic = Topic::new([PLUGIN_NAMESPACE, self.name.as_str()]).join(segments);
        self.events.emit(Event::new(topic, payload))
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// `initializer` hook slot
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn initialize(&self, ctx: &PluginContext, options: &PluginOptions) -> HookResult;
}

/// `destructor` hook slot
#[async_trait]
pub trait Destructor: Send + Sync {
    async fn destroy(&self, ctx: &PluginContext) -> HookResult;
}

/// Core trait that all plugins must implement.
///
/// Both hooks are optional. A plugin opts into one by returning `Some(self)`
/// from the matching slot and implementing [`Initializer`] or [`Destructor`];
/// the registry checks the slot before calling and treats an empty slot as
/// an immediate success.
///
/// ```ignore
/// struct Cache;
///
/// impl Plugin for Cache {
///     fn name(&self) -> &str { "cache" }
///     fn initializer(&self) -> Option<&dyn Initializer> { Some(self) }
/// }
///
/// #[async_trait]
/// impl Initializer for Cache {
///     async fn initialize(&self, _ctx: &PluginContext, options: &PluginOptions) -> HookResult {
///         let size: u64 = options.get_or("size", 64);
///         log::info!("cache sized {}", size);
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// The name of the plugin. Must be non-empty to be registered.
    fn name(&self) -> &str;

    fn initializer(&self) -> Option<&dyn Initializer> {
        None
    }

    fn destructor(&self) -> Option<&dyn Destructor> {
        None
    }

    /// Whether the given hook slot is filled
    fn provides(&self, hook: Hook) -> bool {
        match hook {
            Hook::Initializer => self.initializer().is_some(),
            Hook::Destructor => self.destructor().is_some(),
        }
    }
}
