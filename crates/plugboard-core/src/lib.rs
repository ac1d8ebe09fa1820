//! # Plugboard Core
//!
//! A named-plugin container. Plugins are plugged into an [`Application`]
//! under their name, receive their accumulated configuration when their
//! initializer runs, and are torn down through their destructor on unplug.
//! Every lifecycle outcome is announced on an [`EventBus`] under
//! `plugin:<name>:<outcome>`.
pub mod event;
pub mod kernel;
pub mod plugin_system;
pub mod storage;


// Re-export key public types/traits for easier use by the binary and plugins
pub use event::{Event, EventBus, EventPayload, EventResult, SharedEventDispatcher, Topic, TopicPattern};
pub use kernel::error::Error as KernelError;
pub use kernel::Application;
pub use plugin_system::{Destructor, FnPlugin, Hook, HookResult, Initializer, LifecycleError, Plugin, PluginContext};
pub use storage::{AppConfig, ConfigFormat, PluginOptions};
