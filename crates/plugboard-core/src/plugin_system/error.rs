//! # Plugboard Core Plugin System Errors
//!
//! Defines [`LifecycleError`], the error delivered for every failed
//! `plug`/`unplug` call. Each value is delivered twice: as the payload of a
//! `plugin:<name>:error` event and as the operation's own result.
use std::error::Error as StdError;
use std::sync::Arc;

use crate::plugin_system::traits::Hook;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LifecycleError {
    /// The plugin reported an empty name; routed under `anonymous`
    #[error("Name property required.")]
    MissingName,

    /// No plugin is registered under this name
    #[error("No such plugin `{name}`")]
    UnknownPlugin { name: String },

    /// A hook reported failure. Displays the hook's own message unchanged.
    #[error("{source}")]
    Hook {
        plugin: String,
        hook: Hook,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },
}

impl LifecycleError {
    /// Name segment the error is routed under
    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            LifecycleError::MissingName => None,
            LifecycleError::UnknownPlugin { name } => Some(name.as_str()),
            LifecycleError::Hook { plugin, .. } => Some(plugin.as_str()),
        }
    }

    /// The error exactly as the hook returned it
    pub fn hook_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            LifecycleError::Hook { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
