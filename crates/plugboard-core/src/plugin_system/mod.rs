//! # Plugboard Core Plugin System
//!
//! The plugin contract and the state the application keeps about plugins.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`traits`]**: the [`Plugin`] capability trait with its optional hook
//!   slots ([`Initializer`], [`Destructor`]), the [`Hook`] enum and the
//!   [`PluginContext`] handed to hooks.
//! - **[`adapter`]**: [`FnPlugin`], a plugin assembled from closures.
//! - **[`registry`]**: [`PluginRegistry`], the name-keyed plugin and
//!   configuration maps.
//! - **[`error`]**: [`LifecycleError`], delivered for failed lifecycle calls.
pub mod adapter;
pub mod error;
pub mod registry;
pub mod traits;

pub use adapter::FnPlugin;
pub use error::LifecycleError;
pub use registry::PluginRegistry;
pub use traits::{Destructor, Hook, HookError, HookResult, Initializer, Plugin, PluginContext};
