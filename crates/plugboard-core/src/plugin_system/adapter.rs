//! Closure-backed plugins.
//!
//! [`FnPlugin`] fills each hook slot with an optional closure, for plugins
//! that do not warrant a type of their own.
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::plugin_system::traits::{Destructor, HookResult, Initializer, Plugin, PluginContext};
use crate::storage::PluginOptions;

/// Owned future returned by hook closures
pub type HookFuture = Pin<Box<dyn Future<Output = HookResult> + Send + 'static>>;

pub type InitializerFn = Box<dyn Fn(PluginContext, PluginOptions) -> HookFuture + Send + Sync>;
pub type DestructorFn = Box<dyn Fn(PluginContext) -> HookFuture + Send + Sync>;

/// Plugin whose hooks are closures
pub struct FnPlugin {
    name: String,
    initializer: Option<InitializerFn>,
    destructor: Option<DestructorFn>,
}

impl FnPlugin {
    /// A plugin with no hooks
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initializer: None,
            destructor: None,
        }
    }

    /// Fill the `initializer` slot
    pub fn on_initialize<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(PluginContext, PluginOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.initializer = Some(Box::new(
            move |ctx: PluginContext, options: PluginOptions| -> HookFuture { Box::pin(f(ctx, options)) },
        ));
        self
    }

    /// Fill the `destructor` slot
    pub fn on_destroy<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(PluginContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.destructor = Some(Box::new(move |ctx: PluginContext| -> HookFuture { Box::pin(f(ctx)) }));
        self
    }
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .field("initializer", &self.initializer.is_some())
            .field("destructor", &self.destructor.is_some())
            .finish()
    }
}

impl Plugin for FnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn initializer(&self) -> Option<&dyn Initializer> {
        self.initializer.as_ref().map(|_| self as &dyn Initializer)
    }

    fn destructor(&self) -> Option<&dyn Destructor> {
        self.destructor.as_ref().map(|_| self as &dyn Destructor)
    }
}

#[async_trait]
impl Initializer for FnPlugin {
    async fn initialize(&self, ctx: &PluginContext, options: &PluginOptions) -> HookResult {
        match &self.initializer {
            Some(f) => f(ctx.clone(), options.clone()).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Destructor for FnPlugin {
    async fn destroy(&self, ctx: &PluginContext) -> HookResult {
        match &self.destructor {
            Some(f) => f(ctx.clone()).await,
            None => Ok(()),
        }
    }
}
