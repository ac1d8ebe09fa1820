//! # Core Logging Plugin
//!
//! Installs the process-wide `tracing` subscriber when plugged and bridges
//! records from the `log` facade (used throughout `plugboard-core`) into it.
//!
//! Options:
//!
//! - `level`: an `EnvFilter` directive, `"info"` by default. `RUST_LOG`
//!   takes precedence when set.
//! - `format`: `"text"` (default) or `"json"`.
//!
//! Output goes to stderr. Only the first install in a process takes effect;
//! later initializers log that a subscriber is already present and succeed.
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use plugboard_core::plugin_system::{HookError, HookResult, Initializer, Plugin, PluginContext};
use plugboard_core::storage::PluginOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

pub const PLUGIN_NAME: &str = "core-logging";
pub const DEFAULT_LEVEL: &str = "info";

/// Line format of emitted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format '{}', expected 'text' or 'json'", other).into()),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Settings read from the plugin's options
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingSettings {
    pub fn from_options(options: &PluginOptions) -> Result<Self, HookError> {
        let level = options.get_or::<String>("level", DEFAULT_LEVEL.to_string());
        let format = match options.get::<String>("format") {
            Some(format) => format.parse()?,
            None => LogFormat::default(),
        };
        Ok(Self { level, format })
    }

    /// `RUST_LOG` if set and valid, the configured level otherwise
    pub fn filter(&self) -> Result<EnvFilter, HookError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level)
                .map_err(|e| format!("Invalid log level '{}': {}", self.level, e).into()),
        }
    }
}

/// Install the global subscriber. Returns `false` when one was already set.
pub fn install(settings: &LoggingSettings) -> Result<bool, HookError> {
    let filter = settings.filter()?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = match settings.format {
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(tracing_fmt::layer().with_target(false).with_writer(std::io::stderr)),
        ),
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(tracing_fmt::layer().json().with_writer(std::io::stderr)))
        }
    };
    if result.is_err() {
        log::debug!("A global tracing subscriber is already installed, keeping it");
        return Ok(false);
    }

    // Some other `log` backend may own the facade already
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("log facade not bridged: {}", e);
    }
    Ok(true)
}

/// Plugin that sets up application logging on initialize
#[derive(Debug, Default)]
pub struct LoggingPlugin;

impl LoggingPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for LoggingPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn initializer(&self) -> Option<&dyn Initializer> {
        Some(self)
    }
}

#[async_trait]
impl Initializer for LoggingPlugin {
    async fn initialize(&self, ctx: &PluginContext, options: &PluginOptions) -> HookResult {
        let settings = LoggingSettings::from_options(options)?;
        if install(&settings)? {
            tracing::info!(
                plugin = ctx.name(),
                level = %settings.level,
                format = %settings.format,
                "Logging initialized"
            );
        }
        Ok(())
    }
}
