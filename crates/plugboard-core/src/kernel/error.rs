//! # Plugboard Core Kernel Errors
//!
//! Defines the crate-level [`Error`], aggregating the subsystem errors, and
//! the matching [`Result`] alias.
use std::result::Result as StdResult;

use crate::event::error::EventSystemError;
use crate::plugin_system::error::LifecycleError;
use crate::storage::error::StorageSystemError;
use thiserror::Error as ThisError;

/// Custom error type for the Plugboard application
#[derive(Debug, ThisError)]
pub enum Error {
    /// Plugin lifecycle failure
    #[error("Plugin lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Event system error
    #[error("Event system error: {0}")]
    EventSystem(#[from] EventSystemError),

    /// Specific, typed storage system error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;
