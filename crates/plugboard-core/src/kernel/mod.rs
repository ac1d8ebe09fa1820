//! # Plugboard Core Kernel
//!
//! The `kernel` module holds the [`Application`](bootstrap::Application), the
//! container plugins are plugged into and unplugged from, together with
//! system-wide constants and the crate-level error type.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Plugin lifecycle**: [`Application`](bootstrap::Application) resolves
//!   names, merges per-plugin options, runs hooks and announces every outcome
//!   on the event bus.
//! - **Core Constants**: the `constants` submodule.
//! - **Error Handling**: [`Error`](error::Error) and the `Result` alias in
//!   the `error` submodule.
pub mod bootstrap;
pub mod constants;
pub mod error;

pub use bootstrap::Application;
pub use error::{Error, Result};
