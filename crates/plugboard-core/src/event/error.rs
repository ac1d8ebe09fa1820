//! # Plugboard Core Event System Errors
//!
//! Defines error types specific to the namespaced event channel.
//!
//! Emission itself never fails; the only fallible step is turning a
//! delimiter-joined string into a [`TopicPattern`](crate::event::TopicPattern).
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventSystemError {
    #[error("Invalid topic pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
    },
}
