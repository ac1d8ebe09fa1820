//! # Plugboard Core Event System
//!
//! Namespaced publish/subscribe channel used to announce plugin lifecycle
//! outcomes. Event names are [`Topic`]s made of delimiter-joined segments
//! (`plugin:<name>:<outcome>`); subscribers register a [`TopicPattern`] in
//! which any segment may be a wildcard.
//!
//! - **[`topic`]**: topics, patterns and wildcard matching.
//! - **[`dispatcher`]**: the default [`EventBus`] implementation
//!   ([`SharedEventDispatcher`]).
//! - **[`error`]**: [`EventSystemError`](error::EventSystemError).
pub mod dispatcher;
pub mod error;
pub mod topic;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

/// Type for subscription identifiers
pub type EventId = u64;

/// Result of event processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was processed successfully and propagation should continue
    Continue,
    /// Event was processed and propagation should stop
    Stop,
}

/// Data carried by an event
#[derive(Debug, Clone, Default)]
pub enum EventPayload {
    /// No payload (lifecycle success events)
    #[default]
    Empty,
    /// An error, as delivered on `...:error` topics
    Error(Arc<dyn StdError + Send + Sync>),
    /// Arbitrary structured data, used by plugin-defined events
    Data(serde_json::Value),
}

/// A single emission on the bus
#[derive(Debug, Clone)]
pub struct Event {
    pub topic: Topic,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(topic: Topic, payload: EventPayload) -> Self {
        Self { topic, payload }
    }

    /// Event without payload
    pub fn signal(topic: Topic) -> Self {
        Self::new(topic, EventPayload::Empty)
    }

    /// Event carrying an error
    pub fn error<E>(topic: Topic, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(topic, EventPayload::Error(Arc::new(error)))
    }

    /// The error payload, if any
    pub fn error_payload(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match &self.payload {
            EventPayload::Error(error) => Some(error.as_ref()),
            _ => None,
        }
    }

    /// The error payload downcast to a concrete type
    pub fn error_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.error_payload().and_then(|error| error.downcast_ref::<E>())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            EventPayload::Empty => write!(f, "{}", self.topic),
            EventPayload::Error(error) => write!(f, "{}: {}", self.topic, error),
            EventPayload::Data(value) => write!(f, "{} {}", self.topic, value),
        }
    }
}

/// Asynchronous event handler trait
#[async_trait]
pub trait AsyncEventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> EventResult;
}

/// Event handler type alias
pub type EventHandler = Box<dyn AsyncEventHandler>;

/// Topic-based publish/subscribe abstraction consumed by the application.
///
/// Implementations decide how wildcard matching and handler ordering work;
/// the application only builds topics and payloads.
#[async_trait]
pub trait EventBus: Send + Sync + fmt::Debug {
    /// Register a handler for every event matching `pattern`
    async fn subscribe(&self, pattern: TopicPattern, handler: HandlerFn) -> EventId;

    /// Register a handler removed after the first matching event
    async fn once(&self, pattern: TopicPattern, handler: HandlerFn) -> EventId;

    /// Remove a subscription, returning whether it existed
    async fn unsubscribe(&self, id: EventId) -> bool;

    /// Deliver an event, returning how many handlers ran
    async fn emit(&self, event: Event) -> usize;
}

/// Re-export important types
pub use dispatcher::{
    async_event_handler, create_dispatcher, sync_event_handler, BoxFuture, EventDispatcher, HandlerFn,
    SharedEventDispatcher,
};
pub use topic::{PatternSegment, Topic, TopicPattern};

// Test module declaration
#[cfg(test)]
mod tests;
