use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex}; // Use tokio's Mutex

use crate::event::{AsyncEventHandler, Event, EventBus, EventId, EventResult, Topic, TopicPattern};

// This type represents an owned future that returns EventResult
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = EventResult> + Send + 'a>>;

/// Boxed handler closure accepted by [`EventBus::subscribe`]
pub type HandlerFn = Box<dyn for<'a> Fn(&'a Event) -> BoxFuture<'a> + Send + Sync>;

//--------------------------------------------------
// EventDispatcher (Internal, wrapped by SharedEventDispatcher)
//--------------------------------------------------

struct Subscription {
    id: EventId,
    pattern: TopicPattern,
    handler: Arc<dyn AsyncEventHandler>,
    once: bool,
}

/// Subscription table with wildcard lookup (Internal Implementation)
pub struct EventDispatcher {
    subscriptions: Vec<Subscription>,
    next_handler_id: EventId,
}

// Manual Debug implementation for EventDispatcher
impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<String> = self.subscriptions.iter().map(|s| s.pattern.to_string()).collect();
        f.debug_struct("EventDispatcher")
            .field("patterns", &patterns)
            .field("next_handler_id", &self.next_handler_id)
            .finish()
    }
}

/// Simple handler wrapping a boxed closure (Internal Helper)
struct SimpleHandler {
    handler: HandlerFn,
}

#[async_trait]
impl AsyncEventHandler for SimpleHandler {
    async fn handle(&self, event: &Event) -> EventResult {
        (self.handler)(event).await
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_handler_id: 1,
        }
    }

    pub fn register_handler(&mut self, pattern: TopicPattern, handler: HandlerFn, once: bool) -> EventId {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        self.subscriptions.push(Subscription {
            id,
            pattern,
            handler: Arc::new(SimpleHandler { handler }),
            once,
        });
        id
    }

    pub fn unregister_handler(&mut self, id: EventId) -> bool {
        let len_before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() < len_before
    }

    /// Collect handlers matching `topic` in subscription order.
    /// One-shot subscriptions that match are removed.
    pub fn take_matching(&mut self, topic: &Topic) -> Vec<Arc<dyn AsyncEventHandler>> {
        let mut matched = Vec::new();
        self.subscriptions.retain(|s| {
            if !s.pattern.matches(topic) {
                return true;
            }
            matched.push(Arc::clone(&s.handler));
            !s.once
        });
        matched
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------
// SharedEventDispatcher (Public API)
//--------------------------------------------------

/// Thread-safe shared event dispatcher using Tokio Mutex.
///
/// The lock is held only while the subscription table is read or changed;
/// handlers run after it is released, so they may subscribe or emit.
#[derive(Clone)]
pub struct SharedEventDispatcher {
    dispatcher: Arc<Mutex<EventDispatcher>>,
}

impl fmt::Debug for SharedEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEventDispatcher").finish_non_exhaustive()
    }
}

impl SharedEventDispatcher {
    pub fn new() -> Self {
        Self {
            dispatcher: Arc::new(Mutex::new(EventDispatcher::new())),
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.dispatcher.lock().await.subscriber_count()
    }

    /// Resolve with the next event matching `pattern`
    pub async fn listen_once(&self, pattern: TopicPattern) -> oneshot::Receiver<Event> {
        let (tx, rx) = oneshot::channel();
        let slot = StdMutex::new(Some(tx));
        let handler = sync_event_handler(move |event| {
            if let Some(tx) = slot.lock().ok().and_then(|mut s| s.take()) {
                let _ = tx.send(event.clone());
            }
            EventResult::Continue
        });
        self.once(pattern, handler).await;
        rx
    }
}

impl Default for SharedEventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for SharedEventDispatcher {
    async fn subscribe(&self, pattern: TopicPattern, handler: HandlerFn) -> EventId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.register_handler(pattern, handler, false)
    }

    async fn once(&self, pattern: TopicPattern, handler: HandlerFn) -> EventId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.register_handler(pattern, handler, true)
    }

    async fn unsubscribe(&self, id: EventId) -> bool {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.unregister_handler(id)
    }

    async fn emit(&self, event: Event) -> usize {
        let handlers = {
            let mut dispatcher = self.dispatcher.lock().await;
            dispatcher.take_matching(&event.topic)
        };
        log::trace!("Emitting '{}' to {} handler(s)", event.topic, handlers.len());

        let mut invoked = 0;
        for handler in handlers {
            invoked += 1;
            if handler.handle(&event).await == EventResult::Stop {
                break;
            }
        }
        invoked
    }
}

//--------------------------------------------------
// Helper Functions
//--------------------------------------------------

/// Create a new event dispatcher instance
pub fn create_dispatcher() -> SharedEventDispatcher {
    SharedEventDispatcher::new()
}

/// Box an async handler closure, pinning down its higher-ranked signature
pub fn async_event_handler<F>(f: F) -> HandlerFn
where
    F: for<'a> Fn(&'a Event) -> BoxFuture<'a> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Helper function to create synchronous handlers that are compatible with async system
pub fn sync_event_handler<F>(f: F) -> HandlerFn
where
    F: Fn(&Event) -> EventResult + Send + Sync + 'static,
{
    async_event_handler(move |event| {
        let result = f(event);
        Box::pin(async move { result })
    })
}
