//! Typed pub/sub bus between the viewer core and the UI.
//!
//! - `subscribe()` registers a callback run synchronously inside `emit()`
//!   (used for event-changed listeners)
//! - `emit()` also queues the event; the UI loop drains it with `poll()` once
//!   per frame (used for button presses and link clicks)
//!
//! Callbacks for one event type run in subscription order.

use log::warn;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Queue cap; the oldest half is dropped when reached
const MAX_QUEUE_SIZE: usize = 256;

/// Anything `'static + Send + Sync` can travel on the bus.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;
type Subscribers = Arc<RwLock<HashMap<TypeId, Vec<Callback>>>>;
type Queue = Arc<Mutex<Vec<BoxedEvent>>>;

pub type BoxedEvent = Box<dyn Event>;

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Subscribers,
    queue: Queue,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` for every emitted `E`
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        subscribe_to::<E, F>(&self.subscribers, callback);
    }

    pub fn emit<E: Event + Clone>(&self, event: E) {
        emit_to(&self.subscribers, &self.queue, Box::new(event));
    }

    /// Emit an already boxed event (widgets dispatch these)
    pub fn emit_boxed(&self, event: BoxedEvent) {
        emit_to(&self.subscribers, &self.queue, event);
    }

    /// Drain queued events
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Cloneable handle for widgets and the viewer
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            subscribers: Arc::clone(&self.subscribers),
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Emit-only handle sharing the bus's subscribers and queue
#[derive(Clone)]
pub struct EventEmitter {
    subscribers: Subscribers,
    queue: Queue,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("queue_len", &self.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

impl EventEmitter {
    pub fn emit<E: Event + Clone>(&self, event: E) {
        emit_to(&self.subscribers, &self.queue, Box::new(event));
    }

    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        subscribe_to::<E, F>(&self.subscribers, callback);
    }
}

fn subscribe_to<E, F>(subscribers: &Subscribers, callback: F)
where
    E: Event,
    F: Fn(&E) + Send + Sync + 'static,
{
    let wrapped: Callback = Arc::new(move |any: &dyn Any| {
        if let Some(event) = any.downcast_ref::<E>() {
            callback(event);
        }
    });
    subscribers
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .entry(TypeId::of::<E>())
        .or_default()
        .push(wrapped);
}

fn emit_to(subscribers: &Subscribers, queue: &Queue, event: BoxedEvent) {
    // through the dyn Event vtable, see downcast_event
    let any = (*event).as_any();
    // Clone the callback list so a callback may subscribe without deadlocking
    let callbacks: Vec<Callback> = subscribers
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&any.type_id())
        .cloned()
        .unwrap_or_default();
    for cb in &callbacks {
        cb(any);
    }

    let mut queue = queue.lock().unwrap_or_else(|e| e.into_inner());
    if queue.len() >= MAX_QUEUE_SIZE {
        let evict = queue.len() / 2;
        warn!("Event queue full ({} events), dropping oldest {}", queue.len(), evict);
        queue.drain(0..evict);
    }
    queue.push(event);
}

/// Downcast a queued event.
///
/// `(**event)` goes through the `dyn Event` vtable; calling `as_any()` on the
/// `Box` itself would hit the blanket impl for `Box<dyn Event>` and never match.
pub fn downcast_event<E: 'static>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}
