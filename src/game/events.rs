use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::orientation::{LookOutcome, LookTaskId};

/// Events emitted by a locomotion agent for animation/audio/UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LocomotionEvent {
    Jump,
    Land,
    StartMove,
    StopMove,
    LookFinished { task: LookTaskId, outcome: LookOutcome },
}

/// Receives locomotion events while subscribed to an [`EventBus`].
pub trait EventObserver {
    fn on_event(&mut self, event: &LocomotionEvent);
}

impl<F> EventObserver for F
where
    F: FnMut(&LocomotionEvent),
{
    fn on_event(&mut self, event: &LocomotionEvent) {
        self(event)
    }
}

/// Handle returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

struct ObserverEntry {
    id: u64,
    observer: Box<dyn EventObserver>,
}

/// Ordered multicast of locomotion events to subscribed observers.
pub struct EventBus {
    observers: Vec<ObserverEntry>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn EventObserver>) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push(ObserverEntry { id, observer });
        Subscription(id)
    }

    /// Returns false if the subscription was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.observers.len();
        self.observers.retain(|entry| entry.id != subscription.0);
        self.observers.len() != before
    }

    /// Delivers `event` to observers in subscription order.
    pub fn emit(&mut self, event: &LocomotionEvent) {
        for entry in &mut self.observers {
            entry.observer.on_event(event);
        }
    }
}

/// Shared, cloneable event recorder. Useful for tests and the simulation CLI.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<LocomotionEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LocomotionEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, event: LocomotionEvent) -> usize {
        self.events.borrow().iter().filter(|e| **e == event).count()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<LocomotionEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl EventObserver for EventLog {
    fn on_event(&mut self, event: &LocomotionEvent) {
        self.events.borrow_mut().push(*event);
    }
}
