use std::collections::VecDeque;

use crate::constants::EVENT_QUEUE_CAPACITY;
use crate::window::PopupId;

/// Lifecycle notifications published by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupEvent {
    Opened(PopupId),
    Closed(PopupId),
}

impl PopupEvent {
    pub fn popup_id(&self) -> &PopupId {
        match self {
            PopupEvent::Opened(id) | PopupEvent::Closed(id) => id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PopupEvent::Opened(_) => "popup:opened",
            PopupEvent::Closed(_) => "popup:closed",
        }
    }
}

pub type EventListener = Box<dyn FnMut(&PopupEvent)>;

/// Fan-out to subscribed listeners plus a bounded queue the host can drain.
pub struct EventBus {
    listeners: Vec<EventListener>,
    queue: VecDeque<PopupEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(EVENT_QUEUE_CAPACITY)
    }
}

impl EventBus {
    /// Keeps at most `capacity` undrained events, dropping the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            listeners: Vec::new(),
            queue: VecDeque::new(),
            capacity,
        }
    }

    pub fn subscribe(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    pub fn dispatch(&mut self, event: PopupEvent) {
        tracing::trace!(event = event.name(), popup = %event.popup_id(), "dispatch");
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
        if self.capacity == 0 {
            return;
        }
        while self.queue.len() >= self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }

    /// Drains the newest events published since the last call.
    pub fn take(&mut self) -> Vec<PopupEvent> {
        self.queue.drain(..).collect()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("queue", &self.queue)
            .field("capacity", &self.capacity)
            .finish()
    }
}
