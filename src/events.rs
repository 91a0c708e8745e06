//! In-process event queue for UI surfaces
//!
//! Mutations and scheduler ticks push events here instead of firing
//! messages at possibly-absent listeners. Events stay queued until a
//! surface drains them, so a panel opened after a notification was
//! emitted still observes it. The queue is bounded; past capacity the
//! oldest event is dropped with a warning.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::ports::ReviewDueNotification;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WordbookEvent {
    /// A word was added, changed, or removed; list views should refresh
    VocabularyChanged,
    /// The scheduler found newly-due words
    ReviewDue(ReviewDueNotification),
}

pub struct EventQueue {
    events: Mutex<VecDeque<WordbookEvent>>,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn push(&self, event: WordbookEvent) {
        let mut events = self.events.lock().unwrap();
        if events.len() >= self.capacity {
            events.pop_front();
            log::warn!("Event queue full, dropping oldest event");
        }
        events.push_back(event);
    }

    /// Take every pending event, oldest first
    pub fn drain(&self) -> Vec<WordbookEvent> {
        let mut events = self.events.lock().unwrap();
        events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
