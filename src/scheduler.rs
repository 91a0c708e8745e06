//! Due-review scheduler
//!
//! Scans the word store on a fixed tick, diffs the due set against the
//! persisted notified-id set, and emits at most one aggregated
//! notification per tick — only when words became due since the last
//! notification. Ids that leave the due set (reviewed elsewhere, or the
//! interval moved forward) are garbage-collected out of the notified set
//! on the next tick. Ticks run to completion before the next is
//! scheduled; they never overlap.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::{EventQueue, WordbookEvent};
use crate::ports::{BlobStore, NotificationSink, NotifiedSet, ReviewDueNotification};
use crate::vocab::WordStore;

/// Message types for scheduler communication
#[derive(Debug)]
pub enum SchedulerMessage {
    /// Run a scan immediately (used by tests and manual refresh)
    TickNow,
    /// Shutdown the scheduler
    Shutdown,
}

/// Review scheduler that runs in the background
pub struct ReviewScheduler {
    store: Arc<WordStore>,
    sink: Arc<dyn NotificationSink>,
    blobs: Arc<dyn BlobStore>,
    events: Arc<EventQueue>,
    tick: Duration,
    sender: Option<mpsc::Sender<SchedulerMessage>>,
}

impl ReviewScheduler {
    pub fn new(
        store: Arc<WordStore>,
        sink: Arc<dyn NotificationSink>,
        blobs: Arc<dyn BlobStore>,
        events: Arc<EventQueue>,
        tick: Duration,
    ) -> Self {
        Self {
            store,
            sink,
            blobs,
            events,
            tick,
            sender: None,
        }
    }

    /// Start the scheduler in a background task
    pub fn start(&mut self) {
        let (tx, rx) = mpsc::channel(32);
        self.sender = Some(tx);

        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);
        let blobs = Arc::clone(&self.blobs);
        let events = Arc::clone(&self.events);
        let tick = self.tick;

        tokio::spawn(async move {
            scheduler_loop(store, sink, blobs, events, tick, rx).await;
        });
    }

    /// Request an immediate scan
    pub fn tick_now(&self) {
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(SchedulerMessage::TickNow);
        }
    }

    /// Shutdown the scheduler
    pub fn shutdown(&self) {
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(SchedulerMessage::Shutdown);
        }
    }
}

/// Main scheduler loop. One scan per tick; control messages can force a
/// scan or stop the loop.
async fn scheduler_loop(
    store: Arc<WordStore>,
    sink: Arc<dyn NotificationSink>,
    blobs: Arc<dyn BlobStore>,
    events: Arc<EventQueue>,
    tick: Duration,
    mut receiver: mpsc::Receiver<SchedulerMessage>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(tick) => {
                run_tick(&store, sink.as_ref(), blobs.as_ref(), &events).await;
            }
            msg = receiver.recv() => {
                match msg {
                    Some(SchedulerMessage::TickNow) => {
                        run_tick(&store, sink.as_ref(), blobs.as_ref(), &events).await;
                    }
                    Some(SchedulerMessage::Shutdown) | None => {
                        log::info!("Review scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }
}

/// One due-scan pass. Public within the crate so tests can drive ticks
/// without timers.
pub(crate) async fn run_tick(
    store: &WordStore,
    sink: &dyn NotificationSink,
    blobs: &dyn BlobStore,
    events: &EventQueue,
) {
    let now = Utc::now();

    let due = match store.get_due(now) {
        Ok(due) => due,
        Err(e) => {
            log::error!("Due scan failed, skipping tick: {}", e);
            return;
        }
    };

    if due.is_empty() {
        // Nothing to notify, nothing to remember
        if let Err(e) = NotifiedSet::clear(blobs).await {
            log::error!("Failed to clear notified set: {}", e);
        }
        return;
    }

    let notified = match NotifiedSet::load(blobs).await {
        Ok(notified) => notified,
        Err(e) => {
            log::error!("Failed to load notified set, skipping tick: {}", e);
            return;
        }
    };

    let due_ids: HashSet<Uuid> = due.iter().map(|w| w.id).collect();
    // Still-due words already surfaced stay silent but stay remembered;
    // ids that left the due set fall out here.
    let mut retained: HashSet<Uuid> = notified.intersection(&due_ids).copied().collect();
    let new_items: Vec<_> = due
        .iter()
        .filter(|w| !notified.contains(&w.id))
        .cloned()
        .collect();

    if !new_items.is_empty() {
        log::info!(
            "{} newly due words ({} due in total)",
            new_items.len(),
            due.len()
        );

        let notification = ReviewDueNotification {
            timestamp: now,
            total_due: due.len(),
            new_count: new_items.len(),
            due_items: due.clone(),
            new_items: new_items.clone(),
        };

        // Delivery is fire-and-forget; the notified set is updated even
        // if the sink fails, so a flaky sink cannot cause repeat
        // notifications for the same words.
        if let Err(e) = sink.notify(notification.clone()).await {
            log::error!("Notification sink failed: {}", e);
        }
        events.push(WordbookEvent::ReviewDue(notification));

        retained.extend(new_items.iter().map(|w| w.id));
    }

    if let Err(e) = NotifiedSet::save(blobs, &retained).await {
        log::error!("Failed to persist notified set: {}", e);
    }
}
