//! Deferred outward notifications.
//!
//! Observers of nodes and collections should only see state after the current
//! burst of work has settled. An [`Emitter`] queues events and flushes them all
//! at once on the next turn of the scheduler, so a burst of N changes within
//! one turn produces a single flush rather than N.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use tokio::sync::broadcast;
use tracing::trace;

/// Queue of pending events plus the channel they are flushed into.
struct EmitterInner<E> {
    pending: Mutex<Vec<E>>,
    scheduled: AtomicBool,
    flushes: AtomicU64,
    tx: broadcast::Sender<E>,
}

impl<E: Clone> EmitterInner<E> {
    fn flush(&self) -> usize {
        self.scheduled.store(false, Ordering::SeqCst);
        let events = std::mem::take(&mut *self.pending.lock().unwrap());
        if events.is_empty() {
            return 0;
        }
        self.flushes.fetch_add(1, Ordering::SeqCst);
        let count = events.len();
        for event in events {
            // No receivers is fine, nobody is listening yet
            let _ = self.tx.send(event);
        }
        count
    }
}

/// Batches outward events and delivers them on the next scheduler turn.
pub struct Emitter<E> {
    inner: Arc<EmitterInner<E>>,
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("pending", &self.inner.pending.lock().map(|p| p.len()).ok())
            .field("flushes", &self.inner.flushes.load(Ordering::SeqCst))
            .finish()
    }
}

impl<E: Clone + Send + 'static> Emitter<E> {
    /// Create an emitter whose channel buffers up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(EmitterInner {
                pending: Mutex::new(Vec::new()),
                scheduled: AtomicBool::new(false),
                flushes: AtomicU64::new(0),
                tx,
            }),
        }
    }

    /// Queue an event for delivery on the next scheduler turn.
    ///
    /// Outside a tokio runtime there is no next turn, so the event is
    /// delivered immediately.
    pub fn schedule(&self, event: E) {
        self.inner.pending.lock().unwrap().push(event);
        if self.inner.scheduled.swap(true, Ordering::SeqCst) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(async move {
                    let delivered = inner.flush();
                    trace!(delivered, "flushed deferred notifications");
                });
            }
            Err(_) => {
                self.inner.flush();
            }
        }
    }

    /// Deliver all pending events now. Returns how many were delivered.
    pub fn flush(&self) -> usize {
        self.inner.flush()
    }

    /// Subscribe to delivered events.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.inner.tx.subscribe()
    }

    /// Number of events waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.inner.pending.lock().unwrap().len()
    }

    /// Number of non-empty flushes performed so far.
    pub fn flushes(&self) -> u64 {
        self.inner.flushes.load(Ordering::SeqCst)
    }
}
