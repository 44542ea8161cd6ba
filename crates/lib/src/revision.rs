//! Monotonic change counters.
//!
//! A [`Revision`] is bumped whenever the thing it tracks changes, so that
//! derived views can tell cheaply whether they need recomputing. Observers can
//! also await the next bump through a `watch` receiver.

use std::sync::Arc;

use handle_trait::Handle;
use tokio::sync::watch;

/// Shared, monotonically increasing counter.
#[derive(Clone, Debug, Handle)]
pub struct Revision {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for Revision {
    fn default() -> Self {
        Self::new()
    }
}

impl Revision {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Increment the counter and return the new value.
    pub fn bump(&self) -> u64 {
        let mut next = 0;
        self.tx.send_modify(|rev| {
            *rev += 1;
            next = *rev;
        });
        next
    }

    /// Subscribe to changes of the counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}
