//! Fixed-interval coalescing of change streams.
//!
//! Native engine objects can emit property changes far faster than anybody
//! downstream wants to react to them. A [`Throttle`] wraps a channel of changes
//! and hands them out in batches: it waits lazily for the first change, keeps
//! collecting for one interval, and yields the latest value per key in the
//! order the keys last changed. The sequence is infinite until the sending
//! side goes away; a new throttle over a fresh channel restarts it.

use std::time::Duration;

use tokio::sync::mpsc;

/// Items that can be merged with a later item carrying the same key.
pub trait Coalesce {
    /// Key under which later items replace earlier ones.
    type Key: PartialEq;

    /// The coalescing key of this item.
    fn coalesce_key(&self) -> Self::Key;
}

/// Batches items from a channel over a fixed interval.
#[derive(Debug)]
pub struct Throttle<T> {
    rx: mpsc::UnboundedReceiver<T>,
    interval: Duration,
}

impl<T: Coalesce> Throttle<T> {
    /// Wrap `rx`, coalescing over `interval`.
    pub fn new(rx: mpsc::UnboundedReceiver<T>, interval: Duration) -> Self {
        Self { rx, interval }
    }

    /// The coalescing interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next batch of changes.
    ///
    /// Returns `None` once the sending side is closed and drained.
    pub async fn next_batch(&mut self) -> Option<Vec<T>> {
        let first = self.rx.recv().await?;
        let mut batch = vec![first];
        if self.interval.is_zero() {
            while let Ok(item) = self.rx.try_recv() {
                merge(&mut batch, item);
            }
            return Some(batch);
        }

        // `sleep` saturates intervals past the end of the clock
        let window = tokio::time::sleep(self.interval);
        tokio::pin!(window);
        loop {
            tokio::select! {
                _ = &mut window => break,
                item = self.rx.recv() => match item {
                    Some(item) => merge(&mut batch, item),
                    None => break,
                },
            }
        }
        Some(batch)
    }
}

fn merge<T: Coalesce>(batch: &mut Vec<T>, item: T) {
    let key = item.coalesce_key();
    batch.retain(|existing| existing.coalesce_key() != key);
    batch.push(item);
}
