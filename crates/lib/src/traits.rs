//! Composable roles of managed nodes and collections.
//!
//! A node type picks the roles it plays: [`Resolvable`] for anything that can
//! produce its engine object asynchronously, [`Orderable`] for anything whose
//! position in a collection is driven by a priority, and [`EventBridged`] for
//! anything that republishes native changes as outward notifications.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{Result, engine::EngineRef};

/// Produces an engine object, possibly after waiting for its construction.
#[async_trait]
pub trait Resolvable: Send + Sync {
    /// Wait for the engine object.
    async fn resolve(&self) -> Result<EngineRef>;

    /// The engine object, if available without waiting.
    fn try_resolved(&self) -> Option<EngineRef>;
}

/// Carries a priority that orders it within a collection.
#[async_trait]
pub trait Orderable: Send + Sync {
    async fn priority(&self) -> Result<f64>;
    async fn set_priority(&self, priority: f64) -> Result<()>;
}

/// Republishes native changes as deferred outward notifications.
pub trait EventBridged {
    type Event: Clone + Send + 'static;

    /// Monotonic count of observed native changes.
    fn revision(&self) -> u64;

    /// Subscribe to outward notifications.
    fn events(&self) -> broadcast::Receiver<Self::Event>;
}

#[async_trait]
impl Resolvable for EngineRef {
    async fn resolve(&self) -> Result<EngineRef> {
        Ok(self.clone())
    }

    fn try_resolved(&self) -> Option<EngineRef> {
        Some(self.clone())
    }
}
