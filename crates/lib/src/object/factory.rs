//! Construction strategies for the engine object behind a managed node.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;

use crate::{
    Context, Result,
    engine::{BaseObject, EngineError, EngineRef},
};

/// Builds the engine object a [`ManagedObject`](crate::ManagedObject) wraps.
///
/// Construction may itself wait on other asynchronously resolved services
/// reachable through the context. A node calls this once per resolution and
/// caches the result.
#[async_trait]
pub trait ObjectFactory: Send + Sync {
    async fn create_underlying(&self, context: &Context) -> Result<EngineRef>;
}

/// Factory backed by an async closure.
///
/// ```
/// # use std::sync::Arc;
/// # use mapsync::{FnFactory, engine::{BaseObject, EngineRef}};
/// let factory = FnFactory::new(|_context| async {
///     Ok::<EngineRef, mapsync::Error>(Arc::new(BaseObject::interaction("Select")))
/// });
/// ```
pub struct FnFactory<F> {
    create: F,
}

impl<F, Fut> FnFactory<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EngineRef>> + Send,
{
    pub fn new(create: F) -> Self {
        Self { create }
    }
}

#[async_trait]
impl<F, Fut> ObjectFactory for FnFactory<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EngineRef>> + Send,
{
    async fn create_underlying(&self, context: &Context) -> Result<EngineRef> {
        (self.create)(context.clone()).await
    }
}

/// Builds a plain interaction object of the given type name.
///
/// Fails if the ancestor map is not available or the name is empty.
#[derive(Debug, Clone)]
pub struct InteractionFactory {
    name: String,
}

impl InteractionFactory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ObjectFactory for InteractionFactory {
    async fn create_underlying(&self, context: &Context) -> Result<EngineRef> {
        if context.map().is_none() {
            return Err(EngineError::ServiceUnavailable {
                service: "map".to_string(),
            }
            .into());
        }
        if self.name.trim().is_empty() {
            return Err(EngineError::Construction {
                name: "interaction".to_string(),
                reason: "empty type name".to_string(),
            }
            .into());
        }
        Ok(Arc::new(BaseObject::interaction(self.name.clone())))
    }
}

/// Interaction factory that holds construction open until released.
///
/// Each call waits for the gate to open and is counted, which lets tests
/// interleave teardown with in-flight construction.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone)]
pub struct GatedFactory {
    name: String,
    open: Arc<tokio::sync::watch::Sender<bool>>,
    calls: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(any(test, feature = "testing"))]
impl GatedFactory {
    /// A closed gate building interactions named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let (open, _) = tokio::sync::watch::channel(false);
        Self {
            name: name.into(),
            open: Arc::new(open),
            calls: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        }
    }

    /// Let pending and future constructions complete.
    pub fn open(&self) {
        self.open.send_replace(true);
    }

    /// How many times construction has been requested.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl ObjectFactory for GatedFactory {
    async fn create_underlying(&self, _context: &Context) -> Result<EngineRef> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut rx = self.open.subscribe();
        // The sender lives in `self`, so the channel stays open
        let _ = rx.wait_for(|open| *open).await;
        Ok(Arc::new(BaseObject::interaction(self.name.clone())))
    }
}
