//! Managed objects: declarative nodes wrapping one lazily created engine object.
//!
//! A [`ManagedObject`] owns the node-side view of an engine object: its
//! declared identity, activation flag and priority ([`ObjectProps`]), an
//! asynchronous handle that resolves once the engine object has been built,
//! and a change bridge that folds native property changes back into the node.
//!
//! The lifecycle mirrors that of the owning node:
//!
//! 1. [`ManagedObject::init`] waits for the ancestor map context, builds the
//!    engine object through the node's [`ObjectFactory`], pushes the declared
//!    properties into it and starts observing its changes.
//! 2. [`ManagedObject::mount`] registers the resolved object with the
//!    enclosing [`ManagedCollection`](crate::ManagedCollection), if any.
//! 3. [`ManagedObject::unmount`] and [`ManagedObject::deinit`] undo the above;
//!    [`ManagedObject::recreate`] runs them all again with a fresh engine object
//!    and the same identity.
//! 4. [`ManagedObject::destroy`] tears the node down for good. Anybody still
//!    waiting on the handle is released with [`ObjectError::Disposed`].
//!
//! Every property accessor waits for the handle and reads from or writes
//! through to the engine object, which stays the single source of truth.

use std::sync::{
    Arc, Mutex, Weak,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use handle_trait::Handle;
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::{Instrument, debug, debug_span, trace, warn};

use crate::{
    Context, Identity, Result,
    constants::{DEFAULT_PRIORITY, UPDATE_PREFIX},
    engine::{EngineRef, ListenerKey, Property, PropertyChange, effective_priority},
    notify::Emitter,
    revision::Revision,
    throttle::Throttle,
    traits::{EventBridged, Orderable, Resolvable},
};

pub mod errors;
pub mod factory;

pub use errors::ObjectError;
#[cfg(any(test, feature = "testing"))]
pub use factory::GatedFactory;
pub use factory::{FnFactory, InteractionFactory, ObjectFactory};

/// Declared, reactive state of a node.
///
/// Values are pushed into the engine object on resolution, and updated from
/// native change events afterwards so that a recreated object starts from
/// the latest state.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProps {
    /// Identity to assign. Generated on first resolution when absent.
    pub identity: Option<Identity>,
    pub active: bool,
    pub priority: f64,
}

impl Default for ObjectProps {
    fn default() -> Self {
        Self {
            identity: None,
            active: true,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl ObjectProps {
    pub fn with_identity(mut self, identity: impl Into<Identity>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }
}

/// Outward notification published by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEvent {
    /// A bridged property changed on the engine object (`update:<name>`).
    Update(PropertyChange),
}

impl ObjectEvent {
    /// Event name, e.g. `update:priority`.
    pub fn name(&self) -> String {
        match self {
            ObjectEvent::Update(change) => {
                format!("{UPDATE_PREFIX}{}", change.property().name())
            }
        }
    }

    /// The property this event is about.
    pub fn property(&self) -> Property {
        match self {
            ObjectEvent::Update(change) => change.property(),
        }
    }
}

#[derive(Clone, Debug)]
enum HandleState {
    Pending,
    Resolved(EngineRef),
    Disposed,
}

/// Live observation of an engine object's property changes.
struct Subscription {
    object: EngineRef,
    key: ListenerKey,
    task: JoinHandle<()>,
}

impl Subscription {
    fn cancel(self) {
        self.object.un_listen(self.key);
        self.task.abort();
    }
}

struct ObjectInner {
    factory: Arc<dyn ObjectFactory>,
    context: Context,
    props: Mutex<ObjectProps>,
    handle: watch::Sender<HandleState>,
    /// Serializes construction so one resolution never builds twice
    creating: tokio::sync::Mutex<()>,
    revision: Revision,
    events: Emitter<ObjectEvent>,
    subscription: Mutex<Option<Subscription>>,
    mounted: AtomicBool,
}

impl ObjectInner {
    /// Fold one bridged native change into the node.
    fn observe(&self, change: PropertyChange) {
        let revision = self.revision.bump();
        {
            let mut props = self.props.lock().unwrap();
            match &change {
                PropertyChange::Identity(identity) => props.identity = Some(identity.clone()),
                PropertyChange::Active(active) => props.active = *active,
                PropertyChange::Priority(priority) => props.priority = *priority,
            }
        }
        trace!(
            revision,
            property = change.property().name(),
            "observed native change"
        );
        self.events.schedule(ObjectEvent::Update(change));
    }
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        if let Ok(slot) = self.subscription.get_mut() {
            if let Some(subscription) = slot.take() {
                subscription.cancel();
            }
        }
    }
}

impl std::fmt::Debug for ObjectInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectInner")
            .field("props", &self.props)
            .field("handle", &*self.handle.borrow())
            .field("revision", &self.revision.get())
            .field("mounted", &self.mounted.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Node wrapping exactly one lazily created engine object.
///
/// `ManagedObject` is a cheap-to-clone handle; clones refer to the same node.
///
/// ## Example
///
/// ```
/// # use mapsync::{Context, InteractionFactory, ManagedCollection, ManagedObject, MapService, ObjectProps};
/// # #[tokio::main]
/// # async fn main() -> mapsync::Result<()> {
/// let collection = ManagedCollection::new();
/// let context = Context::new().with_collection(collection.clone());
/// context.map_slot().provide(MapService::new("map"));
///
/// let node = ManagedObject::new(
///     InteractionFactory::new("DragPan"),
///     context,
///     ObjectProps::default().with_identity("pan").with_priority(2.0),
/// );
/// node.init().await?;
/// node.mount().await?;
///
/// assert!(collection.find_by_identity(&"pan".into()).is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Handle)]
pub struct ManagedObject {
    inner: Arc<ObjectInner>,
}

/// Weak reference to a [`ManagedObject`].
///
/// Does not keep the node alive; use [`WeakManagedObject::upgrade`] to get a
/// strong handle back.
#[derive(Clone, Debug, Handle)]
pub struct WeakManagedObject {
    inner: Weak<ObjectInner>,
}

impl WeakManagedObject {
    /// Upgrade to a strong handle, if the node still exists.
    pub fn upgrade(&self) -> Option<ManagedObject> {
        self.inner.upgrade().map(|inner| ManagedObject { inner })
    }
}

impl ManagedObject {
    /// Create an unresolved node.
    pub fn new(
        factory: impl ObjectFactory + 'static,
        context: Context,
        props: ObjectProps,
    ) -> Self {
        Self::with_factory(Arc::new(factory), context, props)
    }

    /// Create an unresolved node from a shared factory.
    pub fn with_factory(
        factory: Arc<dyn ObjectFactory>,
        context: Context,
        props: ObjectProps,
    ) -> Self {
        let (handle, _) = watch::channel(HandleState::Pending);
        let events = Emitter::new(context.config().event_capacity);
        Self {
            inner: Arc::new(ObjectInner {
                factory,
                context,
                props: Mutex::new(props),
                handle,
                creating: tokio::sync::Mutex::new(()),
                revision: Revision::new(),
                events,
                subscription: Mutex::new(None),
                mounted: AtomicBool::new(false),
            }),
        }
    }

    /// Downgrade to a weak reference.
    pub fn downgrade(&self) -> WeakManagedObject {
        WeakManagedObject {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same node.
    pub fn same_as(&self, other: &ManagedObject) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The context this node was created with.
    pub fn context(&self) -> &Context {
        &self.inner.context
    }

    /// Context for children of this node: same services, with this node as
    /// the enclosing node.
    pub fn services(&self) -> Context {
        self.inner.context.with_node(self)
    }

    /// Snapshot of the node's reactive state.
    pub fn props(&self) -> ObjectProps {
        self.inner.props.lock().unwrap().clone()
    }

    /// Number of native property changes observed so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    /// Subscribe to `update:<name>` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ObjectEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.inner.handle.borrow(), HandleState::Resolved(_))
    }

    pub fn is_disposed(&self) -> bool {
        matches!(*self.inner.handle.borrow(), HandleState::Disposed)
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// The engine object, if resolved right now.
    pub fn try_resolved(&self) -> Option<EngineRef> {
        match &*self.inner.handle.borrow() {
            HandleState::Resolved(object) => Some(Arc::clone(object)),
            _ => None,
        }
    }

    /// Wait for the engine object.
    ///
    /// Fails with [`ObjectError::Disposed`] if the node is, or becomes,
    /// destroyed before resolution completes.
    pub async fn resolve(&self) -> Result<EngineRef> {
        let mut rx = self.inner.handle.subscribe();
        let state = rx
            .wait_for(|state| !matches!(state, HandleState::Pending))
            .await
            .map(|state| (*state).clone())
            .map_err(|_| self.disposed_error())?;
        match state {
            HandleState::Resolved(object) => Ok(object),
            _ => Err(self.disposed_error()),
        }
    }

    fn disposed_error(&self) -> crate::Error {
        ObjectError::Disposed {
            identity: self.props().identity,
        }
        .into()
    }

    pub async fn identity(&self) -> Result<Option<Identity>> {
        Ok(self.resolve().await?.identity())
    }

    /// Write a new identity through to the engine object.
    ///
    /// No-op if it equals the current identity.
    pub async fn set_identity(&self, identity: impl Into<Identity>) -> Result<()> {
        let identity = identity.into();
        let object = self.resolve().await?;
        if object.identity().as_ref() == Some(&identity) {
            return Ok(());
        }
        object.set_identity(identity);
        Ok(())
    }

    pub async fn active(&self) -> Result<bool> {
        Ok(self.resolve().await?.active())
    }

    /// Write the activation flag through to the engine object.
    pub async fn set_active(&self, active: bool) -> Result<()> {
        let object = self.resolve().await?;
        if object.active() == active {
            return Ok(());
        }
        object.set_active(active);
        Ok(())
    }

    pub async fn priority(&self) -> Result<f64> {
        Ok(effective_priority(&self.resolve().await?))
    }

    /// Write the priority through to the engine object and re-sort the
    /// enclosing collection, if there is one.
    pub async fn set_priority(&self, priority: f64) -> Result<()> {
        let object = self.resolve().await?;
        if object.priority() == Some(priority) {
            return Ok(());
        }
        object.set_priority(priority);
        if let Some(collection) = self.inner.context.collection() {
            collection.sort(None);
        }
        Ok(())
    }

    /// Wait for the ancestor map context, then resolve the engine object.
    ///
    /// The wait is unbounded unless the context's config sets
    /// `init_timeout_ms`. Calling `init` on a resolved node does nothing.
    pub async fn init(&self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        self.wait_for_map().await?;
        self.resolve_underlying().await
    }

    async fn wait_for_map(&self) -> Result<()> {
        let slot = self.inner.context.map_slot();
        match self.inner.context.config().init_timeout() {
            Some(limit) => {
                tokio::time::timeout(limit, slot.wait())
                    .await
                    .map_err(|_| ObjectError::InitTimeout {
                        waited_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    })?;
            }
            None => {
                slot.wait().await;
            }
        }
        Ok(())
    }

    async fn resolve_underlying(&self) -> Result<()> {
        let _creating = self.inner.creating.lock().await;
        if !matches!(*self.inner.handle.borrow(), HandleState::Pending) {
            return Ok(());
        }

        let object = self
            .inner
            .factory
            .create_underlying(&self.inner.context)
            .await?;
        self.initialize_underlying(&object);

        let published = self.inner.handle.send_if_modified(|state| {
            if matches!(state, HandleState::Pending) {
                *state = HandleState::Resolved(Arc::clone(&object));
                true
            } else {
                false
            }
        });
        if !published {
            warn!(name = object.name(), "dropping engine object resolved after teardown");
            return Ok(());
        }
        debug!(identity = ?object.identity(), name = object.name(), "resolved engine object");

        self.subscribe_all().await
    }

    /// Push declared identity, priority and activation into a fresh object.
    fn initialize_underlying(&self, object: &EngineRef) {
        let props = {
            let mut props = self.inner.props.lock().unwrap();
            if props.identity.is_none() {
                props.identity = Some(object.identity().unwrap_or_else(Identity::generate));
            }
            props.clone()
        };
        if let Some(identity) = props.identity {
            object.set_identity(identity);
        }
        object.set_priority(props.priority);
        object.set_active(props.active);
    }

    /// Start bridging native identity, activation and priority changes.
    ///
    /// Changes are coalesced over the configured throttle interval; each one
    /// bumps the revision and schedules an `update:<name>` notification.
    /// Replaces any earlier observation.
    pub async fn subscribe_all(&self) -> Result<()> {
        let object = self.resolve().await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let key = object.on_change(Arc::new(move |change: &PropertyChange| {
            // Receiver gone means the bridge was torn down
            let _ = tx.send(change.clone());
        }));

        let mut throttle = Throttle::new(rx, self.inner.context.config().throttle_interval());
        let weak = Arc::downgrade(&self.inner);
        let span = debug_span!("object_events", identity = ?object.identity());
        let task = tokio::spawn(
            async move {
                while let Some(batch) = throttle.next_batch().await {
                    let Some(inner) = weak.upgrade() else {
                        break;
                    };
                    for change in batch {
                        inner.observe(change);
                    }
                }
            }
            .instrument(span),
        );

        let previous = self.inner.subscription.lock().unwrap().replace(Subscription {
            object,
            key,
            task,
        });
        if let Some(previous) = previous {
            previous.cancel();
        }
        Ok(())
    }

    /// Register the resolved object with the enclosing collection.
    ///
    /// A failed registration leaves the node unmounted and otherwise intact.
    pub async fn mount(&self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        if let Some(collection) = self.inner.context.collection() {
            collection.add(self.handle()).await?;
        }
        if self.is_disposed() {
            return Ok(());
        }
        self.inner.mounted.store(true, Ordering::SeqCst);
        debug!(identity = ?self.props().identity, "mounted");
        Ok(())
    }

    /// Remove the object from the enclosing collection.
    ///
    /// Safe to call on a node that was never mounted or never resolved. A
    /// mounted node whose handle was released by [`deinit`](Self::deinit) is
    /// removed by its last known identity.
    pub async fn unmount(&self) -> Result<()> {
        if let Some(collection) = self.inner.context.collection() {
            match self.try_resolved() {
                Some(object) => collection.remove(object).await?,
                None if self.is_mounted() => {
                    if let Some(identity) = self.props().identity {
                        collection.remove_by_identity(&identity);
                    }
                }
                None => {}
            }
        }
        if self.inner.mounted.swap(false, Ordering::SeqCst) {
            debug!(identity = ?self.props().identity, "unmounted");
        }
        Ok(())
    }

    /// Stop observing the engine object and release the handle.
    ///
    /// The latest identity, activation and priority are kept in the node's
    /// props so a later `init` rebuilds an equivalent object.
    pub fn deinit(&self) {
        let subscription = self.inner.subscription.lock().unwrap().take();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }

        if let Some(object) = self.try_resolved() {
            let mut props = self.inner.props.lock().unwrap();
            if let Some(identity) = object.identity() {
                props.identity = Some(identity);
            }
            props.active = object.active();
            props.priority = effective_priority(&object);
        }

        self.inner.handle.send_if_modified(|state| {
            if matches!(state, HandleState::Resolved(_)) {
                *state = HandleState::Pending;
                true
            } else {
                false
            }
        });
    }

    /// Unmount, deinit and dispose the node.
    ///
    /// Waiters on the handle fail with [`ObjectError::Disposed`]; a
    /// construction still in flight is dropped when it completes.
    pub async fn destroy(&self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        let unmounted = self.unmount().await;
        self.deinit();
        self.inner.handle.send_replace(HandleState::Disposed);
        debug!(identity = ?self.props().identity, "destroyed");
        unmounted
    }

    /// Rebuild the engine object, keeping identity and current state.
    pub async fn recreate(&self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        let was_mounted = self.is_mounted();
        if was_mounted {
            self.unmount().await?;
        }
        self.deinit();
        self.init().await?;
        if was_mounted {
            self.mount().await?;
        }
        debug!(identity = ?self.props().identity, "recreated");
        Ok(())
    }

    /// Unmount and mount again.
    pub async fn remount(&self) -> Result<()> {
        if self.is_mounted() {
            self.unmount().await?;
        }
        self.mount().await
    }

    /// Bump the engine object's generic revision.
    pub async fn refresh(&self) -> Result<()> {
        self.resolve().await?.changed();
        Ok(())
    }
}

#[async_trait]
impl Resolvable for ManagedObject {
    async fn resolve(&self) -> Result<EngineRef> {
        ManagedObject::resolve(self).await
    }

    fn try_resolved(&self) -> Option<EngineRef> {
        ManagedObject::try_resolved(self)
    }
}

#[async_trait]
impl Orderable for ManagedObject {
    async fn priority(&self) -> Result<f64> {
        ManagedObject::priority(self).await
    }

    async fn set_priority(&self, priority: f64) -> Result<()> {
        ManagedObject::set_priority(self, priority).await
    }
}

impl EventBridged for ManagedObject {
    type Event = ObjectEvent;

    fn revision(&self) -> u64 {
        ManagedObject::revision(self)
    }

    fn events(&self) -> broadcast::Receiver<ObjectEvent> {
        self.subscribe()
    }
}
