//! Managed collections: ordered, deduplicated aggregates of engine objects.
//!
//! A [`ManagedCollection`] owns an [`ObjectCollection`] and keeps it
//!
//! * deduplicated by identity: admitting an identity that is already present
//!   is a successful no-op,
//! * stably sorted by its comparator (by default, higher priority first),
//! * observed: every structural change, whether made through this type or by
//!   the engine through [`ManagedCollection::collection_handle`], bumps the
//!   revision and schedules a `member-added` / `member-removed` notification.
//!   A member whose priority changes is moved to its new position.
//!
//! Members are supplied as [`Member`]s: either a managed node, whose engine
//! object is awaited first, or a raw engine object.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use handle_trait::Handle;
use tokio::{sync::broadcast, task::JoinSet};
use tracing::{debug, trace, warn};

use crate::{
    Identity, ManagedObject, Result, SyncConfig,
    constants::{MEMBER_ADDED, MEMBER_REMOVED},
    engine::{
        BaseObject, CollectionChange, Comparator, DefaultInteractions, EngineRef, ListenerKey,
        ObjectCollection, ObjectKind, PropertyChange, create_default_interactions,
        default_comparator, initialize_object,
    },
    notify::Emitter,
    revision::Revision,
    traits::{EventBridged, Resolvable},
};

pub mod errors;

pub use errors::CollectionError;

/// Something that can be added to or removed from a collection.
#[derive(Debug, Clone)]
pub enum Member {
    /// A managed node; its engine object is awaited before use.
    Node(ManagedObject),
    /// A raw engine object.
    Object(EngineRef),
}

impl Member {
    /// Resolve to the engine object, treating a destroyed node as absent.
    async fn resolve_live(self) -> Result<Option<EngineRef>> {
        match self.resolve().await {
            Ok(object) => Ok(Some(object)),
            Err(err) if err.is_disposed() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl Resolvable for Member {
    async fn resolve(&self) -> Result<EngineRef> {
        match self {
            Member::Node(node) => node.resolve().await,
            Member::Object(object) => Ok(Arc::clone(object)),
        }
    }

    fn try_resolved(&self) -> Option<EngineRef> {
        match self {
            Member::Node(node) => node.try_resolved(),
            Member::Object(object) => Some(Arc::clone(object)),
        }
    }
}

impl From<ManagedObject> for Member {
    fn from(node: ManagedObject) -> Self {
        Member::Node(node)
    }
}

impl From<&ManagedObject> for Member {
    fn from(node: &ManagedObject) -> Self {
        Member::Node(node.clone())
    }
}

impl From<EngineRef> for Member {
    fn from(object: EngineRef) -> Self {
        Member::Object(object)
    }
}

impl From<&EngineRef> for Member {
    fn from(object: &EngineRef) -> Self {
        Member::Object(Arc::clone(object))
    }
}

impl From<BaseObject> for Member {
    fn from(object: BaseObject) -> Self {
        Member::Object(Arc::new(object))
    }
}

/// Outward notification published by a collection.
#[derive(Debug, Clone)]
pub enum CollectionEvent {
    MemberAdded(EngineRef),
    MemberRemoved(EngineRef),
}

impl CollectionEvent {
    /// Event name: `member-added` or `member-removed`.
    pub fn name(&self) -> &'static str {
        match self {
            CollectionEvent::MemberAdded(_) => MEMBER_ADDED,
            CollectionEvent::MemberRemoved(_) => MEMBER_REMOVED,
        }
    }

    /// The affected engine object.
    pub fn element(&self) -> &EngineRef {
        match self {
            CollectionEvent::MemberAdded(object) | CollectionEvent::MemberRemoved(object) => object,
        }
    }
}

impl From<&CollectionChange> for CollectionEvent {
    fn from(change: &CollectionChange) -> Self {
        match change {
            CollectionChange::Added(object) => CollectionEvent::MemberAdded(Arc::clone(object)),
            CollectionChange::Removed(object) => {
                CollectionEvent::MemberRemoved(Arc::clone(object))
            }
        }
    }
}

/// Initial membership of a collection.
#[derive(Debug, Clone, Default)]
pub enum InitialMembers {
    /// Start empty.
    #[default]
    None,
    /// Start with the engine's default interaction set.
    Defaults(DefaultInteractions),
    /// Start with an explicit list.
    Members(Vec<Member>),
    /// Start with the contents of an existing container.
    Collection(ObjectCollection),
}

impl From<bool> for InitialMembers {
    fn from(defaults: bool) -> Self {
        if defaults {
            InitialMembers::Defaults(DefaultInteractions::default())
        } else {
            InitialMembers::None
        }
    }
}

impl From<DefaultInteractions> for InitialMembers {
    fn from(options: DefaultInteractions) -> Self {
        InitialMembers::Defaults(options)
    }
}

impl From<Vec<Member>> for InitialMembers {
    fn from(members: Vec<Member>) -> Self {
        InitialMembers::Members(members)
    }
}

impl From<ObjectCollection> for InitialMembers {
    fn from(collection: ObjectCollection) -> Self {
        InitialMembers::Collection(collection)
    }
}

struct CollectionInner {
    kind: ObjectKind,
    native: ObjectCollection,
    comparator: Mutex<Comparator>,
    revision: Revision,
    events: Emitter<CollectionEvent>,
    listener: Mutex<Option<ListenerKey>>,
    /// Priority listeners registered on current members
    watched: Mutex<Vec<(EngineRef, ListenerKey)>>,
    disposed: AtomicBool,
}

impl CollectionInner {
    fn sort(&self) {
        let comparator = self.comparator.lock().unwrap().clone();
        self.native.sort_by(&comparator);
    }

    /// Whether this exact object is still a member.
    fn holds(&self, object: &EngineRef) -> bool {
        self.native.find(|member| Arc::ptr_eq(member, object)).is_some()
    }

    /// Bring a newly added member in line with the collection invariants,
    /// however it got in.
    ///
    /// Members pushed by the engine bypass the pre-flight checks of
    /// [`ManagedCollection::add`], so they are initialized here, dropped
    /// unless they are the first holder of their identity, and sorted into
    /// place.
    fn settle_member(inner: &Arc<CollectionInner>, object: &EngineRef) {
        initialize_object(object);
        let identity = object.identity();
        let members = inner.native.to_vec();
        let first = members.iter().find(|member| member.identity() == identity);
        let repeated = members
            .iter()
            .filter(|member| Arc::ptr_eq(*member, object))
            .count()
            > 1;
        if repeated || first.is_some_and(|first| !Arc::ptr_eq(first, object)) {
            debug!(
                ?identity,
                name = object.name(),
                "dropping duplicate identity pushed by engine"
            );
            inner.native.remove(object);
            return;
        }
        CollectionInner::watch_member(inner, object);
        inner.sort();
    }

    /// Re-sort whenever `object` changes priority, however it was changed.
    fn watch_member(inner: &Arc<CollectionInner>, object: &EngineRef) {
        let weak = Arc::downgrade(inner);
        let key = object.on_change(Arc::new(move |change: &PropertyChange| {
            if let PropertyChange::Priority(priority) = change {
                if let Some(inner) = weak.upgrade() {
                    trace!(priority, "member priority changed, re-sorting");
                    inner.sort();
                }
            }
        }));
        inner
            .watched
            .lock()
            .unwrap()
            .push((Arc::clone(object), key));
    }

    fn unwatch_member(&self, object: &EngineRef) {
        let entry = {
            let mut watched = self.watched.lock().unwrap();
            watched
                .iter()
                .position(|(member, _)| Arc::ptr_eq(member, object))
                .map(|index| watched.remove(index))
        };
        if let Some((member, key)) = entry {
            member.un_listen(key);
        }
    }

    fn stop_observing(&self) {
        if let Some(key) = self.listener.lock().unwrap().take() {
            self.native.un_listen(key);
        }
        let watched = std::mem::take(&mut *self.watched.lock().unwrap());
        for (member, key) in watched {
            member.un_listen(key);
        }
    }
}

impl Drop for CollectionInner {
    fn drop(&mut self) {
        if let Ok(listener) = self.listener.get_mut() {
            if let Some(key) = listener.take() {
                self.native.un_listen(key);
            }
        }
        if let Ok(watched) = self.watched.get_mut() {
            for (member, key) in watched.drain(..) {
                member.un_listen(key);
            }
        }
    }
}

impl std::fmt::Debug for CollectionInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionInner")
            .field("kind", &self.kind)
            .field("members", &self.native.len())
            .field("revision", &self.revision.get())
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Ordered, deduplicated collection of engine objects.
///
/// `ManagedCollection` is a cheap-to-clone handle; clones refer to the same
/// collection.
///
/// ## Example
///
/// ```
/// # use mapsync::{ManagedCollection, engine::BaseObject};
/// # #[tokio::main]
/// # async fn main() -> mapsync::Result<()> {
/// let collection = ManagedCollection::new();
/// collection.add(BaseObject::interaction("A").with_identity("a").with_priority(1.0)).await?;
/// collection.add(BaseObject::interaction("B").with_identity("b").with_priority(5.0)).await?;
/// collection.add(BaseObject::interaction("A2").with_identity("a")).await?;
///
/// let ids: Vec<String> = collection.identities().iter().map(|id| id.to_string()).collect();
/// assert_eq!(ids, vec!["b", "a"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Handle)]
pub struct ManagedCollection {
    inner: Arc<CollectionInner>,
}

impl Default for ManagedCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedCollection {
    /// An empty interaction collection with default config.
    pub fn new() -> Self {
        Self::for_kind(ObjectKind::Interaction)
    }

    /// An empty collection admitting objects of `kind`.
    pub fn for_kind(kind: ObjectKind) -> Self {
        Self::from_collection(kind, ObjectCollection::new(), &SyncConfig::default())
    }

    /// An empty collection admitting objects of `kind`, configured by `config`.
    pub fn with_config(kind: ObjectKind, config: &SyncConfig) -> Self {
        Self::from_collection(kind, ObjectCollection::new(), config)
    }

    /// Manage an existing container.
    ///
    /// Its current contents become the initial membership: each member gets
    /// a generated identity and default priority if it lacks them, later
    /// duplicates of an identity are dropped, and the result is sorted.
    pub fn from_collection(
        kind: ObjectKind,
        native: ObjectCollection,
        config: &SyncConfig,
    ) -> Self {
        let comparator = default_comparator();
        normalize(&native, &comparator);

        let inner = Arc::new_cyclic(|weak: &Weak<CollectionInner>| {
            let revision = Revision::new();
            let events = Emitter::new(config.event_capacity);

            let listener = {
                let weak = weak.clone();
                let revision = revision.handle();
                let events = events.clone();
                native.listen(Arc::new(move |change: &CollectionChange| {
                    let revision = revision.bump();
                    trace!(
                        revision,
                        element = change.element().name(),
                        "collection membership changed"
                    );
                    events.schedule(CollectionEvent::from(change));
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    match change {
                        CollectionChange::Added(object) => {
                            CollectionInner::settle_member(&inner, object)
                        }
                        CollectionChange::Removed(object) => {
                            if !inner.holds(object) {
                                inner.unwatch_member(object);
                            }
                        }
                    }
                }))
            };

            CollectionInner {
                kind,
                native,
                comparator: Mutex::new(comparator),
                revision,
                events,
                listener: Mutex::new(Some(listener)),
                watched: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }
        });

        for object in inner.native.to_vec() {
            CollectionInner::watch_member(&inner, &object);
        }
        Self { inner }
    }

    /// Kind of engine object this collection admits.
    pub fn kind(&self) -> ObjectKind {
        self.inner.kind
    }

    /// Replace the active comparator and re-sort.
    pub fn set_comparator(&self, comparator: Comparator) {
        *self.inner.comparator.lock().unwrap() = comparator;
        self.sort(None);
    }

    /// The active comparator.
    pub fn comparator(&self) -> Comparator {
        self.inner.comparator.lock().unwrap().clone()
    }

    /// Add a node or raw engine object.
    ///
    /// A node is resolved first. The object then gets a generated identity
    /// and default priority if it lacks them, and is appended unless a member
    /// with the same identity exists. Destroyed nodes and disposed
    /// collections make this a no-op.
    pub async fn add(&self, member: impl Into<Member>) -> Result<()> {
        match member.into().resolve_live().await? {
            Some(object) => self.admit(object),
            None => Ok(()),
        }
    }

    fn admit(&self, object: EngineRef) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        if object.kind() != self.inner.kind {
            return Err(CollectionError::TypeMismatch {
                expected: self.inner.kind,
                found: object.kind(),
            }
            .into());
        }

        initialize_object(&object);
        if self.inner.native.push_unique(Arc::clone(&object)) {
            debug!(identity = ?object.identity(), name = object.name(), "member added");
        } else {
            trace!(identity = ?object.identity(), "identity already present, skipping");
        }
        Ok(())
    }

    /// Add many members.
    ///
    /// Raw objects are admitted right away and each node as soon as its own
    /// resolution completes, so one slow node holds back nobody else. Every
    /// member is attempted; the failure of the earliest member in input order
    /// is returned once all of them are done.
    pub async fn add_many<I>(&self, members: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Member>,
    {
        self.apply_each(members, "add", |collection, object| collection.admit(object))
            .await
    }

    /// Remove the member sharing the identity of `member`'s engine object.
    ///
    /// No-op if no such member exists.
    pub async fn remove(&self, member: impl Into<Member>) -> Result<()> {
        if let Some(object) = member.into().resolve_live().await? {
            self.detach(&object);
        }
        Ok(())
    }

    fn detach(&self, object: &EngineRef) {
        if let Some(identity) = object.identity() {
            self.remove_by_identity(&identity);
        }
    }

    /// Remove the member with the given identity. Returns whether one was
    /// removed.
    pub fn remove_by_identity(&self, identity: &Identity) -> bool {
        if self.is_disposed() {
            return false;
        }
        let removed = self.inner.native.remove_by_identity(identity).is_some();
        if removed {
            debug!(%identity, "member removed");
        }
        removed
    }

    /// Remove many members, with the same failure isolation as [`add_many`](Self::add_many).
    pub async fn remove_many<I>(&self, members: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Member>,
    {
        self.apply_each(members, "remove", |collection, object| {
            collection.detach(&object);
            Ok(())
        })
        .await
    }

    /// Run `apply` on every member's engine object as soon as it is
    /// available. Destroyed nodes are skipped.
    async fn apply_each<I>(
        &self,
        members: I,
        action: &'static str,
        apply: fn(&ManagedCollection, EngineRef) -> Result<()>,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Member>,
    {
        let mut failures: Vec<(usize, crate::Error)> = Vec::new();
        let mut pending = JoinSet::new();
        for (index, member) in members.into_iter().enumerate() {
            match member.into() {
                Member::Object(object) => {
                    if let Err(err) = apply(self, object) {
                        warn!("Failed to {action} member: {err}");
                        failures.push((index, err));
                    }
                }
                node @ Member::Node(_) => {
                    let collection = self.clone();
                    pending.spawn(async move {
                        let outcome = match node.resolve_live().await {
                            Ok(Some(object)) => apply(&collection, object),
                            Ok(None) => Ok(()),
                            Err(err) => Err(err),
                        };
                        (index, outcome)
                    });
                }
            }
        }

        while let Some(joined) = pending.join_next().await {
            let (index, err) = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((index, Err(err))) => (index, err),
                Err(err) => (
                    usize::MAX,
                    crate::Error::from(CollectionError::TaskFailed {
                        reason: err.to_string(),
                    }),
                ),
            };
            warn!("Failed to {action} member: {err}");
            failures.push((index, err));
        }

        failures
            .into_iter()
            .min_by_key(|(index, _)| *index)
            .map_or(Ok(()), |(_, err)| Err(err))
    }

    /// Snapshot of the members, in order.
    pub fn list(&self) -> Vec<EngineRef> {
        self.inner.native.to_vec()
    }

    /// Ordered identities of the members.
    pub fn identities(&self) -> Vec<Identity> {
        self.list()
            .iter()
            .filter_map(|object| object.identity())
            .collect()
    }

    /// The underlying container.
    ///
    /// The engine may mutate it directly; such changes are still observed.
    pub fn collection_handle(&self) -> ObjectCollection {
        self.inner.native.handle()
    }

    /// First member with the given identity.
    pub fn find_by_identity(&self, identity: &Identity) -> Option<EngineRef> {
        self.inner
            .native
            .find(|object| object.identity().as_ref() == Some(identity))
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.find_by_identity(identity).is_some()
    }

    /// Stable sort in place by `comparator`, or by the active comparator.
    pub fn sort(&self, comparator: Option<&Comparator>) {
        match comparator {
            Some(comparator) => self.inner.native.sort_by(comparator),
            None => self.inner.sort(),
        }
    }

    /// Detach every member. The engine objects themselves are untouched.
    pub fn clear(&self) {
        self.inner.native.clear();
    }

    /// Replace the membership with `initial`.
    pub async fn init_members(&self, initial: impl Into<InitialMembers>) -> Result<()> {
        self.clear();
        match initial.into() {
            InitialMembers::None => Ok(()),
            InitialMembers::Defaults(options) => {
                self.add_many(create_default_interactions(&options).to_vec())
                    .await
            }
            InitialMembers::Members(members) => self.add_many(members).await,
            InitialMembers::Collection(collection) => self.add_many(collection.to_vec()).await,
        }
    }

    /// Stop observing the container and ignore further adds and removes.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.stop_observing();
        debug!(kind = %self.inner.kind, "collection disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.inner.native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.native.is_empty()
    }

    /// Number of structural changes observed so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision.get()
    }

    /// Subscribe to `member-added` / `member-removed` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionEvent> {
        self.inner.events.subscribe()
    }
}

impl EventBridged for ManagedCollection {
    type Event = CollectionEvent;

    fn revision(&self) -> u64 {
        ManagedCollection::revision(self)
    }

    fn events(&self) -> broadcast::Receiver<CollectionEvent> {
        self.subscribe()
    }
}

/// Initialize every member of an adopted container, drop later holders of
/// an identity and sort the rest. Runs before the container is observed.
fn normalize(native: &ObjectCollection, comparator: &Comparator) {
    let mut seen = HashSet::new();
    for object in native.to_vec() {
        initialize_object(&object);
        if let Some(identity) = object.identity() {
            if !seen.insert(identity) {
                trace!(name = object.name(), "dropping duplicate identity from adopted container");
                native.remove(&object);
            }
        }
    }
    native.sort_by(comparator);
}
