//! Kind-keyed pools.
//!
//! # Invariants
//! - Every entity a pool constructs stays a member of exactly that pool until
//!   teardown. Its `Pooled` slot says whether it is queued or active.
//! - A member is in the free queue iff its slot is `Queued`.
//! - `spawn` pops before it activates; `release` cancels every task scope
//!   before it enqueues. So the queue never hands out an entity that is still
//!   active or that still has live tasks from its previous use.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

use bevy::prelude::*;
use thiserror::Error;

use crate::plugins::tasks::TaskScopes;

use super::components::{KindId, KindTag, Poolable, Pooled, RegistryId, SlotState};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("a pool for {0} already exists")]
    DuplicateKind(KindId),
    #[error("no pool registered for {0}")]
    UnknownKind(KindId),
    #[error("{entity} is a {kind}, which has no registered pool")]
    NotPooled { entity: Entity, kind: KindId },
    #[error("{0} was not produced by this registry")]
    ForeignEntity(Entity),
    #[error("{0} is already queued in its pool")]
    DoubleRelease(Entity),
    #[error("factory for {kind} built an entity without the {kind} component")]
    InvalidPrefab { kind: KindId },
    #[error("no PoolRegistry resource in the world")]
    MissingRegistry,
}

type Factory = Box<dyn Fn(&mut World) -> Entity + Send + Sync>;
type Hook = fn(&mut EntityWorldMut<'_>);

fn has_kind<K: Component>(entity: &EntityWorldMut<'_>) -> bool {
    entity.contains::<K>()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub produced: usize,
    pub queued: usize,
    pub active: usize,
}

struct Pool {
    kind: KindId,
    free: VecDeque<Entity>,
    members: HashSet<Entity>,
    factory: Factory,
    parent: Option<Entity>,
    has_kind: fn(&EntityWorldMut<'_>) -> bool,
    on_spawned: Hook,
    on_despawned: Hook,
}

impl Pool {
    /// Build one member. It is left `Queued` but not yet in the free queue.
    fn construct(&mut self, world: &mut World, registry: RegistryId) -> Result<Entity, PoolError> {
        let entity = (self.factory)(world);
        let Ok(mut e) = world.get_entity_mut(entity) else {
            return Err(PoolError::InvalidPrefab { kind: self.kind });
        };
        if !(self.has_kind)(&e) {
            e.despawn();
            return Err(PoolError::InvalidPrefab { kind: self.kind });
        }

        e.insert((
            KindTag(self.kind),
            Pooled {
                registry,
                state: SlotState::Queued,
            },
        ));
        if !e.contains::<TaskScopes>() {
            e.insert(TaskScopes::default());
        }
        if !e.contains::<Transform>() {
            e.insert(Transform::default());
        }
        if let Some(parent) = self.parent {
            e.insert(ChildOf(parent));
        }

        self.members.insert(entity);
        Ok(entity)
    }

    fn deactivate(&self, e: &mut EntityWorldMut<'_>) {
        if let Some(mut scopes) = e.get_mut::<TaskScopes>() {
            scopes.cancel_all();
        }
        (self.on_despawned)(e);
        if let Some(mut slot) = e.get_mut::<Pooled>() {
            slot.state = SlotState::Queued;
        }
    }

    /// Forget members despawned outside the pool.
    fn prune(&mut self, world: &World) {
        let before = self.members.len();
        self.members.retain(|e| world.get_entity(*e).is_ok());
        if self.members.len() != before {
            let members = &self.members;
            self.free.retain(|e| members.contains(e));
            warn!(
                "{} pool dropped {} members despawned outside the pool",
                self.kind,
                before - self.members.len()
            );
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            produced: self.members.len(),
            queued: self.free.len(),
            active: self.members.len() - self.free.len(),
        }
    }
}

static NEXT_REGISTRY: AtomicU32 = AtomicU32::new(0);

/// One pool per kind. Lives as a single app-wide resource.
#[derive(Resource)]
pub struct PoolRegistry {
    id: RegistryId,
    pools: HashMap<KindId, Pool>,
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self {
            id: RegistryId(NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed)),
            pools: HashMap::new(),
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    pub fn contains(&self, kind: KindId) -> bool {
        self.pools.contains_key(&kind)
    }

    /// Register `K` and pre-build `initial` deactivated members.
    ///
    /// On failure nothing is registered and any members already built are despawned.
    pub fn create<K, F>(
        &mut self,
        world: &mut World,
        factory: F,
        initial: usize,
        parent: Option<Entity>,
    ) -> Result<(), PoolError>
    where
        K: Poolable,
        F: Fn(&mut World) -> Entity + Send + Sync + 'static,
    {
        let kind = KindId::of::<K>();
        if self.pools.contains_key(&kind) {
            warn!("pool for {kind} already exists; keeping the original");
            return Err(PoolError::DuplicateKind(kind));
        }

        let parent = parent.filter(|p| {
            let exists = world.get_entity(*p).is_ok();
            if !exists {
                warn!("pool parent {p} for {kind} does not exist; members stay top-level");
            }
            exists
        });

        let mut pool = Pool {
            kind,
            free: VecDeque::with_capacity(initial),
            members: HashSet::with_capacity(initial),
            factory: Box::new(factory),
            parent,
            has_kind: has_kind::<K>,
            on_spawned: K::on_spawned,
            on_despawned: K::on_despawned,
        };

        for _ in 0..initial {
            match pool.construct(world, self.id) {
                Ok(entity) => {
                    if let Ok(mut e) = world.get_entity_mut(entity) {
                        pool.deactivate(&mut e);
                    }
                    pool.free.push_back(entity);
                }
                Err(err) => {
                    for entity in pool.members.drain() {
                        world.despawn(entity);
                    }
                    return Err(err);
                }
            }
        }

        debug!("created {kind} pool with {initial} members");
        self.pools.insert(kind, pool);
        Ok(())
    }

    pub fn spawn<K: Poolable>(
        &mut self,
        world: &mut World,
        translation: Vec3,
        rotation: Quat,
    ) -> Result<Entity, PoolError> {
        self.spawn_kind(world, KindId::of::<K>(), translation, rotation)
    }

    /// Hand out a queued member of `kind`, building a new one if none is free.
    pub fn spawn_kind(
        &mut self,
        world: &mut World,
        kind: KindId,
        translation: Vec3,
        rotation: Quat,
    ) -> Result<Entity, PoolError> {
        let registry = self.id;
        let pool = self
            .pools
            .get_mut(&kind)
            .ok_or(PoolError::UnknownKind(kind))?;
        pool.prune(world);

        let entity = loop {
            match pool.free.pop_front() {
                Some(e) if world.get_entity(e).is_ok() => break e,
                Some(e) => {
                    warn!("{kind} pool discarded {e}: despawned while queued");
                    pool.members.remove(&e);
                }
                None => break pool.construct(world, registry)?,
            }
        };

        let mut e = world
            .get_entity_mut(entity)
            .map_err(|_| PoolError::ForeignEntity(entity))?;
        if let Some(mut tf) = e.get_mut::<Transform>() {
            tf.translation = translation;
            tf.rotation = rotation;
        }
        if let Some(mut slot) = e.get_mut::<Pooled>() {
            slot.state = SlotState::Active;
        }
        (pool.on_spawned)(&mut e);
        Ok(entity)
    }

    /// Deactivate `entity` and queue it for reuse.
    pub fn release(&mut self, world: &mut World, entity: Entity) -> Result<(), PoolError> {
        let registry = self.id;
        let kind = world
            .get_entity(entity)
            .ok()
            .and_then(|e| e.get::<KindTag>())
            .map(|tag| tag.0)
            .ok_or(PoolError::ForeignEntity(entity))?;
        let pool = self
            .pools
            .get_mut(&kind)
            .ok_or(PoolError::NotPooled { entity, kind })?;
        pool.prune(world);

        let mut e = world
            .get_entity_mut(entity)
            .map_err(|_| PoolError::ForeignEntity(entity))?;

        let state = e
            .get::<Pooled>()
            .filter(|slot| slot.registry == registry && pool.members.contains(&entity))
            .map(|slot| slot.state)
            .ok_or(PoolError::ForeignEntity(entity))?;
        if state == SlotState::Queued {
            warn!("{entity} released twice; {kind} queue left unchanged");
            return Err(PoolError::DoubleRelease(entity));
        }

        pool.deactivate(&mut e);
        pool.free.push_back(entity);
        Ok(())
    }

    /// Counts as of the last `spawn` or `release` of `kind`; members despawned
    /// outside the pool are dropped at that point.
    pub fn stats(&self, kind: KindId) -> Option<PoolStats> {
        self.pools.get(&kind).map(Pool::stats)
    }

    pub fn stats_of<K: Poolable>(&self) -> Option<PoolStats> {
        self.stats(KindId::of::<K>())
    }

    /// Members currently in the free queue, front first.
    pub fn queued(&self, kind: KindId) -> impl Iterator<Item = Entity> + '_ {
        self.pools
            .get(&kind)
            .into_iter()
            .flat_map(|pool| pool.free.iter().copied())
    }

    /// Every member the pool has produced.
    pub fn members(&self, kind: KindId) -> impl Iterator<Item = Entity> + '_ {
        self.pools
            .get(&kind)
            .into_iter()
            .flat_map(|pool| pool.members.iter().copied())
    }

    /// Despawn every member of every pool and forget the pools.
    ///
    /// Despawning drops each member's `TaskScopes`, which triggers all of
    /// their signals; the runner sweeps the tasks on its next pass.
    pub fn teardown(&mut self, world: &mut World) {
        for (kind, pool) in self.pools.drain() {
            let count = pool.members.len();
            for entity in pool.members {
                world.despawn(entity);
            }
            info!("tore down {kind} pool ({count} members)");
        }
    }
}

/// Registry operations on a `World`.
///
/// The registry resource is taken out of the world for the duration of the
/// call, so factories and hooks cannot re-enter these methods.
pub trait PoolWorldExt {
    fn create_pool<K, F>(
        &mut self,
        factory: F,
        initial: usize,
        parent: Option<Entity>,
    ) -> Result<(), PoolError>
    where
        K: Poolable,
        F: Fn(&mut World) -> Entity + Send + Sync + 'static;

    fn spawn_pooled<K: Poolable>(
        &mut self,
        translation: Vec3,
        rotation: Quat,
    ) -> Result<Entity, PoolError>;

    fn release_pooled(&mut self, entity: Entity) -> Result<(), PoolError>;

    fn teardown_pools(&mut self) -> Result<(), PoolError>;
}

fn with_registry<T>(
    world: &mut World,
    f: impl FnOnce(&mut World, &mut PoolRegistry) -> Result<T, PoolError>,
) -> Result<T, PoolError> {
    if !world.contains_resource::<PoolRegistry>() {
        return Err(PoolError::MissingRegistry);
    }
    world.resource_scope(|world, mut registry: Mut<PoolRegistry>| f(world, &mut registry))
}

impl PoolWorldExt for World {
    fn create_pool<K, F>(
        &mut self,
        factory: F,
        initial: usize,
        parent: Option<Entity>,
    ) -> Result<(), PoolError>
    where
        K: Poolable,
        F: Fn(&mut World) -> Entity + Send + Sync + 'static,
    {
        with_registry(self, |world, registry| {
            registry.create::<K, F>(world, factory, initial, parent)
        })
    }

    fn spawn_pooled<K: Poolable>(
        &mut self,
        translation: Vec3,
        rotation: Quat,
    ) -> Result<Entity, PoolError> {
        with_registry(self, |world, registry| {
            registry.spawn::<K>(world, translation, rotation)
        })
    }

    fn release_pooled(&mut self, entity: Entity) -> Result<(), PoolError> {
        with_registry(self, |world, registry| registry.release(world, entity))
    }

    fn teardown_pools(&mut self) -> Result<(), PoolError> {
        with_registry(self, |world, registry| {
            registry.teardown(world);
            Ok(())
        })
    }
}
