use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use bevy::prelude::*;

/// Runtime identity of a poolable kind: the marker component's type.
#[derive(Clone, Copy, Debug)]
pub struct KindId {
    type_id: TypeId,
    name: &'static str,
}

impl KindId {
    pub fn of<K: 'static>() -> Self {
        let full = type_name::<K>();
        Self {
            type_id: TypeId::of::<K>(),
            name: full.rsplit("::").next().unwrap_or(full),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for KindId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for KindId {}

impl Hash for KindId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The pool key an entity belongs to. Added by the pool on construction;
/// entities built outside a pool may carry it to declare their kind.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindTag(pub KindId);

impl KindTag {
    pub fn of<K: 'static>() -> Self {
        Self(KindId::of::<K>())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistryId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Queued,
    Active,
}

/// Pool membership of an entity. Written only by the registry.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pooled {
    pub(crate) registry: RegistryId,
    pub(crate) state: SlotState,
}

impl Pooled {
    #[inline]
    pub fn state(&self) -> SlotState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == SlotState::Active
    }
}

/// Capability contract of a pooled kind. `Self` is the kind's marker component.
///
/// The registry calls `on_spawned` after popping and positioning an entity and
/// `on_despawned` after cancelling its task scopes on release (and once right
/// after construction). Both run with exclusive world access and must not
/// spawn or release pooled entities themselves.
pub trait Poolable: Component {
    fn on_spawned(entity: &mut EntityWorldMut) {
        entity.insert(Visibility::Visible);
    }

    /// Must be idempotent.
    fn on_despawned(entity: &mut EntityWorldMut) {
        entity.insert(Visibility::Hidden);
    }
}
