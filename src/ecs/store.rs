//! Sparse entity-component store
//!
//! Every component kind gets its own sparse map keyed by `EntityId`.
//! Multi-component queries walk the smallest map and probe the others, so
//! asking for `[Supply, Position]` costs one pass over the producers rather
//! than over everything that has a position.

use ahash::{AHashMap, AHashSet};
use derive_more::Display;

use crate::construction::ConstructionTask;
use crate::core::types::EntityId;
use crate::ecs::components::{
    Demand, Home, HouseholdAccount, HouseholdProxy, Money, Position, Supply, Unassigned, Velocity,
    Waiting,
};
use crate::tiles::Inventory;

/// Name of a component record, used in queries
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Position,
    Velocity,
    Supply,
    Demand,
    Inventory,
    Money,
    ConstructionTask,
    Waiting,
    Unassigned,
    HouseholdAccount,
    HouseholdProxy,
    Home,
}

/// A type that can be attached to an entity
pub trait Component: Sized + 'static {
    const KIND: ComponentKind;
    fn storage(store: &EntityStore) -> &ComponentMap<Self>;
    fn storage_mut(store: &mut EntityStore) -> &mut ComponentMap<Self>;
}

/// Sparse map from entity to one component record
#[derive(Debug, Clone)]
pub struct ComponentMap<T> {
    records: AHashMap<EntityId, T>,
}

impl<T> Default for ComponentMap<T> {
    fn default() -> Self {
        Self {
            records: AHashMap::new(),
        }
    }
}

impl<T> ComponentMap<T> {
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.records.get_mut(&id)
    }

    /// Iterate records in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.records.iter().map(|(id, record)| (*id, record))
    }
}

/// Kind-erased view used by queries
trait ErasedStorage {
    fn len(&self) -> usize;
    fn contains(&self, id: EntityId) -> bool;
    fn ids(&self) -> Vec<EntityId>;
}

impl<T> ErasedStorage for ComponentMap<T> {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn contains(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    fn ids(&self) -> Vec<EntityId> {
        self.records.keys().copied().collect()
    }
}

macro_rules! component_store {
    ($($ty:ty => $kind:ident, $field:ident;)*) => {
        /// Registry of live entities and their component records
        #[derive(Debug, Clone)]
        pub struct EntityStore {
            next_id: u32,
            alive: AHashSet<EntityId>,
            $($field: ComponentMap<$ty>,)*
        }

        impl Default for EntityStore {
            fn default() -> Self {
                Self {
                    next_id: 1,
                    alive: AHashSet::new(),
                    $($field: ComponentMap::default(),)*
                }
            }
        }

        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$kind;

                fn storage(store: &EntityStore) -> &ComponentMap<Self> {
                    &store.$field
                }

                fn storage_mut(store: &mut EntityStore) -> &mut ComponentMap<Self> {
                    &mut store.$field
                }
            }
        )*

        impl EntityStore {
            fn erased(&self, kind: ComponentKind) -> &dyn ErasedStorage {
                match kind {
                    $(ComponentKind::$kind => &self.$field,)*
                }
            }

            fn detach_all(&mut self, id: EntityId) {
                $(self.$field.records.remove(&id);)*
            }
        }
    };
}

component_store! {
    Position => Position, positions;
    Velocity => Velocity, velocities;
    Supply => Supply, supplies;
    Demand => Demand, demands;
    Inventory => Inventory, inventories;
    Money => Money, money;
    ConstructionTask => ConstructionTask, construction_tasks;
    Waiting => Waiting, waiting;
    Unassigned => Unassigned, unassigned;
    HouseholdAccount => HouseholdAccount, household_accounts;
    HouseholdProxy => HouseholdProxy, household_proxies;
    Home => Home, homes;
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh entity with no components
    pub fn create(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.alive.insert(id);
        id
    }

    /// Remove an entity and every component attached to it
    pub fn destroy(&mut self, id: EntityId) -> bool {
        if !self.alive.remove(&id) {
            return false;
        }
        self.detach_all(id);
        true
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.alive.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Attach (or replace) a component. Ignored for dead entities.
    pub fn attach<C: Component>(&mut self, id: EntityId, component: C) -> bool {
        if !self.is_alive(id) {
            tracing::warn!(entity = %id, kind = %C::KIND, "attach to dead entity ignored");
            return false;
        }
        C::storage_mut(self).records.insert(id, component);
        true
    }

    pub fn detach<C: Component>(&mut self, id: EntityId) -> Option<C> {
        C::storage_mut(self).records.remove(&id)
    }

    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        C::storage(self).get(id)
    }

    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        C::storage_mut(self).get_mut(id)
    }

    pub fn contains<C: Component>(&self, id: EntityId) -> bool {
        C::storage(self).records.contains_key(&id)
    }

    /// Direct access to one component map
    pub fn components<C: Component>(&self) -> &ComponentMap<C> {
        C::storage(self)
    }

    /// True if the entity carries every named component
    pub fn has(&self, id: EntityId, kinds: &[ComponentKind]) -> bool {
        self.is_alive(id) && kinds.iter().all(|kind| self.erased(*kind).contains(id))
    }

    /// Entities carrying every named component, in ascending id order
    ///
    /// Candidates come from the smallest map; the rest are probed.
    pub fn query(&self, kinds: &[ComponentKind]) -> Vec<EntityId> {
        let mut maps: Vec<&dyn ErasedStorage> = kinds.iter().map(|k| self.erased(*k)).collect();
        maps.sort_by_key(|map| map.len());

        let mut result: Vec<EntityId> = match maps.split_first() {
            Some((smallest, rest)) => smallest
                .ids()
                .into_iter()
                .filter(|id| rest.iter().all(|map| map.contains(*id)))
                .collect(),
            None => self.alive.iter().copied().collect(),
        };
        result.sort_unstable();
        result
    }
}
