//! ECS World - owns the entity store, the tile grid and the ledger

use crate::construction::BlueprintQueue;
use crate::core::config::SimulationConfig;
use crate::core::types::{CellCoord, EntityId, Tick, Vec2};
use crate::ecs::components::{
    Demand, Home, HouseholdAccount, HouseholdProxy, Money, Position, Supply, Unassigned, Velocity,
};
use crate::ecs::store::EntityStore;
use crate::goods::{Good, Item};
use crate::ledger::{household_account, resolve_account, Ledger, TransferOutcome};
use crate::roles::RoleState;
use crate::simulation::SimulationEvent;
use crate::tiles::{Inventory, Layout, TileGrid};

/// The simulated village
pub struct World {
    pub current_tick: Tick,
    pub store: EntityStore,
    pub grid: TileGrid,
    pub ledger: Ledger,
    pub blueprints: BlueprintQueue,
    pub config: SimulationConfig,
    /// Aggregate shop reputation, moved by every purchase
    pub reputation: i64,
    events: Vec<SimulationEvent>,
}

impl World {
    /// Empty grass map of `rows` x `cols`
    pub fn new(rows: usize, cols: usize, config: SimulationConfig) -> Self {
        let grid = TileGrid::new(rows, cols, config.tile_size, config.pricing.clone());
        Self::with_grid(grid, config)
    }

    pub fn from_layout(layout: Layout, config: SimulationConfig) -> Self {
        let grid = layout.into_grid(config.tile_size, config.pricing.clone());
        Self::with_grid(grid, config)
    }

    fn with_grid(grid: TileGrid, config: SimulationConfig) -> Self {
        Self {
            current_tick: 0,
            store: EntityStore::new(),
            grid,
            ledger: Ledger::new(config.ledger_history),
            blueprints: BlueprintQueue::new(),
            config,
            reputation: 0,
            events: Vec::new(),
        }
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }

    pub fn emit(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn household(&self) -> Option<EntityId> {
        household_account(&self.store)
    }

    /// Create the household account, or return the existing one
    pub fn spawn_household(&mut self) -> EntityId {
        if let Some(existing) = self.household() {
            return existing;
        }
        let id = self.store.create();
        self.store.attach(id, HouseholdAccount);
        self.store.attach(
            id,
            Money {
                amount: self.config.household_starting_money,
            },
        );
        id
    }

    /// Villager without a role; the fallback logic will find it a node
    pub fn spawn_villager(&mut self, pos: Vec2) -> EntityId {
        let id = self.spawn_agent(pos, self.config.villager_starting_money);
        self.store.attach(id, Unassigned);
        id
    }

    /// Customer living at `home` who repeatedly buys `good`
    pub fn spawn_consumer(&mut self, home: Vec2, good: Item, reservation_price: i64, money: i64) -> EntityId {
        let id = self.spawn_agent(home, money);
        self.store.attach(id, Home(home));
        self.store.attach(id, Demand::new(good, reservation_price));
        id
    }

    /// Freelance builder with no workbench
    pub fn spawn_builder(&mut self, pos: Vec2, reservation_price: i64) -> EntityId {
        let id = self.spawn_agent(pos, 0);
        self.store.attach(
            id,
            Supply {
                good: Good::Construction,
                reservation_price,
                quantity: 0,
                node: None,
                role: RoleState::Builder,
            },
        );
        id
    }

    fn spawn_agent(&mut self, pos: Vec2, money: i64) -> EntityId {
        let id = self.store.create();
        self.store.attach(id, Position(pos));
        self.store.attach(id, Velocity::default());
        self.store.attach(id, Inventory::new());
        self.store.attach(id, Money { amount: money });
        id
    }

    /// Route an agent's money flows through the household account
    pub fn make_household_proxy(&mut self, id: EntityId) -> bool {
        self.store.attach(id, HouseholdProxy)
    }

    /// Move money between two parties. Rejected transfers are logged and
    /// leave every balance untouched.
    pub fn pay(&mut self, from: EntityId, to: EntityId, amount: i64) -> bool {
        match self
            .ledger
            .transfer(&mut self.store, self.current_tick, from, to, amount)
        {
            Ok(TransferOutcome::Moved { payer, payee }) => {
                tracing::trace!(%payer, %payee, amount, "transfer");
                true
            }
            Ok(TransferOutcome::SameAccount) => true,
            Err(error) => {
                tracing::warn!(%from, %to, amount, %error, "transfer rejected");
                false
            }
        }
    }

    /// Who gets the proceeds of a node: its claimant, else the household
    pub fn seller_of(&self, coord: CellCoord) -> Option<EntityId> {
        self.grid.claimant(coord).or_else(|| self.household())
    }

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.store.get::<Position>(id).map(|p| p.0)
    }

    /// Balance of an agent's own account (0 without one)
    pub fn money(&self, id: EntityId) -> i64 {
        self.store.get::<Money>(id).map_or(0, |m| m.amount)
    }

    /// Whether a transfer of `amount` from `id` would go through. Proxies
    /// spend from the household, which may overdraw.
    pub fn can_afford(&self, id: EntityId, amount: i64) -> bool {
        match resolve_account(&self.store, id) {
            Ok(account) if self.store.contains::<HouseholdAccount>(account) => true,
            Ok(account) => self.store.get::<Money>(account).is_some_and(|m| m.amount >= amount),
            Err(_) => false,
        }
    }

    pub fn inventory_mut(&mut self, id: EntityId) -> Option<&mut Inventory> {
        self.store.get_mut::<Inventory>(id)
    }

    /// Fresh count of `item` an agent carries
    pub fn carried(&self, id: EntityId, item: Item) -> i32 {
        self.store.get::<Inventory>(id).map_or(0, |inv| inv.fresh(item))
    }
}
