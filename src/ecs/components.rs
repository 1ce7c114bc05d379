//! Component records attached to entities
//!
//! Components are plain data. Role state machines live in `roles`; here
//! they only appear as the `role`/`state` fields the machines read back.

use serde::{Deserialize, Serialize};

use crate::core::types::{CellCoord, Vec2};
use crate::goods::{Good, Item};
use crate::roles::{DemandState, RoleState};

/// World position, integrated every tick by the movement system
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

/// Set by role logic to aim at a target; zeroed after integration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

/// Marks an entity as a producer of `good`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub good: Good,
    /// Wage this producer is paid per unit of work, set by its occupancy rank
    pub reservation_price: i64,
    /// Units supplied over the producer's lifetime
    pub quantity: i32,
    /// Back-reference to the claimed node (the tile's `claimed` is the other end)
    pub node: Option<CellCoord>,
    pub role: RoleState,
}

/// Marks an entity as a consumer of `good`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub good: Item,
    /// Most this consumer will pay for one unit
    pub reservation_price: i64,
    /// Units bought over the consumer's lifetime
    pub quantity: i32,
    /// Queue slot; bound once and kept for the consumer's lifetime
    pub locked_carpet: Option<CellCoord>,
    /// Sale node for the current purchase cycle
    pub locked_register: Option<CellCoord>,
    pub state: DemandState,
    pub satisfaction: u32,
}

impl Demand {
    pub fn new(good: Item, reservation_price: i64) -> Self {
        Self {
            good,
            reservation_price,
            quantity: 0,
            locked_carpet: None,
            locked_register: None,
            state: DemandState::Unbound,
            satisfaction: 0,
        }
    }
}

/// Per-agent balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
}

/// Countdown gate: while `until > 0` the entity's role logic is suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waiting {
    pub until: u32,
}

/// Villager without a role; the fallback logic finds it a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unassigned;

/// The single account representing the off-map household
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdAccount;

/// Agent whose money flows are redirected to the household account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdProxy;

/// Where a consumer takes its purchases
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Home(pub Vec2);
