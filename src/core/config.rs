//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every timer is expressed in ticks
//! so a run is deterministic regardless of frame rate.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::Vec2;
use crate::goods::Item;
use crate::tiles::NodeKind;

/// Configuration for the simulation systems
///
/// These values have been tuned so a small village settles into a steady
/// fish-and-chips economy within a few thousand ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === SPACE & TIME ===
    /// Edge length of one grid cell in world units
    pub tile_size: f32,

    /// Simulated seconds per tick
    ///
    /// Movement integrates `velocity * tick_seconds`; nothing reads a wall clock.
    pub tick_seconds: f32,

    /// Walking speed shared by every agent (world units per second)
    pub base_speed: f32,

    /// Arrival radius for precise node interaction (claiming, buying, depositing)
    pub arrive_precise: f32,

    /// Arrival radius for loose travel (going home, idling near a workbench)
    pub arrive_loose: f32,

    // === ROLE TIMERS (ticks) ===
    /// Time a fisher spends at the water per catch
    pub fishing_ticks: u32,

    /// Time a farmer spends drawing water
    pub irrigate_ticks: u32,

    /// Time a crop needs on the plot after irrigation
    pub grow_ticks: u32,

    /// Time a chef stands at the fryer per meal
    pub cook_ticks: u32,

    /// Time a builder needs on site to finish a blueprint
    pub construction_ticks: u32,

    /// Pause between restock checks when the table is well stocked
    pub restock_idle_ticks: u32,

    // === SUPPLY CHAIN ===
    /// A stock table below this many fresh units triggers a restock run
    pub restock_low_water: i32,

    /// Units a restocker buys back per run
    pub restock_batch: i32,

    /// Units a courier carries per trip
    pub courier_capacity: i32,

    /// How far below zero a register's fresh count may go
    ///
    /// A negative count is a back-order: a consumer took a unit that has been
    /// promised but not yet delivered. The next delivery fills the hole.
    pub max_back_orders: i32,

    /// Registers spoil one unit of each perishable item every this many ticks
    pub spoil_interval: u64,

    // === FALLBACK ROLE ===
    /// How far an unassigned villager looks for a free node (world units)
    pub fallback_scan_radius: f32,

    /// Node kinds an unassigned villager will consider, in preference order
    ///
    /// Proximity wins; the order only breaks distance ties.
    pub fallback_nodes: Vec<NodeKind>,

    // === LEDGER ===
    /// Number of recent transfers kept in the audit log
    pub ledger_history: usize,

    /// Opening balance of the household account
    pub household_starting_money: i64,

    /// Pocket money a villager arrives with (restockers buy stock from it)
    pub villager_starting_money: i64,

    // === CONSTRUCTION ===
    /// Builders asking more than this refuse to be commandeered
    pub max_builder_wage: i64,

    /// Hire a day laborer when the village has no builder at all
    pub hire_laborers: bool,

    /// Where hired laborers walk in from (and leave to)
    pub laborer_spawn: Vec2,

    // === CONSUMERS ===
    /// Reputation change when a customer receives fresh stock
    pub reputation_fresh: i64,

    /// Reputation change when a customer receives spoiled stock
    pub reputation_spoiled: i64,

    /// Satisfaction gained eating a fresh item at home
    pub satisfaction_fresh: u32,

    /// Satisfaction gained from a spoiled item (it gets thrown out)
    pub satisfaction_spoiled: u32,

    // === PRICES ===
    /// Tiered wage schedule for node occupants
    pub pricing: PricingTiers,

    /// Register sale price per item
    pub prices: PriceList,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            // 16px tiles, 10 ticks per simulated second
            tile_size: 16.0,
            tick_seconds: 0.1,
            base_speed: 40.0,
            arrive_precise: 2.0,
            arrive_loose: 8.0,

            // Timers
            fishing_ticks: 30,
            irrigate_ticks: 20,
            grow_ticks: 50,
            cook_ticks: 25,
            construction_ticks: 40,
            restock_idle_ticks: 10,

            // Supply chain
            restock_low_water: 2,
            restock_batch: 3,
            courier_capacity: 3,
            max_back_orders: 1,
            spoil_interval: 300,

            // Fallback
            fallback_scan_radius: 400.0,
            fallback_nodes: vec![
                NodeKind::FishingRod,
                NodeKind::CropPlot,
                NodeKind::Fryer,
                NodeKind::StockTable,
                NodeKind::Cart,
                NodeKind::Workbench,
            ],

            // Ledger
            ledger_history: 64,
            household_starting_money: 500,
            villager_starting_money: 20,

            // Construction
            max_builder_wage: 60,
            hire_laborers: true,
            laborer_spawn: Vec2::new(0.0, 0.0),

            // Consumers
            reputation_fresh: 1,
            reputation_spoiled: -2,
            satisfaction_fresh: 10,
            satisfaction_spoiled: 2,

            pricing: PricingTiers::default(),
            prices: PriceList::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document; missing keys keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate().map_err(SimError::Config)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tick_seconds <= 0.0 || self.base_speed <= 0.0 || self.tile_size <= 0.0 {
            return Err("tile_size, tick_seconds and base_speed must be positive".into());
        }

        // A step must never jump over the precise radius entirely
        if self.arrive_precise >= self.arrive_loose {
            return Err(format!(
                "arrive_precise ({}) should be < arrive_loose ({})",
                self.arrive_precise, self.arrive_loose
            ));
        }

        if self.restock_batch <= 0 || self.courier_capacity <= 0 {
            return Err("restock_batch and courier_capacity must be positive".into());
        }

        if self.max_back_orders < 0 {
            return Err("max_back_orders cannot be negative".into());
        }

        if self.spoil_interval == 0 || self.ledger_history == 0 {
            return Err("spoil_interval and ledger_history must be non-zero".into());
        }

        if self.pricing.steps.iter().any(|s| s.count == 0) {
            return Err("pricing tier steps need a non-zero count".into());
        }

        Ok(())
    }
}

/// One band of the tiered wage schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStep {
    /// How many consecutive occupants fall in this band
    pub count: usize,
    /// Increment each of them adds to the running price
    pub increment: i64,
}

/// Tiered pricing: the Nth occupant of a node kind earns `base` plus the
/// cumulative increments of ranks 1..=N
///
/// Defaults give 13, 18, 23, 28, 38, 48, 58, 108, 158, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingTiers {
    pub base: i64,
    pub steps: Vec<TierStep>,
    /// Increment for every rank past the last band
    pub overflow: i64,
}

impl Default for PricingTiers {
    fn default() -> Self {
        Self {
            base: 8,
            steps: vec![
                TierStep { count: 4, increment: 5 },
                TierStep { count: 3, increment: 10 },
            ],
            overflow: 50,
        }
    }
}

impl PricingTiers {
    pub fn new(base: i64, steps: Vec<TierStep>, overflow: i64) -> Self {
        Self { base, steps, overflow }
    }

    /// Increment contributed by the occupant at `rank` (1-based)
    pub fn increment(&self, rank: usize) -> i64 {
        let mut upper = 0;
        for step in &self.steps {
            upper += step.count;
            if rank <= upper {
                return step.increment;
            }
        }
        self.overflow
    }

    /// Price for the occupant at `rank` (1-based)
    pub fn price_for_rank(&self, rank: usize) -> i64 {
        self.base + (1..=rank).map(|r| self.increment(r)).sum::<i64>()
    }
}

/// Register sale prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceList {
    pub fish: i64,
    pub potato: i64,
    pub carrot: i64,
    pub cabbage: i64,
    pub meal: i64,
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            fish: 6,
            potato: 3,
            carrot: 3,
            cabbage: 4,
            meal: 12,
        }
    }
}

impl PriceList {
    pub fn sale_price(&self, item: Item) -> i64 {
        match item {
            Item::Fish => self.fish,
            Item::Potato => self.potato,
            Item::Carrot => self.carrot,
            Item::Cabbage => self.cabbage,
            Item::Meal => self.meal,
        }
    }
}
