//! Construction task pipeline
//!
//! A placed blueprint is queued and handed to the nearest idle builder
//! willing to work for at most `max_builder_wage`. The worker travels to the
//! site, builds for `construction_ticks`, gets paid by the household, then
//! either moves straight on to the next unassigned blueprint or walks back
//! to where it started and is released.

use std::collections::VecDeque;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{CellCoord, EntityId, Tick, Vec2};
use crate::ecs::components::{Supply, Waiting};
use crate::ecs::store::ComponentKind;
use crate::ecs::World;
use crate::goods::Good;
use crate::roles::movement::steer;
use crate::simulation::SimulationEvent;
use crate::tiles::TileGrid;

/// Where a worker builds: a grid cell, or a free-form world point from
/// the input layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstructionTarget {
    Cell(CellCoord),
    Point(Vec2),
}

impl ConstructionTarget {
    pub fn position(&self, grid: &TileGrid) -> Vec2 {
        match self {
            ConstructionTarget::Cell(coord) => grid.cell_center(*coord),
            ConstructionTarget::Point(pos) => *pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructionPhase {
    Traveling,
    Constructing { started: Tick },
    Returning,
}

/// Marks a worker as mid-build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionTask {
    /// Blueprint cell being built
    pub site: CellCoord,
    pub target: ConstructionTarget,
    pub phase: ConstructionPhase,
    /// Where the worker was commandeered; it walks back here when done
    pub origin: Vec2,
    /// Hired for this job only; despawned on release
    pub laborer: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub site: CellCoord,
    pub target: ConstructionTarget,
    pub worker: Option<EntityId>,
    pub placed: Tick,
}

/// Unfinished blueprints in placement order
#[derive(Debug, Clone, Default)]
pub struct BlueprintQueue {
    pending: VecDeque<Blueprint>,
}

impl BlueprintQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, blueprint: Blueprint) {
        self.pending.push_back(blueprint);
    }

    /// Drop a blueprint (finished or demolished)
    pub fn remove(&mut self, site: CellCoord) -> Option<Blueprint> {
        let idx = self.pending.iter().position(|b| b.site == site)?;
        self.pending.remove(idx)
    }

    pub fn get(&self, site: CellCoord) -> Option<&Blueprint> {
        self.pending.iter().find(|b| b.site == site)
    }

    /// Oldest blueprint nobody is working on
    pub fn next_unassigned(&self) -> Option<&Blueprint> {
        self.pending.iter().find(|b| b.worker.is_none())
    }

    pub fn assign(&mut self, site: CellCoord, worker: EntityId) {
        if let Some(blueprint) = self.pending.iter_mut().find(|b| b.site == site) {
            blueprint.worker = Some(worker);
        }
    }

    /// Put every blueprint held by `worker` back up for grabs
    pub fn release_worker(&mut self, worker: EntityId) {
        for blueprint in self.pending.iter_mut().filter(|b| b.worker == Some(worker)) {
            blueprint.worker = None;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blueprint> + '_ {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Queue a fresh blueprint and try to staff it immediately
///
/// Returns the worker put on the job, if any.
pub fn commission(world: &mut World, site: CellCoord, target: ConstructionTarget) -> Option<EntityId> {
    world.blueprints.push(Blueprint {
        site,
        target,
        worker: None,
        placed: world.current_tick,
    });

    let site_pos = target.position(&world.grid);
    match staff(world, site, site_pos) {
        Ok((worker, laborer)) => {
            start_task(world, worker, site, target, laborer);
            Some(worker)
        }
        Err(error) => {
            tracing::debug!(%error, "blueprint left unbuilt");
            None
        }
    }
}

/// Pick who builds `site`: the nearest idle willing builder, else a hired
/// laborer when the village has no builder at all. A refusal is voiced as
/// speech; busy builders just leave the blueprint queued.
fn staff(world: &mut World, site: CellCoord, site_pos: Vec2) -> Result<(EntityId, bool)> {
    if let Some(worker) = idle_builder(world, site_pos, true) {
        return Ok((worker, false));
    }
    let any_builder = world
        .store
        .components::<Supply>()
        .iter()
        .any(|(_, s)| s.good == Good::Construction);
    if !any_builder && world.config.hire_laborers {
        return Ok((hire_laborer(world), true));
    }

    let (entity, text) = match idle_builder(world, site_pos, false) {
        Some(greedy) => {
            let asking = world
                .store
                .get::<Supply>(greedy)
                .map_or(0, |s| s.reservation_price);
            (Some(greedy), format!("I won't build for less than {asking}"))
        }
        None if !any_builder => (None, "Nobody in the village can build that".to_string()),
        None => return Err(SimError::NoEligibleWorker { coord: site }),
    };
    tracing::info!(%site, ?entity, %text, "nobody will build");
    world.emit(SimulationEvent::Speech { entity, text });
    Err(SimError::NoEligibleWorker { coord: site })
}

/// Nearest builder with no task; `willing` also requires an acceptable wage
fn idle_builder(world: &World, site: Vec2, willing: bool) -> Option<EntityId> {
    let max_wage = world.config.max_builder_wage;
    world
        .store
        .query(&[ComponentKind::Supply, ComponentKind::Position])
        .into_iter()
        .filter(|id| !world.store.contains::<ConstructionTask>(*id))
        .filter(|id| {
            world.store.get::<Supply>(*id).is_some_and(|s| {
                s.good == Good::Construction && (!willing || s.reservation_price <= max_wage)
            })
        })
        .min_by_key(|id| {
            let distance = world.position(*id).map_or(f32::MAX, |p| p.distance(&site));
            (OrderedFloat(distance), *id)
        })
}

fn hire_laborer(world: &mut World) -> EntityId {
    let wage = world.grid.occupancy().tiers().price_for_rank(1);
    let spawn = world.config.laborer_spawn;
    let laborer = world.spawn_builder(spawn, wage);
    tracing::info!(entity = %laborer, wage, "day laborer hired");
    world.emit(SimulationEvent::LaborerHired { entity: laborer, wage });
    laborer
}

fn start_task(world: &mut World, worker: EntityId, site: CellCoord, target: ConstructionTarget, laborer: bool) {
    let origin = world.position(worker).unwrap_or(Vec2::ZERO);
    world.store.detach::<Waiting>(worker);
    world.store.attach(
        worker,
        ConstructionTask {
            site,
            target,
            phase: ConstructionPhase::Traveling,
            origin,
            laborer,
        },
    );
    world.blueprints.assign(site, worker);
    tracing::debug!(entity = %worker, %site, "construction started");
    world.emit(SimulationEvent::ConstructionStarted { entity: worker, site });
}

/// Staff waiting blueprints, then advance every task by one tick
pub fn run_construction(world: &mut World) {
    assign_pending(world);

    for id in world.store.query(&[ComponentKind::ConstructionTask, ComponentKind::Position]) {
        let Some(mut task) = world.store.get::<ConstructionTask>(id).cloned() else {
            continue;
        };

        match task.phase {
            ConstructionPhase::Traveling => {
                let site = task.target.position(&world.grid);
                let threshold = world.config.arrive_precise;
                if steer(world, id, site, threshold) {
                    task.phase = ConstructionPhase::Constructing {
                        started: world.current_tick,
                    };
                }
            }
            ConstructionPhase::Constructing { started } => {
                if world.current_tick - started >= u64::from(world.config.construction_ticks) {
                    complete(world, id, &mut task);
                }
            }
            ConstructionPhase::Returning => {
                let threshold = world.config.arrive_loose;
                if steer(world, id, task.origin, threshold) {
                    release(world, id, &task);
                    continue;
                }
            }
        }

        if let Some(slot) = world.store.get_mut::<ConstructionTask>(id) {
            *slot = task;
        }
    }
}

/// Blueprints left unstaffed at placement get the next idle willing builder
fn assign_pending(world: &mut World) {
    let waiting: Vec<(CellCoord, ConstructionTarget)> = world
        .blueprints
        .iter()
        .filter(|b| b.worker.is_none())
        .map(|b| (b.site, b.target))
        .collect();

    for (site, target) in waiting {
        let site_pos = target.position(&world.grid);
        match idle_builder(world, site_pos, true) {
            Some(worker) => start_task(world, worker, site, target, false),
            None => break,
        }
    }
}

fn complete(world: &mut World, id: EntityId, task: &mut ConstructionTask) {
    let site = task.site;
    let still_standing = world.grid.cell_at(site).is_some_and(|cell| cell.transparent);

    if still_standing {
        if let Some(cell) = world.grid.cell_mut(site) {
            cell.transparent = false;
        }
        world.blueprints.remove(site);

        let wage = world
            .store
            .get::<Supply>(id)
            .map_or(0, |s| s.reservation_price);
        let paid = match world.household() {
            Some(household) => world.pay(household, id, wage),
            None => false,
        };
        if let Some(supply) = world.store.get_mut::<Supply>(id) {
            supply.quantity += 1;
        }
        tracing::info!(entity = %id, %site, wage, "construction completed");
        world.emit(SimulationEvent::ConstructionCompleted {
            entity: id,
            site,
            paid: if paid { wage } else { 0 },
        });
    }

    match world.blueprints.next_unassigned().map(|b| (b.site, b.target)) {
        Some((next, target)) => {
            world.blueprints.assign(next, id);
            task.site = next;
            task.target = target;
            task.phase = ConstructionPhase::Traveling;
            tracing::debug!(entity = %id, %next, "redirected to next blueprint");
            world.emit(SimulationEvent::ConstructionStarted { entity: id, site: next });
        }
        None => task.phase = ConstructionPhase::Returning,
    }
}

fn release(world: &mut World, id: EntityId, task: &ConstructionTask) {
    world.store.detach::<ConstructionTask>(id);
    if task.laborer {
        world.store.destroy(id);
    }
    tracing::debug!(entity = %id, laborer = task.laborer, "worker released");
    world.emit(SimulationEvent::WorkerReleased {
        entity: id,
        laborer: task.laborer,
    });
}

/// Send a worker home from whatever it was building
pub fn abandon(world: &mut World, worker: EntityId) {
    if let Some(task) = world.store.get_mut::<ConstructionTask>(worker) {
        task.phase = ConstructionPhase::Returning;
    }
}
