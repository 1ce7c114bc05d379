//! Straight-line steering shared by every role
//!
//! Roles only set a velocity; the movement system integrates it at the end
//! of the tick. Speed is clamped so the final step lands on the target
//! instead of overshooting it.

use crate::core::types::{CellCoord, EntityId, Vec2};
use crate::ecs::components::{Velocity, Waiting};
use crate::ecs::World;

/// Aim `id` at `target`. Returns true once within `threshold`, in which
/// case the velocity is left at zero.
pub fn steer(world: &mut World, id: EntityId, target: Vec2, threshold: f32) -> bool {
    let Some(pos) = world.position(id) else {
        return false;
    };
    let offset = target - pos;
    let distance = offset.length();

    let velocity = if distance < threshold {
        Vec2::ZERO
    } else {
        let speed = world.config.base_speed.min(distance / world.config.tick_seconds);
        offset.normalize() * speed
    };
    world.store.attach(id, Velocity(velocity));
    distance < threshold
}

/// Steer to a cell center
pub fn steer_to_cell(world: &mut World, id: EntityId, coord: CellCoord, threshold: f32) -> bool {
    let target = world.grid.cell_center(coord);
    steer(world, id, target, threshold)
}

pub fn arrive_precise(world: &mut World, id: EntityId, coord: CellCoord) -> bool {
    let threshold = world.config.arrive_precise;
    steer_to_cell(world, id, coord, threshold)
}

pub fn arrive_loose(world: &mut World, id: EntityId, coord: CellCoord) -> bool {
    let threshold = world.config.arrive_loose;
    steer_to_cell(world, id, coord, threshold)
}

/// Suspend role logic for `ticks` ticks
pub fn wait(world: &mut World, id: EntityId, ticks: u32) {
    if ticks > 0 {
        world.store.attach(id, Waiting { until: ticks });
    }
}
