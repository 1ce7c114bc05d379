//! Movement integration: position += velocity * dt, then velocity is zeroed

use crate::ecs::components::{Position, Velocity};
use crate::ecs::store::ComponentKind;
use crate::ecs::World;

pub fn integrate_movement(world: &mut World) {
    let dt = world.config.tick_seconds;
    for id in world.store.query(&[ComponentKind::Position, ComponentKind::Velocity]) {
        let Some(velocity) = world.store.get_mut::<Velocity>(id).map(std::mem::take) else {
            continue;
        };
        if let Some(position) = world.store.get_mut::<Position>(id) {
            position.0 = position.0 + velocity.0 * dt;
        }
    }
}
