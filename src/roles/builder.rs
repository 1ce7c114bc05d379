//! Builder between jobs: loiter at the workbench
//!
//! The actual building happens in the construction pipeline, which
//! commandeers idle builders and suspends this role while the task runs.

use crate::core::types::EntityId;
use crate::ecs::components::Supply;
use crate::ecs::World;
use crate::roles::movement::arrive_loose;
use crate::roles::ProducerRole;

pub struct Builder;

impl ProducerRole for Builder {
    fn update(&self, world: &mut World, entity: EntityId, supply: &mut Supply) {
        if let Some(workbench) = supply.node {
            arrive_loose(world, entity, workbench);
        }
    }
}
