//! Simulation driver

pub mod movement;
pub mod spoilage;
pub mod tick;

pub use tick::{run_simulation_tick, run_ticks, waiting_gate, SimulationEvent};
