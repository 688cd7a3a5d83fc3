// Simulation systems. Each takes `&mut SimulationState` and is called by the tick orchestrator
// in a fixed order.

pub mod collision;
pub mod combat;
pub mod hud;
pub mod lifecycle;
pub mod movement;
pub mod obstacles;
pub mod snapshot;
pub mod waves;
pub mod zombies;
