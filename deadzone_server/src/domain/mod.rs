// Domain layer: core simulation types and rules.

pub mod events;
pub mod shop;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod weapons;

pub use events::{HookEvent, Outbound, Recipient, SimEvent};
pub use state::{PlayerId, SimulationState};
pub use tuning::Tuning;
