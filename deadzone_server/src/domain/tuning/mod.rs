// Gameplay tuning, kept apart from runtime/server configuration.

pub mod arena;
pub mod player;
pub mod zombie;

pub use arena::ArenaTuning;
pub use player::PlayerTuning;
pub use zombie::ZombieTuning;

/// All gameplay knobs the simulation reads, bundled so tests can tweak one copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub zombie: ZombieTuning,
}
