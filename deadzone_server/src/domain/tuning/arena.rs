/// Gameplay tuning for the arena and its obstacle field.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    /// Half the side length of the square arena, in metres.
    pub half_size: f32,

    /// Centre of the region players spawn around.
    pub spawn_anchor_x: f32,
    pub spawn_anchor_z: f32,

    /// Obstacle generation keeps this radius around the spawn anchor clear.
    pub safe_anchor_radius: f32,

    /// Number of obstacles the seeded generator tries to place.
    pub obstacle_count: usize,

    /// Minimum gap between generated obstacles.
    pub obstacle_gap: f32,

    /// Zombies enter this far inside the arena wall.
    pub spawn_ring_inset: f32,

    /// Auto-start delay between waves; zero waits for a `ready` signal.
    pub intermission_ms: u64,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            half_size: 60.0,
            spawn_anchor_x: 0.0,
            spawn_anchor_z: 0.0,
            safe_anchor_radius: 12.0,
            obstacle_count: 28,
            obstacle_gap: 1.5,
            spawn_ring_inset: 2.0,
            intermission_ms: 0,
        }
    }
}
