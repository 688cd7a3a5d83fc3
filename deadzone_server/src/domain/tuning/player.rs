/// Gameplay tuning for players.

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Collision radius in metres.
    pub radius: f32,

    pub max_hp: i32,

    /// Walking speed in metres per second.
    pub speed: f32,

    /// Multiplier applied while the sprint key is held.
    pub sprint_multiplier: f32,

    /// Height of the hitscan ray origin.
    pub eye_height: f32,

    /// Extra clearance kept from obstacles when choosing spawn points.
    pub spawn_padding: f32,

    /// Distance at which a weapon pickup is collected.
    pub pickup_radius: f32,

    /// Delay before a player who died between rounds is revived.
    pub respawn_ms: u64,

    /// Hit points restored by one medkit.
    pub medkit_heal: i32,

    pub starting_cash: i64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.45,
            max_hp: 100,
            speed: 6.0,
            sprint_multiplier: 1.4,
            eye_height: 1.6,
            spawn_padding: 0.35,
            pickup_radius: 1.2,
            respawn_ms: 3000,
            medkit_heal: 50,
            starting_cash: 0,
        }
    }
}
