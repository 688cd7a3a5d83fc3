/// Gameplay tuning for zombies and the wave scheduler.

#[derive(Debug, Clone, Copy)]
pub struct ZombieTuning {
    pub radius: f32,

    pub base_hp: i32,
    pub hp_per_wave: i32,

    /// Movement speed in metres per second.
    pub base_speed: f32,
    pub speed_per_wave: f32,
    pub max_speed: f32,

    /// Added to the radius sum to decide melee range.
    pub melee_margin: f32,
    pub attack_cooldown_ms: u64,
    /// Cooldown while the target has god mode; no damage is applied.
    pub god_mode_cooldown_ms: u64,
    pub base_damage: f32,
    pub damage_per_wave: f32,

    /// Wave quota is `target_base + target_per_wave * wave`.
    pub target_base: u32,
    pub target_per_wave: u32,

    /// Spawn cadence shrinks by `spawn_step_ms` per wave down to `spawn_floor_ms`.
    pub spawn_every_ms: u64,
    pub spawn_step_ms: u64,
    pub spawn_floor_ms: u64,

    /// Cash awarded per pellet hit and per kill.
    pub hit_reward: i64,
    pub kill_reward: i64,
}

impl Default for ZombieTuning {
    fn default() -> Self {
        Self {
            radius: 0.55,
            base_hp: 90,
            hp_per_wave: 15,
            base_speed: 2.4,
            speed_per_wave: 0.12,
            max_speed: 4.6,
            melee_margin: 0.35,
            attack_cooldown_ms: 650,
            god_mode_cooldown_ms: 250,
            base_damage: 10.0,
            damage_per_wave: 2.0,
            target_base: 6,
            target_per_wave: 2,
            spawn_every_ms: 1400,
            spawn_step_ms: 90,
            spawn_floor_ms: 350,
            hit_reward: 1,
            kill_reward: 5,
        }
    }
}
