use super::script_host::SimHost;
use super::types::{ClientCommand, GameEvent, OutboundBatch};
use crate::domain::events::{HitReport, HookEvent, Outbound, SimEvent, WelcomeInfo};
use crate::domain::shop;
use crate::domain::state::SimulationState;
use crate::domain::systems::{collision, combat, hud, lifecycle, movement, obstacles, snapshot, waves, zombies};
use crate::domain::weapons::{self, SlotKind};
use crate::domain::{PlayerId, Tuning};
use crate::dzs::{Bindings, EventKind, Limits, Registry, ScriptEngine, help, loader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Hook occurrences processed per drain before the rest are dropped.
const MAX_HOOKS_PER_DRAIN: usize = 512;

#[derive(Debug, Clone)]
pub struct GameSettings {
    pub seed: u64,
    pub tick_interval: Duration,
    pub snapshot_interval: Duration,
    pub script_dirs: Vec<PathBuf>,
    pub dev_commands: bool,
    pub script_limits: Limits,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            seed: 1337,
            tick_interval: Duration::from_millis(50),
            snapshot_interval: Duration::from_millis(100),
            script_dirs: Vec::new(),
            dev_commands: true,
            script_limits: Limits::default(),
        }
    }
}

/// The authoritative match: simulation state plus the script engine reacting to it.
pub struct Game {
    state: SimulationState,
    scripts: ScriptEngine,
    settings: GameSettings,
    last_snapshot_at: Option<u64>,
}

impl Game {
    pub fn new(settings: GameSettings, tuning: Tuning) -> Self {
        let mut state = SimulationState::new(settings.seed, tuning);
        state.obstacles = obstacles::generate(settings.seed, &state.tuning.arena);
        let intermission = state.tuning.arena.intermission_ms;
        if intermission > 0 {
            state.round.intermission_until = Some(intermission);
        }
        Self {
            state,
            scripts: ScriptEngine::new(settings.script_limits),
            settings,
            last_snapshot_at: None,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn scripts(&self) -> &ScriptEngine {
        &self.scripts
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Swaps in a new handler set and runs its top-level statements.
    pub fn install_scripts(&mut self, registry: Registry) {
        let mut host = SimHost::new(&mut self.state);
        self.scripts.install(registry, &mut host);
        self.run_hooks();
    }

    /// Rereads every script directory. Returns the number of handlers now registered.
    pub fn reload_scripts(&mut self) -> usize {
        let registry = loader::load_dirs(&self.settings.script_dirs);
        self.install_scripts(registry);
        self.scripts.registry().handler_count()
    }

    pub fn take_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.state.outbox)
    }

    pub fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::Join { player_id, name } => {
                lifecycle::add_player(&mut self.state, player_id, name);
                self.welcome(player_id);
            }
            GameEvent::Leave { player_id } => {
                lifecycle::remove_player(&mut self.state, player_id);
            }
            GameEvent::Command { player_id, cmd } => self.command(player_id, cmd),
        }
        self.run_hooks();
    }

    fn welcome(&mut self, player_id: PlayerId) {
        let s = &mut self.state;
        let info = WelcomeInfo {
            player_id,
            arena_half_size: s.tuning.arena.half_size,
            obstacles: s.obstacles.clone(),
            pickups: snapshot::pickup_snapshots(s),
            pistols: weapons::list(SlotKind::Pistol),
            primaries: weapons::list(SlotKind::Primary),
            round: snapshot::round_snapshot(s),
        };
        s.send_to(player_id, SimEvent::Welcome(Box::new(info)));
        if let Some(p) = s.players.get(&player_id) {
            let loadout = combat::loadout_event(p);
            let cash = p.cash;
            s.broadcast(loadout);
            s.send_to(player_id, SimEvent::Cash { cash });
        }
    }

    fn toast(&mut self, player_id: PlayerId, text: impl Into<String>) {
        self.state.send_to(player_id, SimEvent::Toast { text: text.into() });
    }

    /// Player's active weapon id, used when a request names none.
    fn active_weapon(&self, player_id: PlayerId) -> Option<&'static str> {
        self.state
            .players
            .get(&player_id)
            .and_then(|p| p.active_weapon())
            .map(|w| w.id())
    }

    fn command(&mut self, player_id: PlayerId, cmd: ClientCommand) {
        if !self.state.players.contains_key(&player_id) {
            debug!(player_id, "command from unknown player ignored");
            return;
        }
        if cmd.is_dev() && !self.settings.dev_commands {
            debug!(player_id, ?cmd, "dev command ignored");
            return;
        }

        match cmd {
            ClientCommand::Input { yaw, pitch, keys } => {
                if let Some(p) = self.state.players.get_mut(&player_id) {
                    p.yaw = yaw;
                    p.pitch = pitch;
                    if p.alive {
                        p.keys = keys;
                    }
                }
            }
            ClientCommand::Shoot { weapon, aim } => {
                let Some(weapon) = weapon.or_else(|| self.active_weapon(player_id).map(str::to_string)) else {
                    return;
                };
                match combat::fire(&mut self.state, player_id, &weapon, aim) {
                    Ok(outcome) => debug!(player_id, %weapon, ?outcome, "fire"),
                    Err(e) => debug!(player_id, %weapon, error = %e, "fire rejected"),
                }
            }
            ClientCommand::Reload { weapon } => {
                let Some(weapon) = weapon.or_else(|| self.active_weapon(player_id).map(str::to_string)) else {
                    return;
                };
                if let Err(e) = combat::reload(&mut self.state, player_id, &weapon) {
                    debug!(player_id, %weapon, error = %e, "reload rejected");
                }
            }
            ClientCommand::PickPistol { weapon } => self.pick(player_id, SlotKind::Pistol, &weapon),
            ClientCommand::PickPrimary { weapon } => self.pick(player_id, SlotKind::Primary, &weapon),
            ClientCommand::Buy { item } => {
                if let Err(e) = shop::buy(&mut self.state, player_id, &item) {
                    debug!(player_id, %item, error = %e, "purchase rejected");
                    self.toast(player_id, e.to_string());
                }
            }
            ClientCommand::UseMedkit => {
                if let Err(e) = shop::use_medkit(&mut self.state, player_id) {
                    self.toast(player_id, e.to_string());
                }
            }
            ClientCommand::Restart => {
                info!(player_id, "restart requested");
                lifecycle::restart_match(&mut self.state);
                self.last_snapshot_at = None;
            }
            ClientCommand::Ready => {
                if !waves::start_wave(&mut self.state) {
                    debug!(player_id, "ready ignored; wave already running");
                }
            }
            ClientCommand::GetDzsHelp => {
                self.state.send_to(player_id, SimEvent::DzsHelp { lines: help::help_lines() });
            }
            ClientCommand::DevSetLoadout { pistol, primary } => {
                for weapon in [pistol.as_deref(), primary.as_deref()].into_iter().flatten() {
                    if !combat::give_weapon(&mut self.state, player_id, weapon) {
                        self.toast(player_id, format!("Unknown weapon {weapon}"));
                    }
                }
                if let Some(active) = primary.or(pistol) {
                    combat::equip_weapon(&mut self.state, player_id, &active);
                }
            }
            ClientCommand::DevEquipWeapon { weapon } => {
                if !combat::equip_weapon(&mut self.state, player_id, &weapon) {
                    self.toast(player_id, format!("Unknown weapon {weapon}"));
                }
            }
            ClientCommand::DevGiveWeapon { weapon } => {
                if !combat::give_weapon(&mut self.state, player_id, &weapon) {
                    self.toast(player_id, format!("Unknown weapon {weapon}"));
                }
            }
            ClientCommand::DevSetGodMode { on } => {
                lifecycle::set_god_mode(&mut self.state, player_id, on);
                self.toast(player_id, if on { "God mode on" } else { "God mode off" });
            }
            ClientCommand::DevTeleportZombieToPlayer => {
                if !zombies::teleport_nearest_to_player(&mut self.state, player_id) {
                    self.toast(player_id, "No zombie to teleport");
                }
            }
            ClientCommand::DevReloadScripts => {
                let handlers = self.reload_scripts();
                self.toast(player_id, format!("Scripts reloaded: {handlers} handlers"));
            }
        }
    }

    /// Starting-loadout pick; only between rounds and only from the slot's list.
    fn pick(&mut self, player_id: PlayerId, slot: SlotKind, weapon: &str) {
        if self.state.round.is_active() {
            self.toast(player_id, "Weapons can only be picked between rounds");
            return;
        }
        if !weapons::list(slot).iter().any(|w| *w == weapon) {
            self.toast(player_id, format!("{weapon} is not available"));
            return;
        }
        combat::equip_weapon(&mut self.state, player_id, weapon);
    }

    /// One fixed step of the simulation.
    pub fn tick(&mut self) {
        let dt = self.settings.tick_interval.as_secs_f32();
        let s = &mut self.state;
        s.tick += 1;
        s.now_ms += self.settings.tick_interval.as_millis() as u64;

        movement::integrate_players(s, dt);
        waves::tick_intermission(s);
        waves::tick_spawns(s);
        zombies::tick_zombies(s, dt);
        collision::resolve_all(s);
        movement::collect_pickups(s);
        combat::finish_reloads(s);
        combat::continue_bursts(s);
        self.run_hooks();

        let tick_bindings = base_bindings(&self.state, None).with("dt", dt);
        self.dispatch(EventKind::Tick, &tick_bindings);
        self.run_hooks();

        let s = &mut self.state;
        hud::expire(s);
        lifecycle::tick_respawns(s);
        waves::check_completion(s);
        self.run_hooks();

        self.maybe_snapshot();
    }

    fn maybe_snapshot(&mut self) {
        let now = self.state.now_ms;
        let every = self.settings.snapshot_interval.as_millis() as u64;
        if self.last_snapshot_at.is_some_and(|at| now < at + every) {
            return;
        }
        self.last_snapshot_at = Some(now);
        let snap = snapshot::world_snapshot(&self.state);
        self.state.broadcast(SimEvent::Snapshot(snap));
    }

    /// Feeds queued gameplay occurrences to the script engine until the queue is empty.
    fn run_hooks(&mut self) {
        let mut processed = 0usize;
        while let Some(event) = self.state.hooks.pop_front() {
            if processed >= MAX_HOOKS_PER_DRAIN {
                warn!(dropped = self.state.hooks.len() + 1, "hook queue overflow; dropping");
                self.state.hooks.clear();
                break;
            }
            processed += 1;
            let (kind, bindings) = hook_bindings(&self.state, &event);
            self.dispatch(kind, &bindings);
        }
    }

    fn dispatch(&mut self, kind: EventKind, bindings: &Bindings) {
        if self.scripts.registry().handlers_for(kind).is_empty() {
            return;
        }
        let mut host = SimHost::new(&mut self.state);
        let report = self.scripts.dispatch(kind, bindings, &mut host);
        if report.failed > 0 {
            debug!(event = kind.name(), ran = report.ran, failed = report.failed, "script dispatch");
        }
    }
}

fn base_bindings(state: &SimulationState, actor: Option<PlayerId>) -> Bindings {
    Bindings::new(actor)
        .with("wave", state.round.wave)
        .with("tick", state.tick)
        .with("now", state.now_ms)
}

fn player_bindings(state: &SimulationState, player_id: PlayerId) -> Bindings {
    base_bindings(state, Some(player_id))
        .with("player", player_id)
        .with("playerId", player_id)
}

fn hit_bindings(state: &SimulationState, hit: &HitReport) -> Bindings {
    player_bindings(state, hit.player_id)
        .with("zombie", hit.zombie_id)
        .with("zombieId", hit.zombie_id)
        .with("weapon", hit.weapon)
        .with("weaponId", hit.weapon)
        .with("part", hit.part.name())
        .with("dmg", hit.dmg)
        .with("dist", hit.dist)
        .with("killed", hit.killed)
        .with("zombieHp", hit.zombie_hp)
        .with("zombieX", hit.zombie_x)
        .with("zombieZ", hit.zombie_z)
}

fn hook_bindings(state: &SimulationState, event: &HookEvent) -> (EventKind, Bindings) {
    match event {
        HookEvent::Damage(hit) => (EventKind::Damage, hit_bindings(state, hit)),
        HookEvent::Kill(hit) => (EventKind::Kill, hit_bindings(state, hit)),
        HookEvent::PlayerSpawn { player_id } => (EventKind::PlayerSpawn, player_bindings(state, *player_id)),
        HookEvent::PlayerDeath { player_id } => (EventKind::PlayerDeath, player_bindings(state, *player_id)),
        HookEvent::GameStart => (EventKind::GameStart, base_bindings(state, None)),
        HookEvent::WaveStart { wave } => (EventKind::WaveStart, base_bindings(state, None).with("wave", *wave)),
        HookEvent::WaveEnd { wave } => (EventKind::WaveEnd, base_bindings(state, None).with("wave", *wave)),
    }
}

/// Owns the `Game` and interleaves fixed ticks with inbound events as they arrive.
pub async fn world_task(
    mut game: Game,
    mut input_rx: mpsc::Receiver<GameEvent>,
    outbound_tx: broadcast::Sender<OutboundBatch>,
) {
    let mut interval = tokio::time::interval(game.settings.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        tick_ms = game.settings.tick_interval.as_millis() as u64,
        seed = game.settings.seed,
        "world task started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => game.tick(),
            event = input_rx.recv() => match event {
                Some(event) => game.handle(event),
                None => {
                    info!("input channel closed; world task exiting");
                    break;
                }
            },
        }

        let out = game.take_outbox();
        if !out.is_empty() {
            // No receivers just means nobody is connected.
            let _ = outbound_tx.send(Arc::new(out));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::Recipient;
    use crate::domain::state::{Aim, MoveKeys, RoundPhase, Zombie};
    use crate::dzs::loader::load_sources;

    fn empty_arena() -> Game {
        let mut game = Game::new(GameSettings::default(), Tuning::default());
        game.state_mut().obstacles.clear();
        game
    }

    fn join(game: &mut Game, player_id: PlayerId) {
        game.handle(GameEvent::Join {
            player_id,
            name: format!("p{player_id}"),
        });
        let p = game.state_mut().players.get_mut(&player_id).expect("joined");
        p.x = 0.0;
        p.z = 0.0;
    }

    fn cmd(game: &mut Game, player_id: PlayerId, cmd: ClientCommand) {
        game.handle(GameEvent::Command { player_id, cmd });
    }

    fn zombie_ahead(game: &mut Game, dist: f32) -> u64 {
        let s = game.state_mut();
        let id = s.next_id();
        s.zombies.push(Zombie {
            id,
            x: 0.0,
            z: -dist,
            hp: 500,
            max_hp: 500,
            speed: 0.0,
            wave_member: false,
        });
        id
    }

    #[test]
    fn join_sends_welcome_to_the_joiner_only() {
        let mut game = empty_arena();
        join(&mut game, 1);
        game.take_outbox();
        join(&mut game, 2);
        let out = game.take_outbox();
        let welcome = out
            .iter()
            .find(|o| matches!(o.event, SimEvent::Welcome(_)))
            .expect("welcome sent");
        assert_eq!(welcome.to, Recipient::Player(2));
        assert!(out
            .iter()
            .any(|o| o.to == Recipient::AllExcept(2) && matches!(o.event, SimEvent::Join { player_id: 2, .. })));
    }

    #[test]
    fn head_hit_pays_economy_plus_script_bonus() {
        let mut game = empty_arena();
        game.install_scripts(load_sources([("bonus.dzs", "on damage (part == \"head\") { addCash(1) }")]));
        join(&mut game, 1);
        zombie_ahead(&mut game, 3.0);

        // Aims over the body sphere at the head's upper half.
        let aim = Aim { yaw: 0.0, pitch: 0.05 };
        cmd(
            &mut game,
            1,
            ClientCommand::Shoot {
                weapon: None,
                aim: Some(aim),
            },
        );
        let out = game.take_outbox();
        assert!(out.iter().any(|o| matches!(
            o.event,
            SimEvent::ZombieHit {
                part: crate::domain::events::HitPart::Head,
                ..
            }
        )));
        assert_eq!(game.state().players[&1].cash, 2);
    }

    #[test]
    fn failing_kill_hook_keeps_kill_and_cash() {
        let mut game = empty_arena();
        game.install_scripts(load_sources([("broken.dzs", "on kill { missing() }")]));
        join(&mut game, 1);
        let zid = zombie_ahead(&mut game, 3.0);
        game.state_mut().zombies[0].hp = 1;

        cmd(
            &mut game,
            1,
            ClientCommand::Shoot {
                weapon: None,
                aim: Some(Aim { yaw: 0.0, pitch: -0.2 }),
            },
        );
        assert!(game.state().zombie_index(zid).is_none());
        assert_eq!(game.state().players[&1].cash, 6);
    }

    #[test]
    fn ready_starts_wave_and_ticks_spawn() {
        let mut game = empty_arena();
        join(&mut game, 1);
        assert!(!game.state().round.is_active());
        cmd(&mut game, 1, ClientCommand::Ready);
        assert_eq!(game.state().round.phase, RoundPhase::Active);
        assert_eq!(game.state().round.target, 8);

        game.tick();
        assert_eq!(game.state().round.spawned, 1);
        assert_eq!(game.state().zombies.len(), 1);
    }

    #[test]
    fn wave_hooks_fire_on_transitions() {
        let mut game = empty_arena();
        game.install_scripts(load_sources([(
            "waves.dzs",
            "let started = 0\nlet ended = 0\non waveStart { started += wave }\non waveEnd { ended += 1 }",
        )]));
        join(&mut game, 1);
        cmd(&mut game, 1, ClientCommand::Ready);

        let s = game.state_mut();
        s.round.spawned = s.round.target;
        s.round.killed = s.round.target;
        s.zombies.clear();
        game.tick();

        assert_eq!(game.state().round.wave, 2);
        assert!(!game.state().round.is_active());
        assert_eq!(game.scripts().global("started"), Some(&crate::dzs::Value::Num(1.0)));
        assert_eq!(game.scripts().global("ended"), Some(&crate::dzs::Value::Num(1.0)));
    }

    #[test]
    fn tick_hook_runs_every_tick_and_survives_errors() {
        let mut game = empty_arena();
        game.install_scripts(load_sources([(
            "ticks.dzs",
            "let n = 0\non tick { n++ }\non tick { x = 1 / 0 }",
        )]));
        for _ in 0..5 {
            game.tick();
        }
        assert_eq!(game.scripts().global("n"), Some(&crate::dzs::Value::Num(5.0)));
    }

    #[test]
    fn snapshots_are_throttled() {
        let mut game = empty_arena();
        let mut snapshots = 0;
        for _ in 0..10 {
            game.tick();
            snapshots += game
                .take_outbox()
                .iter()
                .filter(|o| matches!(o.event, SimEvent::Snapshot(_)))
                .count();
        }
        // 50 ms ticks, 100 ms snapshot interval.
        assert_eq!(snapshots, 5);
    }

    #[test]
    fn input_moves_player_on_next_tick() {
        let mut game = empty_arena();
        join(&mut game, 1);
        cmd(
            &mut game,
            1,
            ClientCommand::Input {
                yaw: 0.0,
                pitch: 0.0,
                keys: MoveKeys {
                    forward: true,
                    ..MoveKeys::default()
                },
            },
        );
        game.tick();
        assert!(game.state().players[&1].z < 0.0);
    }

    #[test]
    fn dev_commands_can_be_disabled() {
        let mut game = Game::new(
            GameSettings {
                dev_commands: false,
                ..GameSettings::default()
            },
            Tuning::default(),
        );
        join(&mut game, 1);
        cmd(&mut game, 1, ClientCommand::DevSetGodMode { on: true });
        assert!(!game.state().players[&1].god_mode);
    }

    #[test]
    fn restart_resets_wave_and_dispatches_game_start() {
        let mut game = empty_arena();
        game.install_scripts(load_sources([("start.dzs", "let starts = 0\non gameStart { starts += 1 }")]));
        join(&mut game, 1);
        cmd(&mut game, 1, ClientCommand::Ready);
        game.tick();
        cmd(&mut game, 1, ClientCommand::Restart);

        let s = game.state();
        assert_eq!(s.round.wave, 1);
        assert!(!s.round.is_active());
        assert!(s.zombies.is_empty());
        assert_eq!(game.scripts().global("starts"), Some(&crate::dzs::Value::Num(2.0)));

        cmd(&mut game, 1, ClientCommand::Ready);
        assert_eq!(game.scripts().global("starts"), Some(&crate::dzs::Value::Num(2.0)));
    }

    #[test]
    fn game_start_fires_once_when_the_first_wave_begins() {
        let mut game = empty_arena();
        game.install_scripts(load_sources([("start.dzs", "let starts = 0\non gameStart { starts += 1 }")]));
        join(&mut game, 1);
        assert_eq!(game.scripts().global("starts"), Some(&crate::dzs::Value::Num(0.0)));

        cmd(&mut game, 1, ClientCommand::Ready);
        for _ in 0..40 {
            game.tick();
        }
        assert_eq!(game.state().round.wave, 1);
        assert!(game.state().round.is_active());
        assert_eq!(game.scripts().global("starts"), Some(&crate::dzs::Value::Num(1.0)));
    }

    #[test]
    fn pick_primary_only_between_rounds() {
        let mut game = empty_arena();
        join(&mut game, 1);
        cmd(&mut game, 1, ClientCommand::PickPrimary { weapon: "ak47".into() });
        assert!(game.state().players[&1].primary.is_some());

        cmd(&mut game, 1, ClientCommand::Ready);
        cmd(&mut game, 1, ClientCommand::PickPrimary { weapon: "m16".into() });
        assert_eq!(game.state().players[&1].primary.as_ref().map(|w| w.id()), Some("ak47"));
    }
}
