//! Game state and core simulation types
//!
//! `GameState` is the explicit simulation context: it owns the grid, every
//! entity, the match coordinator, the sudden death controller, the seeded
//! RNG and the outgoing presentation events. Nothing in the simulation is
//! global.

use glam::{IVec2, Vec2};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{GameEvent, MusicTrack, PresentationSink, SoundCue};
use super::grid::{Direction, Grid, Tile};
use super::level::{Level, generate_level};
use super::round::{MatchCoordinator, MatchPhase, MatchResult, RoundSignal, RoundTimings};
use super::sudden_death::SuddenDeath;
use crate::consts::PLAYER_HALF_EXTENT;
use crate::error::ConfigError;
use crate::settings::MatchSettings;
use crate::{cell_center, world_to_cell};

/// Index of a player within the round (0-based; shown as "Player 1", ...)
pub type PlayerId = usize;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// +1 blast range
    RangeUp,
    /// Faster movement
    SpeedUp,
    /// +1 bomb on the board at once
    BombCapacityUp,
}

/// A player entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// World position of the collision box center
    pub pos: Vec2,
    /// Only ever goes true -> false
    pub alive: bool,
    pub controls_enabled: bool,
    /// Set for everyone on the first elimination
    pub frozen: bool,
    pub speed: f32,
    pub blast_range: u32,
    pub bomb_capacity: u32,
    pub active_bombs: u32,
    /// Dominant axis of the last non-zero movement
    pub facing: Direction,
}

impl Player {
    pub fn new(id: PlayerId, spawn: IVec2, settings: &MatchSettings) -> Self {
        Self {
            id,
            pos: cell_center(spawn),
            alive: true,
            controls_enabled: false,
            frozen: false,
            speed: settings.player_speed,
            blast_range: settings.player_blast_range,
            bomb_capacity: settings.player_bomb_capacity,
            active_bombs: 0,
            facing: Direction::Down,
        }
    }

    /// Cell under the player's center
    pub fn cell(&self) -> IVec2 {
        world_to_cell(self.pos)
    }

    /// Whether input is applied to this player
    pub fn can_act(&self) -> bool {
        self.alive && self.controls_enabled && !self.frozen
    }

    /// Whether the collision box overlaps a cell
    pub fn overlaps_cell(&self, cell: IVec2) -> bool {
        let min = cell.as_vec2();
        let max = min + Vec2::ONE;
        self.pos.x + PLAYER_HALF_EXTENT > min.x
            && self.pos.x - PLAYER_HALF_EXTENT < max.x
            && self.pos.y + PLAYER_HALF_EXTENT > min.y
            && self.pos.y - PLAYER_HALF_EXTENT < max.y
    }

    pub fn apply_power_up(&mut self, kind: PowerUpKind, speed_up: f32) {
        match kind {
            PowerUpKind::RangeUp => self.blast_range += 1,
            PowerUpKind::SpeedUp => self.speed += speed_up,
            PowerUpKind::BombCapacityUp => self.bomb_capacity += 1,
        }
    }
}

/// Bomb movement state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RollState {
    #[default]
    Idle,
    /// Sliding from the center of `from` to the center of `to`
    Rolling {
        direction: Direction,
        from: IVec2,
        to: IVec2,
        /// 0-1 along the current cell step
        progress: f32,
    },
}

/// A bomb entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    pub id: u32,
    pub owner: PlayerId,
    /// Cell containing the current position
    pub cell: IVec2,
    pub pos: Vec2,
    /// Seconds until detonation
    pub fuse: f32,
    pub range: u32,
    /// Set exactly once, when propagation starts
    pub exploded: bool,
    /// Arm not propagated because the triggering blast came from there
    pub blocked: Option<Direction>,
    /// False while the owner still overlaps the bomb
    pub solid: bool,
    pub roll: RollState,
}

impl Bomb {
    pub fn is_rolling(&self) -> bool {
        matches!(self.roll, RollState::Rolling { .. })
    }

    /// Whether the bomb sits on or is rolling into `cell`
    pub fn claims(&self, cell: IVec2) -> bool {
        self.cell == cell || matches!(self.roll, RollState::Rolling { to, .. } if to == cell)
    }
}

/// A collectible power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub cell: IVec2,
}

/// Power-up waiting for its brick's break effect to finish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDrop {
    pub cell: IVec2,
    pub kind: PowerUpKind,
    pub remaining: f32,
}

/// Complete state of one round
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: MatchSettings,
    /// Seed the board and drops derive from
    pub seed: u64,
    pub grid: Grid,
    /// Spawn cells in player order
    pub spawns: Vec<IVec2>,
    /// Players by id
    pub players: Vec<Player>,
    /// Live bombs (sorted by id)
    pub bombs: Vec<Bomb>,
    pub power_ups: Vec<PowerUp>,
    pub pending_drops: Vec<PendingDrop>,
    pub round: MatchCoordinator,
    pub sudden_death: SuddenDeath,
    pub paused: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Generate a board and spawn players
    pub fn new(settings: MatchSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let Level {
            grid, spawns, seed, ..
        } = generate_level(&settings.level, settings.seed)?;
        Self::build(settings, grid, spawns, seed)
    }

    /// Start a round on a prepared board
    pub fn with_grid(
        settings: MatchSettings,
        grid: Grid,
        spawns: Vec<IVec2>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let seed = settings.seed.unwrap_or(0);
        Self::build(settings, grid, spawns, seed)
    }

    fn build(
        settings: MatchSettings,
        grid: Grid,
        spawns: Vec<IVec2>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if settings.player_count > spawns.len() {
            return Err(ConfigError::PlayerCount {
                requested: settings.player_count,
                available: spawns.len(),
            });
        }

        let players: Vec<Player> = spawns
            .iter()
            .take(settings.player_count)
            .enumerate()
            .map(|(id, &spawn)| Player::new(id, spawn, &settings))
            .collect();
        let roster = players.iter().map(|p| p.id).collect();

        let lock_bounds = grid.bounds().shrink(settings.sudden_death.inset);
        let sudden_death = SuddenDeath::new(
            &grid,
            lock_bounds,
            settings.sudden_death.interval_secs,
            settings.sudden_death.enabled,
        );

        let round = MatchCoordinator::new(RoundTimings::from_settings(&settings), roster);

        log::info!(
            "Round ready: seed {}, {} player(s), {} lockdown cells",
            seed,
            players.len(),
            sudden_death.remaining()
        );

        let mut state = Self {
            // Drops use a separate stream from the board shuffle
            rng: Pcg32::new(seed, 0xb0b),
            settings,
            seed,
            grid,
            spawns,
            players,
            bombs: Vec::new(),
            power_ups: Vec::new(),
            pending_drops: Vec::new(),
            round,
            sudden_death,
            paused: false,
            time_ticks: 0,
            events: Vec::new(),
            next_id: 1,
        };
        state.emit(GameEvent::Sound(SoundCue::GameStart));
        Ok(state)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take every queued event
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hand every queued event to a sink
    pub fn dispatch_events(&mut self, sink: &mut impl PresentationSink) {
        for event in self.events.drain(..) {
            sink.present(event);
        }
    }

    // === Lifecycle queries ===

    pub fn phase(&self) -> MatchPhase {
        self.round.phase()
    }

    pub fn round_timer(&self) -> f32 {
        self.round.round_timer()
    }

    pub fn display_seconds(&self) -> u32 {
        self.round.display_seconds()
    }

    pub fn sudden_death_started(&self) -> bool {
        self.round.sudden_death_started()
    }

    pub fn match_over(&self) -> bool {
        self.round.match_over()
    }

    /// Final result, available once the double-kill window has elapsed
    pub fn result(&self) -> Option<MatchResult> {
        self.round.result()
    }

    // === Lookups ===

    pub fn bomb(&self, id: u32) -> Option<&Bomb> {
        self.bombs.iter().find(|b| b.id == id)
    }

    pub fn bomb_at(&self, cell: IVec2) -> Option<&Bomb> {
        self.bombs.iter().find(|b| b.cell == cell)
    }

    pub fn power_up_at(&self, cell: IVec2) -> Option<&PowerUp> {
        self.power_ups.iter().find(|p| p.cell == cell)
    }

    /// Living players whose center is in `cell`
    pub fn players_at(&self, cell: IVec2) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.alive && p.cell() == cell)
            .map(|p| p.id)
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    // === Mutations ===

    /// Drop a bomb at the player's cell. Returns the new bomb's id.
    pub fn place_bomb(&mut self, player: PlayerId) -> Option<u32> {
        let p = self.players.get(player)?;
        if !p.can_act() || p.active_bombs >= p.bomb_capacity {
            return None;
        }
        let cell = p.cell();
        let range = p.blast_range;
        if self.grid.tile(cell) != Tile::Open || self.bombs.iter().any(|b| b.claims(cell)) {
            return None;
        }
        let fuse = self.settings.bomb_fuse_secs;
        let id = self.spawn_bomb(player, cell, range, fuse);
        self.emit(GameEvent::Sound(SoundCue::BombPlace));
        Some(id)
    }

    /// Put a bomb on the board regardless of controls or capacity
    pub fn spawn_bomb(&mut self, owner: PlayerId, cell: IVec2, range: u32, fuse: f32) -> u32 {
        let id = self.next_entity_id();
        self.bombs.push(Bomb {
            id,
            owner,
            cell,
            pos: cell_center(cell),
            fuse,
            range,
            exploded: false,
            blocked: None,
            solid: false,
            roll: RollState::Idle,
        });
        if let Some(p) = self.players.get_mut(owner) {
            p.active_bombs += 1;
        }
        log::debug!(
            "Bomb {} placed at ({}, {}) by player {}",
            id,
            cell.x,
            cell.y,
            owner + 1
        );
        id
    }

    /// Put a power-up on the board
    pub fn spawn_power_up(&mut self, cell: IVec2, kind: PowerUpKind) -> u32 {
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp { id, kind, cell });
        self.emit(GameEvent::PowerUpSpawned { cell, kind });
        id
    }

    /// Remove the power-up in `cell`, if any
    pub fn destroy_power_up_at(&mut self, cell: IVec2) -> bool {
        let before = self.power_ups.len();
        self.power_ups.retain(|p| p.cell != cell);
        self.power_ups.len() != before
    }

    /// Kill a player and report it to the coordinator. No-op if already dead.
    pub fn eliminate_player(&mut self, player: PlayerId) -> bool {
        let Some(p) = self.players.get_mut(player) else {
            return false;
        };
        if !p.alive {
            return false;
        }
        p.alive = false;
        self.emit(GameEvent::PlayerEliminated { player });
        self.emit(GameEvent::Sound(SoundCue::PlayerDeath));

        let signals = self.round.record_elimination(player);
        self.apply_round_signals(signals);
        true
    }

    /// Start sudden death now
    pub fn trigger_sudden_death(&mut self) {
        let signals = self.round.trigger_sudden_death();
        self.apply_round_signals(signals);
    }

    /// Toggle pause; nothing advances while paused
    pub fn toggle_pause(&mut self) {
        if self.phase() == MatchPhase::Ended {
            return;
        }
        self.paused = !self.paused;
        self.emit(GameEvent::Sound(SoundCue::Pause));
        self.emit(if self.paused {
            GameEvent::PauseMusic
        } else {
            GameEvent::ResumeMusic
        });
        log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
    }

    /// Advance match flow timers
    pub(crate) fn update_round(&mut self, dt: f32) {
        let signals = self.round.update(dt);
        self.apply_round_signals(signals);
    }

    fn apply_round_signals(&mut self, signals: Vec<RoundSignal>) {
        for signal in signals {
            match signal {
                RoundSignal::EnableControls => {
                    for p in self.players.iter_mut().filter(|p| p.alive) {
                        p.controls_enabled = true;
                    }
                    self.emit(GameEvent::Music(MusicTrack::Normal));
                }
                RoundSignal::Siren => self.emit(GameEvent::Sound(SoundCue::Siren)),
                RoundSignal::StartSuddenDeath => {
                    self.emit(GameEvent::Music(MusicTrack::SuddenDeath));
                    if self.sudden_death.remaining() == 0 {
                        self.sudden_death.rebuild(&self.grid);
                    }
                    self.sudden_death.start();
                }
                RoundSignal::FreezePlayers => {
                    for p in &mut self.players {
                        p.frozen = true;
                    }
                    self.sudden_death.stop();
                }
                RoundSignal::Resolved(result) => {
                    log::info!("Round resolved: {result:?}");
                }
                RoundSignal::RoundOver(result) => {
                    self.emit(GameEvent::StopMusic);
                    self.emit(GameEvent::RoundOver(result));
                }
            }
        }
    }

    /// Count down pending power-up reveals and spawn the ready ones
    pub(crate) fn update_pending_drops(&mut self, dt: f32) {
        let mut ready = Vec::new();
        self.pending_drops.retain_mut(|drop| {
            drop.remaining -= dt;
            if drop.remaining <= 0.0 {
                ready.push((drop.cell, drop.kind));
                false
            } else {
                true
            }
        });
        for (cell, kind) in ready {
            if self.grid.tile(cell) == Tile::Open && self.power_up_at(cell).is_none() {
                self.spawn_power_up(cell, kind);
            }
        }
    }

    /// Ensure deterministic ordering
    pub fn normalize_order(&mut self) {
        self.bombs.sort_by_key(|b| b.id);
        self.power_ups.sort_by_key(|p| p.id);
    }
}
