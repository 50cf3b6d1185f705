//! Match flow
//!
//! A forward-only state machine for one round:
//!
//! `PreGame -> Running -> SuddenDeathPending -> SuddenDeath -> Resolving -> Ended`
//!
//! The coordinator owns the roster and the elimination record and decides the
//! winner. It does not touch the board: every transition returns
//! [`RoundSignal`]s that the game state applies.

use serde::{Deserialize, Serialize};

use super::state::PlayerId;
use crate::settings::MatchSettings;

/// Current phase of a round (ordered; a round only moves forward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Countdown before the round, controls disabled
    PreGame,
    /// Normal play, round timer counting down
    Running,
    /// Siren has played, sudden death starts when the timer hits zero
    SuddenDeathPending,
    /// Board is shrinking
    SuddenDeath,
    /// Someone died, waiting out the double-kill window and end delay
    Resolving,
    /// Result handed off
    Ended,
}

/// Outcome of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Winner(PlayerId),
    Draw,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundSignal {
    /// Pre-game is over, players may move
    EnableControls,
    /// Play the sudden death warning
    Siren,
    StartSuddenDeath,
    /// First elimination: stop everyone and stop the lockdown
    FreezePlayers,
    /// Winner decided after the double-kill window
    Resolved(MatchResult),
    /// End delay elapsed, hand the result to the scene manager
    RoundOver(MatchResult),
}

/// Timings the coordinator runs on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundTimings {
    pub pre_game: f32,
    pub duration: f32,
    pub warning: f32,
    pub double_kill_window: f32,
    pub game_over_delay: f32,
    /// Whether the round timer drives sudden death at all
    pub start_on_timer: bool,
}

impl RoundTimings {
    pub fn from_settings(settings: &MatchSettings) -> Self {
        Self {
            pre_game: settings.pre_game_secs,
            duration: settings.match_duration_secs,
            warning: settings.sudden_death.warning_secs,
            double_kill_window: settings.double_kill_window_secs,
            game_over_delay: settings.game_over_delay_secs,
            start_on_timer: settings.sudden_death.start_on_timer,
        }
    }
}

/// Round state machine
#[derive(Debug, Clone)]
pub struct MatchCoordinator {
    timings: RoundTimings,
    phase: MatchPhase,
    pre_game_remaining: f32,
    round_timer: f32,
    warning_fired: bool,
    sudden_death_started: bool,
    /// Every player spawned this round
    roster: Vec<PlayerId>,
    /// Eliminations in the order they happened
    eliminated: Vec<PlayerId>,
    window_remaining: Option<f32>,
    end_delay_remaining: Option<f32>,
    result: Option<MatchResult>,
    unexpected_survivors: bool,
    handed_off: bool,
}

impl MatchCoordinator {
    pub fn new(timings: RoundTimings, roster: Vec<PlayerId>) -> Self {
        Self {
            timings,
            phase: MatchPhase::PreGame,
            pre_game_remaining: timings.pre_game,
            round_timer: timings.duration,
            warning_fired: false,
            sudden_death_started: false,
            roster,
            eliminated: Vec::new(),
            window_remaining: None,
            end_delay_remaining: None,
            result: None,
            unexpected_survivors: false,
            handed_off: false,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Seconds left on the round clock (never negative)
    pub fn round_timer(&self) -> f32 {
        self.round_timer.max(0.0)
    }

    pub fn sudden_death_started(&self) -> bool {
        self.sudden_death_started
    }

    /// True from the first elimination on
    pub fn match_over(&self) -> bool {
        self.phase >= MatchPhase::Resolving
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    pub fn eliminated(&self) -> &[PlayerId] {
        &self.eliminated
    }

    /// Set when the resolution found more than one survivor
    pub fn unexpected_survivors(&self) -> bool {
        self.unexpected_survivors
    }

    pub fn handed_off(&self) -> bool {
        self.handed_off
    }

    /// Whole seconds for a HUD clock; zero once sudden death or the end begins
    pub fn display_seconds(&self) -> u32 {
        if self.match_over() || self.sudden_death_started {
            0
        } else {
            self.round_timer().ceil() as u32
        }
    }

    /// Move to `next` if it lies ahead of the current phase
    fn enter(&mut self, next: MatchPhase) -> bool {
        if next <= self.phase {
            log::warn!("Ignoring phase change {:?} -> {:?}", self.phase, next);
            return false;
        }
        log::info!("Match phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        true
    }

    /// Advance timers by one step
    pub fn update(&mut self, dt: f32) -> Vec<RoundSignal> {
        let mut signals = Vec::new();

        match self.phase {
            MatchPhase::PreGame => {
                self.pre_game_remaining -= dt;
                if self.pre_game_remaining <= 0.0 && self.enter(MatchPhase::Running) {
                    signals.push(RoundSignal::EnableControls);
                }
            }

            MatchPhase::Running | MatchPhase::SuddenDeathPending => {
                if !self.timings.start_on_timer {
                    return signals;
                }
                self.round_timer -= dt;

                if !self.warning_fired && self.round_timer <= self.timings.warning {
                    self.warning_fired = true;
                    signals.push(RoundSignal::Siren);
                    if self.round_timer > 0.0 {
                        self.enter(MatchPhase::SuddenDeathPending);
                    }
                }

                if self.round_timer <= 0.0 {
                    signals.extend(self.trigger_sudden_death());
                }
            }

            MatchPhase::Resolving => {
                if let Some(remaining) = self.window_remaining.as_mut() {
                    *remaining -= dt;
                    if *remaining <= 0.0 {
                        self.window_remaining = None;
                        let result = self.resolve();
                        signals.push(RoundSignal::Resolved(result));
                        self.end_delay_remaining = Some(
                            (self.timings.game_over_delay - self.timings.double_kill_window)
                                .max(0.0),
                        );
                    }
                } else if let Some(remaining) = self.end_delay_remaining.as_mut() {
                    *remaining -= dt;
                    if *remaining <= 0.0 {
                        self.end_delay_remaining = None;
                        signals.extend(self.finish());
                    }
                }
            }

            MatchPhase::SuddenDeath | MatchPhase::Ended => {}
        }

        signals
    }

    /// Start sudden death now (timer expiry or manual trigger)
    pub fn trigger_sudden_death(&mut self) -> Vec<RoundSignal> {
        let mut signals = Vec::new();
        if self.sudden_death_started || self.match_over() {
            return signals;
        }
        if self.phase == MatchPhase::PreGame {
            log::debug!("Sudden death requested before the round started, ignoring");
            return signals;
        }

        self.sudden_death_started = true;
        if !self.warning_fired {
            self.warning_fired = true;
            signals.push(RoundSignal::Siren);
        }
        self.enter(MatchPhase::SuddenDeath);
        signals.push(RoundSignal::StartSuddenDeath);
        signals
    }

    /// Record a death. Duplicates and unknown players are ignored.
    pub fn record_elimination(&mut self, player: PlayerId) -> Vec<RoundSignal> {
        let mut signals = Vec::new();
        if !self.roster.contains(&player) {
            log::warn!("Elimination reported for unknown player {player}");
            return signals;
        }
        if self.eliminated.contains(&player) {
            return signals;
        }
        self.eliminated.push(player);
        log::info!("Player {} eliminated", player + 1);

        if self.result.is_some() {
            log::debug!("Player {} died after the result was decided", player + 1);
        }

        if !self.match_over() && self.enter(MatchPhase::Resolving) {
            self.window_remaining = Some(self.timings.double_kill_window);
            signals.push(RoundSignal::FreezePlayers);
        }
        signals
    }

    fn resolve(&mut self) -> MatchResult {
        let alive: Vec<PlayerId> = self
            .roster
            .iter()
            .copied()
            .filter(|p| !self.eliminated.contains(p))
            .collect();

        let result = match alive.as_slice() {
            [] => {
                log::info!("Draw: no player survived");
                MatchResult::Draw
            }
            [winner] => {
                log::info!("Winner: Player {}", winner + 1);
                MatchResult::Winner(*winner)
            }
            _ => {
                log::warn!(
                    "Unexpected state: {} players alive after resolution, treating as draw",
                    alive.len()
                );
                self.unexpected_survivors = true;
                MatchResult::Draw
            }
        };
        self.result = Some(result);
        result
    }

    fn finish(&mut self) -> Option<RoundSignal> {
        if self.handed_off {
            return None;
        }
        let result = self.result?;
        self.handed_off = true;
        self.enter(MatchPhase::Ended);
        Some(RoundSignal::RoundOver(result))
    }
}
