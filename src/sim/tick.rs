//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;

use super::round::MatchPhase;
use super::state::GameState;

/// One player's controls for a tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Desired direction; normalized by the simulation
    pub movement: Vec2,
    pub place_bomb: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Indexed by player id; missing entries mean no input
    pub players: Vec<PlayerInput>,
    /// Pause toggle
    pub pause: bool,
    /// Start sudden death now (debug/testing)
    pub trigger_sudden_death: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        state.toggle_pause();
    }

    // Don't tick if paused or the round is over
    if state.paused || state.phase() == MatchPhase::Ended {
        return;
    }

    state.time_ticks += 1;

    state.update_round(dt);
    if input.trigger_sudden_death {
        state.trigger_sudden_death();
    }

    for (id, player_input) in input.players.iter().enumerate().take(state.players.len()) {
        state.move_player(id, player_input.movement, dt);
        if player_input.place_bomb {
            state.place_bomb(id);
        }
    }

    state.update_rolling(dt);
    state.update_bomb_solidity();
    state.update_fuses(dt);
    state.update_pending_drops(dt);
    state.collect_power_ups();
    state.update_sudden_death(dt);

    state.normalize_order();
}
