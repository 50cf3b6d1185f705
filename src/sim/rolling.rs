//! Bomb pushing
//!
//! A bomb its owner is still standing on is not solid yet. Another player who
//! walks into it sends it sliding one cell at a time in the direction they
//! face, until the next cell is blocked or the bomb goes off.

use glam::IVec2;

use super::grid::{Direction, Tile};
use super::state::{GameState, RollState};
use crate::{cell_center, world_to_cell};

impl GameState {
    /// Start a bomb rolling. Fails for solid, rolling or exploded bombs and
    /// when the first cell is blocked.
    pub fn kick_bomb(&mut self, bomb_id: u32, direction: Direction) -> bool {
        let Some(bomb) = self.bomb(bomb_id) else {
            return false;
        };
        if bomb.exploded || bomb.solid || bomb.is_rolling() {
            return false;
        }
        let from = bomb.cell;
        let to = from + direction.offset();
        if self.roll_blocked(to, bomb_id) {
            return false;
        }

        self.destroy_power_up_at(to);
        if let Some(bomb) = self.bombs.iter_mut().find(|b| b.id == bomb_id) {
            bomb.roll = RollState::Rolling {
                direction,
                from,
                to,
                progress: 0.0,
            };
        }
        log::debug!("Bomb {bomb_id} kicked {direction:?} from ({}, {})", from.x, from.y);
        true
    }

    /// Whether a rolling bomb may enter `cell`
    fn roll_blocked(&self, cell: IVec2, bomb_id: u32) -> bool {
        self.grid.tile(cell) != Tile::Open
            || self.bombs.iter().any(|b| b.id != bomb_id && b.claims(cell))
            || self.players.iter().any(|p| p.alive && p.cell() == cell)
    }

    /// Slide rolling bombs along. Once the match is over they stop where
    /// they are.
    pub(crate) fn update_rolling(&mut self, dt: f32) {
        let cell_secs = self.settings.bomb_roll_cell_secs;
        let match_over = self.match_over();

        let rolling: Vec<u32> = self
            .bombs
            .iter()
            .filter(|b| b.is_rolling() && !b.exploded)
            .map(|b| b.id)
            .collect();

        for id in rolling {
            let Some(index) = self.bombs.iter().position(|b| b.id == id) else {
                continue;
            };
            let RollState::Rolling {
                direction,
                from,
                to,
                progress,
            } = self.bombs[index].roll
            else {
                continue;
            };

            if match_over {
                let bomb = &mut self.bombs[index];
                bomb.roll = RollState::Idle;
                bomb.cell = world_to_cell(bomb.pos);
                continue;
            }

            let progress = progress + dt / cell_secs;
            if progress < 1.0 {
                let bomb = &mut self.bombs[index];
                bomb.pos = cell_center(from).lerp(cell_center(to), progress);
                bomb.cell = world_to_cell(bomb.pos);
                bomb.roll = RollState::Rolling {
                    direction,
                    from,
                    to,
                    progress,
                };
                continue;
            }

            // Arrived; keep going if the next cell is free
            let next = to + direction.offset();
            let blocked = self.roll_blocked(next, id);
            if !blocked {
                self.destroy_power_up_at(next);
            }

            let bomb = &mut self.bombs[index];
            bomb.cell = to;
            if blocked {
                bomb.pos = cell_center(to);
                bomb.roll = RollState::Idle;
                log::debug!("Bomb {id} stopped at ({}, {})", to.x, to.y);
            } else {
                let carry = (progress - 1.0).min(1.0);
                bomb.pos = cell_center(to).lerp(cell_center(next), carry);
                bomb.roll = RollState::Rolling {
                    direction,
                    from: to,
                    to: next,
                    progress: carry,
                };
            }
        }
    }

    /// Bombs turn solid once their owner has stepped off
    pub(crate) fn update_bomb_solidity(&mut self) {
        for bomb in self.bombs.iter_mut().filter(|b| !b.solid) {
            let owner_on_it = self
                .players
                .get(bomb.owner)
                .is_some_and(|p| p.alive && p.overlaps_cell(bomb.cell));
            if !owner_on_it {
                bomb.solid = true;
            }
        }
    }
}
