//! Sudden death
//!
//! Once the round clock runs out, cells are sealed one at a time along a
//! clockwise spiral that starts on the outer edge of the lockable region and
//! winds inward. Whatever stands on a cell when it seals is destroyed:
//! players die, bombs go off, power-ups vanish.

use glam::IVec2;

use super::events::{GameEvent, SoundCue};
use super::grid::{Bounds, Grid, Tile};
use super::state::GameState;

/// Lockdown order for `bounds`: clockwise inward spiral, skipping cells that
/// are already wall or locked
pub fn build_spiral(grid: &Grid, bounds: Bounds) -> Vec<IVec2> {
    let mut order = Vec::with_capacity(bounds.area());
    let mut push = |x: i32, y: i32| {
        let cell = IVec2::new(x, y);
        if matches!(grid.tile(cell), Tile::Open | Tile::Destructible) {
            order.push(cell);
        }
    };

    let (mut left, mut right) = (bounds.min.x, bounds.max.x);
    let (mut bottom, mut top) = (bounds.min.y, bounds.max.y);

    while left <= right && bottom <= top {
        for x in left..=right {
            push(x, top);
        }
        for y in (bottom..top).rev() {
            push(right, y);
        }
        if top > bottom {
            for x in (left..right).rev() {
                push(x, bottom);
            }
        }
        if right > left {
            for y in bottom + 1..top {
                push(left, y);
            }
        }

        left += 1;
        right -= 1;
        bottom += 1;
        top -= 1;
    }

    order
}

/// Lockdown queue and its cadence
#[derive(Debug, Clone)]
pub struct SuddenDeath {
    bounds: Bounds,
    enabled: bool,
    queue: Vec<IVec2>,
    cursor: usize,
    interval: f32,
    cooldown: f32,
    active: bool,
}

impl SuddenDeath {
    pub fn new(grid: &Grid, bounds: Bounds, interval: f32, enabled: bool) -> Self {
        let mut sudden_death = Self {
            bounds,
            enabled,
            queue: Vec::new(),
            cursor: 0,
            interval,
            cooldown: 0.0,
            active: false,
        };
        sudden_death.rebuild(grid);
        sudden_death
    }

    /// Recompute the queue from the current board
    pub fn rebuild(&mut self, grid: &Grid) {
        self.cursor = 0;
        if !self.enabled {
            log::warn!("Sudden death disabled, no cells will be locked");
            self.queue.clear();
            return;
        }
        self.queue = build_spiral(grid, self.bounds);
        log::debug!("Sudden death order: {} cells", self.queue.len());
    }

    /// Begin consuming the queue; the first cell falls on the next step
    pub fn start(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.cooldown = 0.0;
        log::info!("Sudden death started, {} cells queued", self.remaining());
        true
    }

    /// Cancel between cells
    pub fn stop(&mut self) {
        if self.active {
            log::info!("Sudden death stopped with {} cells left", self.remaining());
        }
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn queue(&self) -> &[IVec2] {
        &self.queue
    }

    /// Cells not yet locked
    pub fn remaining(&self) -> usize {
        self.queue.len() - self.cursor
    }

    /// Advance the cadence clock by one step
    pub fn tick_timer(&mut self, dt: f32) {
        if self.active {
            self.cooldown -= dt;
        }
    }

    /// Next cell whose turn has come, if any. `match_over` cancels the run.
    pub fn pop_due(&mut self, match_over: bool) -> Option<IVec2> {
        if !self.active {
            return None;
        }
        if match_over {
            self.stop();
            return None;
        }
        if self.cooldown > 0.0 {
            return None;
        }
        let Some(&cell) = self.queue.get(self.cursor) else {
            log::info!("Sudden death queue exhausted");
            self.active = false;
            return None;
        };
        self.cursor += 1;
        self.cooldown += self.interval;
        Some(cell)
    }
}

impl GameState {
    /// Lock every cell whose turn has come this step
    pub(crate) fn update_sudden_death(&mut self, dt: f32) {
        self.sudden_death.tick_timer(dt);
        loop {
            let match_over = self.match_over();
            let Some(cell) = self.sudden_death.pop_due(match_over) else {
                break;
            };
            self.lock_cell(cell);
        }
    }

    /// Seal one cell, destroying whatever stands on it
    pub fn lock_cell(&mut self, cell: IVec2) {
        let tile = self.grid.tile(cell);
        if !matches!(tile, Tile::Open | Tile::Destructible) {
            return;
        }

        for player in self.players_at(cell) {
            self.eliminate_player(player);
        }

        let bombs: Vec<u32> = self
            .bombs
            .iter()
            .filter(|b| b.claims(cell) && !b.exploded)
            .map(|b| b.id)
            .collect();
        for id in bombs {
            self.detonate(id);
        }

        self.destroy_power_up_at(cell);
        self.pending_drops.retain(|d| d.cell != cell);

        if self.grid.destroy_brick(cell) {
            self.emit(GameEvent::DestructionEffect {
                cell,
                pending_power_up: None,
            });
        }

        if self.grid.lock(cell) {
            self.emit(GameEvent::Sound(SoundCue::BlockFall));
            self.emit(GameEvent::CellLocked { cell });
            log::debug!("Locked cell ({}, {})", cell.x, cell.y);
        }
    }
}
