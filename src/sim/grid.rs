//! Tile grid
//!
//! The grid is the single shared mutable resource of a round. Its
//! dimensions are fixed at generation; at runtime only two transitions are
//! legal: a brick breaks (`Destructible -> Open`) and sudden death seals a
//! floor cell (`Open -> Locked`).

use std::fmt;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Terrain classification of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tile {
    /// Walkable floor
    #[default]
    Open,
    /// Indestructible wall or pillar, never changes
    Wall,
    /// Brick that a blast turns into floor
    Destructible,
    /// Floor sealed by sudden death
    Locked,
}

impl Tile {
    /// Blocks movement and blasts
    pub fn is_solid(self) -> bool {
        self != Tile::Open
    }

    /// Whether a runtime mutation from `self` to `to` is allowed
    pub fn can_become(self, to: Tile) -> bool {
        matches!(
            (self, to),
            (Tile::Destructible, Tile::Open) | (Tile::Open, Tile::Locked)
        )
    }

    fn glyph(self) -> char {
        match self {
            Tile::Open => '.',
            Tile::Wall => '#',
            Tile::Destructible => '+',
            Tile::Locked => 'X',
        }
    }

    fn from_glyph(c: char) -> Option<Self> {
        match c {
            '.' | ' ' => Some(Tile::Open),
            '#' => Some(Tile::Wall),
            '+' => Some(Tile::Destructible),
            'X' => Some(Tile::Locked),
            _ => None,
        }
    }
}

/// One of the four axis directions (`Up` is +y)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Blast arms are processed in this order
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::Y,
            Direction::Down => IVec2::NEG_Y,
            Direction::Left => IVec2::NEG_X,
            Direction::Right => IVec2::X,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Dominant axis of a movement vector (ties go to the vertical axis)
    pub fn from_vector(v: Vec2) -> Option<Self> {
        if v.x == 0.0 && v.y == 0.0 {
            return None;
        }
        if v.x.abs() > v.y.abs() {
            Some(if v.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            })
        } else {
            Some(if v.y > 0.0 { Direction::Up } else { Direction::Down })
        }
    }
}

/// Inclusive rectangle of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: IVec2,
    pub max: IVec2,
}

impl Bounds {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// True once the rectangle has inverted
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    /// Shrink by `n` cells on every side
    pub fn shrink(&self, n: i32) -> Self {
        Self {
            min: self.min + IVec2::splat(n),
            max: self.max - IVec2::splat(n),
        }
    }

    /// Number of cells covered (0 when inverted)
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            ((self.max.x - self.min.x + 1) * (self.max.y - self.min.y + 1)) as usize
        }
    }
}

/// Fixed-size board of tiles, row-major from the bottom row up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// An all-floor grid
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![Tile::Open; width as usize * height as usize],
        }
    }

    /// Build a grid from text rows, top row first.
    ///
    /// `#` wall, `+` brick, `X` locked, `.` floor. Rows shorter than the
    /// first are padded with floor; unknown glyphs read as floor.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as i32;
        let mut grid = Self::new(width, height);
        for (row_idx, row) in rows.iter().enumerate() {
            let y = height - 1 - row_idx as i32;
            for (x, c) in row.chars().enumerate().take(width as usize) {
                let tile = Tile::from_glyph(c).unwrap_or(Tile::Open);
                grid.paint(IVec2::new(x as i32, y), tile);
            }
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The whole board as a rectangle
    pub fn bounds(&self) -> Bounds {
        Bounds::new(IVec2::ZERO, IVec2::new(self.width - 1, self.height - 1))
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.y * self.width + cell.x) as usize)
    }

    /// Classification of a cell; everything outside the board is wall
    pub fn tile(&self, cell: IVec2) -> Tile {
        self.index(cell).map_or(Tile::Wall, |i| self.tiles[i])
    }

    /// Build-time placement that bypasses the runtime transition rules.
    ///
    /// Returns false if the cell is outside the board.
    pub fn paint(&mut self, cell: IVec2, tile: Tile) -> bool {
        match self.index(cell) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Runtime mutation, restricted to the legal transitions
    pub fn set_tile(&mut self, cell: IVec2, tile: Tile) -> Result<(), GridError> {
        let i = self.index(cell).ok_or(GridError::OutOfBounds(cell))?;
        let from = self.tiles[i];
        if from == tile {
            return Ok(());
        }
        if !from.can_become(tile) {
            return Err(GridError::IllegalTransition {
                cell,
                from,
                to: tile,
            });
        }
        self.tiles[i] = tile;
        Ok(())
    }

    /// Break a brick. Returns false if the cell held no brick.
    pub fn destroy_brick(&mut self, cell: IVec2) -> bool {
        self.tile(cell) == Tile::Destructible && self.set_tile(cell, Tile::Open).is_ok()
    }

    /// Seal a floor cell. Returns false if the cell was not floor.
    pub fn lock(&mut self, cell: IVec2) -> bool {
        self.tile(cell) == Tile::Open && self.set_tile(cell, Tile::Locked).is_ok()
    }

    /// Number of cells with the given classification
    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|&&t| t == tile).count()
    }

    /// All cells, row-major from the bottom row
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| IVec2::new(x, y)))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                write!(f, "{}", self.tile(IVec2::new(x, y)).glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
