#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural dungeon generation.
//!
//! Grids are scattered with random walls, lightly cleared, and then carved
//! with a biased random walk from the start tile to the goal so a walkable
//! route always exists.

use dungeon_crawl_core::{Tile, TileGrid, TilePos, DEFAULT_COLUMNS, DEFAULT_ROWS};
use rand::Rng;
use thiserror::Error;

const WALL_PROBABILITY: f64 = 0.25;
const RANDOM_CLEARS: usize = 8;
const STEP_TOWARD_GOAL_PROBABILITY: f64 = 0.6;

/// Smallest grid side that can hold a start tile and a goal tile inside the border.
pub const MIN_SIDE: u32 = 3;

/// Errors reported when a grid cannot be generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The requested grid is too small to hold the start and goal tiles.
    #[error("grid of {columns}x{rows} tiles is smaller than the {MIN_SIDE}x{MIN_SIDE} minimum")]
    TooSmall {
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
}

/// Configuration parameters for the generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    columns: u32,
    rows: u32,
    wall_probability: f64,
    random_clears: usize,
}

impl Config {
    /// Creates a configuration for a grid of the provided dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            wall_probability: WALL_PROBABILITY,
            random_clears: RANDOM_CLEARS,
        }
    }

    /// Overrides the chance that any single tile starts out as a wall.
    #[must_use]
    pub const fn with_wall_probability(mut self, wall_probability: f64) -> Self {
        self.wall_probability = wall_probability;
        self
    }

    /// Number of columns in generated grids.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in generated grids.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS, DEFAULT_ROWS)
    }
}

/// Generates a grid whose start tile `(1, 1)` is floor, whose goal tile
/// `(columns - 2, rows - 2)` is the only goal, and which contains a 4-connected
/// walkable path between the two.
pub fn generate<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<TileGrid, GenerationError> {
    let (columns, rows) = (config.columns, config.rows);
    if columns < MIN_SIDE || rows < MIN_SIDE {
        return Err(GenerationError::TooSmall { columns, rows });
    }

    let wall_probability = config.wall_probability.clamp(0.0, 1.0);
    let mut grid = TileGrid::filled(columns, rows, Tile::Floor);
    for row in 0..rows {
        for column in 0..columns {
            if rng.gen_bool(wall_probability) {
                grid.set(TilePos::new(column, row), Tile::Wall);
            }
        }
    }

    let start = grid.start();
    let goal = grid.goal();
    grid.set(start, Tile::Floor);
    grid.set(goal, Tile::Goal);

    for _ in 0..config.random_clears {
        let tile = TilePos::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
        if tile != goal {
            grid.set(tile, Tile::Floor);
        }
    }

    carve_path(&mut grid, start, goal, rng);
    Ok(grid)
}

/// Walks from `start` to `goal`, turning every visited tile except the goal into floor.
///
/// Each step favours the column axis with probability 0.6 while the columns
/// differ, otherwise closes the row gap.
fn carve_path<R: Rng + ?Sized>(grid: &mut TileGrid, start: TilePos, goal: TilePos, rng: &mut R) {
    let max_column = grid.columns().saturating_sub(1);
    let max_row = grid.rows().saturating_sub(1);
    let (mut column, mut row) = (start.column(), start.row());

    while (column, row) != (goal.column(), goal.row()) {
        grid.set(TilePos::new(column, row), Tile::Floor);

        if column < goal.column() && rng.gen_bool(STEP_TOWARD_GOAL_PROBABILITY) {
            column += 1;
        } else if column > goal.column() && rng.gen_bool(STEP_TOWARD_GOAL_PROBABILITY) {
            column -= 1;
        } else if row < goal.row() {
            row += 1;
        } else if row > goal.row() {
            row -= 1;
        }

        column = column.min(max_column);
        row = row.min(max_row);
    }
}
