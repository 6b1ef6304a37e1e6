#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Dungeon Crawl engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The game loop submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then reports [`Event`] values describing what
//! actually changed. Systems query immutable snapshots and respond
//! exclusively with new commands.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side length of a single tile measured in pixels.
pub const TILE_SIZE_PX: f32 = 32.0;

/// Side length of an entity sprite measured in pixels.
pub const SPRITE_SIZE_PX: f32 = 32.0;

/// Number of tile columns in a default session grid.
pub const DEFAULT_COLUMNS: u32 = 20;

/// Number of tile rows in a default session grid.
pub const DEFAULT_ROWS: u32 = 20;

/// Health the player starts every session with.
pub const PLAYER_MAX_HEALTH: u32 = 3;

/// Health every enemy starts with.
pub const ENEMY_MAX_HEALTH: u32 = 2;

/// Number of enemies placed at the start of a session.
pub const DEFAULT_ENEMY_COUNT: usize = 4;

/// Minimum Manhattan distance between a spawned enemy and the player start.
pub const MIN_SPAWN_DISTANCE: u32 = 4;

/// Manhattan distance within which enemies notice the player. Walls do not block sight.
pub const ENEMY_SIGHT_RANGE: u32 = 5;

/// Inclusive lower bound of the rest armed after a patrol step.
pub const PATROL_REST_MIN: u32 = 10;

/// Exclusive upper bound of the rest armed after a patrol step.
pub const PATROL_REST_MAX: u32 = 30;

/// AI ticks an enemy must wait after a successful chase step.
pub const CHASE_MOVE_COOLDOWN: u32 = 5;

/// Value the flee timer is reset to whenever an enemy flees.
pub const FLEE_TIMER_RESET: u32 = 30;

/// Fireball travel per frame measured in tiles.
pub const FIREBALL_SPEED: f32 = 0.1;

/// Maximum fireball cast distance and flight range measured in tiles.
pub const FIREBALL_RANGE: f32 = 1.5;

/// Half extent of the box used to match a fireball against an enemy centre.
pub const FIREBALL_HIT_EXTENT: f32 = 0.4;

/// Frames the melee attack-range indicator stays visible after a swing.
pub const ATTACK_INDICATOR_FRAMES: u32 = 15;

/// Points awarded for every enemy the player kills.
pub const KILL_SCORE: u32 = 100;

/// Points awarded per remaining health point when the goal is reached.
pub const WIN_HEALTH_BONUS: u32 = 30;

/// Points awarded per defeated enemy when the goal is reached in melee mode.
pub const MELEE_DEFEAT_BONUS: u32 = 50;

/// Points awarded once when every enemy is dead in melee mode.
pub const CLEAR_BONUS: u32 = 200;

/// Minimum wall-clock time between two accepted player actions.
pub const ACTION_DEBOUNCE: Duration = Duration::from_millis(200);

/// Duration of the hurt expression before it reverts to neutral.
pub const HURT_EXPRESSION: Duration = Duration::from_millis(500);

/// Duration of the happy expression before it reverts to neutral.
pub const HAPPY_EXPRESSION: Duration = Duration::from_millis(500);

/// Duration of the angry expression before it reverts to neutral.
pub const ANGRY_EXPRESSION: Duration = Duration::from_millis(300);

/// Contents of a single grid tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Walkable ground.
    Floor,
    /// Impassable wall.
    Wall,
    /// Walkable exit that ends the session when the player stands on it.
    Goal,
}

impl Tile {
    /// Reports whether the player may stand on the tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Floor | Self::Goal)
    }
}

/// Cardinal movement directions available to entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in the order enemies enumerate patrol neighbours.
    pub const PATROL_ORDER: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::North,
    ];

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    column: u32,
    row: u32,
}

impl TilePos {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tiles.
    #[must_use]
    pub fn manhattan_distance(self, other: TilePos) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Computes the Chebyshev (king-move) distance between two tiles.
    #[must_use]
    pub fn chebyshev_distance(self, other: TilePos) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Signed column and row offset from `self` to `other`.
    #[must_use]
    pub fn offset_to(self, other: TilePos) -> (i64, i64) {
        (
            i64::from(other.column) - i64::from(self.column),
            i64::from(other.row) - i64::from(self.row),
        )
    }

    /// Tile reached by offsetting this one, or `None` when it would leave the
    /// non-negative quadrant.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<TilePos> {
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(TilePos::new(column, row))
    }

    /// Tile reached by a single step in `direction`.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<TilePos> {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// Direction of a single orthogonal step from `self` to `to`, if adjacent.
    #[must_use]
    pub fn direction_to(self, to: TilePos) -> Option<Direction> {
        match self.offset_to(to) {
            (0, -1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }

    /// Continuous point at the centre of the tile.
    #[must_use]
    pub fn center(self) -> TilePoint {
        TilePoint::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }
}

/// Continuous position measured in tile units.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TilePoint {
    /// Horizontal coordinate in tiles.
    pub x: f32,
    /// Vertical coordinate in tiles.
    pub y: f32,
}

impl TilePoint {
    /// Creates a new continuous tile-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Length of the vector from the origin to this point.
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Tile containing the point, or `None` for negative coordinates.
    #[must_use]
    pub fn tile(self) -> Option<TilePos> {
        let column = self.x.floor();
        let row = self.y.floor();
        if column < 0.0 || row < 0.0 || !column.is_finite() || !row.is_finite() {
            return None;
        }
        Some(TilePos::new(column as u32, row as u32))
    }
}

/// Continuous position measured in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PixelPoint {
    /// Horizontal coordinate in pixels.
    pub x: f32,
    /// Vertical coordinate in pixels.
    pub y: f32,
}

impl PixelPoint {
    /// Creates a new pixel-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Top-left pixel corner of the provided tile.
    #[must_use]
    pub fn of_tile(tile: TilePos) -> Self {
        Self::new(
            tile.column() as f32 * SPRITE_SIZE_PX,
            tile.row() as f32 * SPRITE_SIZE_PX,
        )
    }
}

/// Rectangular matrix of tiles describing the dungeon layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Creates a grid where every tile holds `tile`.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, tile: Tile) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![tile; capacity],
        }
    }

    /// Creates an all-floor grid whose goal tile is already placed.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        let mut grid = Self::filled(columns, rows, Tile::Floor);
        let goal = grid.goal();
        grid.set(goal, Tile::Goal);
        grid
    }

    /// Builds a grid from rows of numeric tile codes (`0` floor, `1` wall, `2` goal).
    ///
    /// Unknown codes are treated as walls. Ragged rows are padded with walls.
    #[must_use]
    pub fn from_codes(rows: &[&[u8]]) -> Self {
        let row_count = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        let column_count = rows
            .iter()
            .map(|row| u32::try_from(row.len()).unwrap_or(u32::MAX))
            .max()
            .unwrap_or(0);
        let mut grid = Self::filled(column_count, row_count, Tile::Wall);
        for (row_index, codes) in rows.iter().enumerate() {
            for (column_index, code) in codes.iter().enumerate() {
                let tile = match code {
                    0 => Tile::Floor,
                    2 => Tile::Goal,
                    _ => Tile::Wall,
                };
                grid.set(TilePos::new(column_index as u32, row_index as u32), tile);
            }
        }
        grid
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile where the player starts.
    #[must_use]
    pub const fn start(&self) -> TilePos {
        TilePos::new(1, 1)
    }

    /// Tile the player must reach to win.
    #[must_use]
    pub const fn goal(&self) -> TilePos {
        TilePos::new(self.columns.saturating_sub(2), self.rows.saturating_sub(2))
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub fn contains(&self, tile: TilePos) -> bool {
        tile.column() < self.columns && tile.row() < self.rows
    }

    /// Tile stored at the provided position, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, tile: TilePos) -> Option<Tile> {
        self.index(tile).and_then(|index| self.tiles.get(index).copied())
    }

    /// Tile containing a continuous point, or `None` outside the grid.
    #[must_use]
    pub fn get_at_point(&self, point: TilePoint) -> Option<Tile> {
        point.tile().and_then(|tile| self.get(tile))
    }

    /// Reports whether the tile holds plain floor.
    #[must_use]
    pub fn is_floor(&self, tile: TilePos) -> bool {
        self.get(tile) == Some(Tile::Floor)
    }

    /// Reports whether the tile is inside the grid and walkable.
    #[must_use]
    pub fn is_walkable(&self, tile: TilePos) -> bool {
        self.get(tile).is_some_and(Tile::is_walkable)
    }

    /// Replaces the tile stored at the provided position. Out-of-bounds writes are ignored.
    pub fn set(&mut self, tile: TilePos, value: Tile) {
        if let Some(index) = self.index(tile) {
            if let Some(slot) = self.tiles.get_mut(index) {
                *slot = value;
            }
        }
    }

    /// Iterates every tile position together with its contents in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, Tile)> + '_ {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let index = index as u32;
            (TilePos::new(index % columns, index / columns), *tile)
        })
    }

    fn index(&self, tile: TilePos) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }
        let row = usize::try_from(tile.row()).ok()?;
        let column = usize::try_from(tile.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

/// Cosmetic visual-state tag driving sprite selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Expression {
    /// Resting face.
    #[default]
    Neutral,
    /// Shown after taking damage or while fleeing.
    Hurt,
    /// Shown while attacking or chasing.
    Angry,
    /// Shown after healing.
    Happy,
}

impl Expression {
    /// Name used when looking up sprite assets.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Hurt => "hurt",
            Self::Angry => "angry",
            Self::Happy => "happy",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current AI behaviour of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum EnemyMode {
    /// Wanders between random neighbouring floor tiles.
    #[default]
    Patrol,
    /// Steps toward a visible player.
    Chase,
    /// Steps away from the player while badly hurt.
    Flee,
}

/// Unique identifier assigned to an enemy slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Current and maximum health of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Health {
    current: u32,
    maximum: u32,
}

impl Health {
    /// Creates a full health pool.
    #[must_use]
    pub const fn full(maximum: u32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Creates a health pool with an explicit current value clamped to `maximum`.
    #[must_use]
    pub fn new(current: u32, maximum: u32) -> Self {
        Self {
            current: current.min(maximum),
            maximum,
        }
    }

    /// Remaining health points.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Upper bound for the health pool.
    #[must_use]
    pub const fn maximum(&self) -> u32 {
        self.maximum
    }

    /// Reports whether the pool is empty.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Removes a single point of health, never dropping below zero.
    pub fn damage(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Restores health, never exceeding the maximum.
    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.maximum);
    }
}

/// Difficulty tier selecting how often enemies think in ranged mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    /// Enemies think every 35 frames.
    Easy,
    /// Enemies think every 20 frames.
    Medium,
    /// Enemies think every 10 frames.
    #[default]
    Hard,
}

impl Difficulty {
    /// Frames between two AI passes.
    #[must_use]
    pub const fn ai_cadence(self) -> u32 {
        match self {
            Self::Easy => 35,
            Self::Medium => 20,
            Self::Hard => 10,
        }
    }

    /// Canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a difficulty name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown difficulty `{0}` (expected EASY, MEDIUM or HARD)")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Self::Easy),
            "MEDIUM" => Ok(Self::Medium),
            "HARD" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError(value.to_owned())),
        }
    }
}

/// Selects which combat resolver and scoring rules drive the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatMode {
    /// Player casts fireballs at enemies within range.
    #[default]
    Ranged,
    /// Player strikes an adjacent enemy.
    Melee,
}

impl CombatMode {
    /// Frames between two AI passes for this mode at the given difficulty.
    #[must_use]
    pub const fn ai_cadence(self, difficulty: Difficulty) -> u32 {
        match self {
            Self::Ranged => difficulty.ai_cadence(),
            Self::Melee => 5,
        }
    }

    /// Bonus awarded when the player reaches the goal.
    #[must_use]
    pub const fn win_bonus(self, remaining_health: u32, defeated_enemies: u32) -> u32 {
        let health_bonus = remaining_health.saturating_mul(WIN_HEALTH_BONUS);
        match self {
            Self::Ranged => health_bonus,
            Self::Melee => {
                health_bonus.saturating_add(defeated_enemies.saturating_mul(MELEE_DEFEAT_BONUS))
            }
        }
    }

    /// Canonical lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ranged => "ranged",
            Self::Melee => "melee",
        }
    }
}

impl fmt::Display for CombatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a combat mode name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown combat mode `{0}` (expected ranged or melee)")]
pub struct ParseCombatModeError(String);

impl FromStr for CombatMode {
    type Err = ParseCombatModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ranged" | "fireball" => Ok(Self::Ranged),
            "melee" | "sword" => Ok(Self::Melee),
            _ => Err(ParseCombatModeError(value.to_owned())),
        }
    }
}

/// Terminal result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The player reached the goal tile.
    Won,
    /// The player's health reached zero.
    Lost,
}

/// Why a projectile left play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpiryReason {
    /// The projectile travelled its full range.
    Range,
    /// The projectile entered a wall tile.
    Wall,
    /// The projectile struck an enemy.
    Hit,
}

/// Why points were awarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScoreReason {
    /// The player killed an enemy.
    Kill,
    /// The player reached the goal.
    Escape,
    /// Every enemy in the session is dead.
    Clear,
}

/// Decision taken by an enemy during a single AI tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyDecision {
    /// The post-chase cooldown absorbs the tick.
    CoolDown,
    /// Step away from the player onto `to`.
    Flee {
        /// Destination tile of the step.
        to: TilePos,
    },
    /// Step toward the player onto `to`.
    Chase {
        /// Destination tile of the step.
        to: TilePos,
    },
    /// The patrol cooldown absorbs the tick.
    Rest,
    /// Wander onto `to` and rest for `rest` ticks afterwards.
    Patrol {
        /// Destination tile of the step.
        to: TilePos,
        /// Patrol cooldown armed after the step.
        rest: u32,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Discards every entity and starts a fresh session on the provided grid.
    ConfigureSession {
        /// Tile layout of the new session.
        grid: TileGrid,
        /// Combat rules applied for the session.
        combat: CombatMode,
    },
    /// Places a new enemy on the provided tile.
    SpawnEnemy {
        /// Tile the enemy should occupy.
        tile: TilePos,
    },
    /// Advances cosmetic timers by the frame delta.
    Tick {
        /// Wall-clock time elapsed since the previous frame.
        dt: Duration,
    },
    /// Requests that the player step one tile in the provided direction.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Launches a fireball from the player toward an enemy.
    LaunchFireball {
        /// Enemy the fireball is aimed at.
        target: EnemyId,
    },
    /// Performs a melee swing, striking `target` when present.
    Swing {
        /// Enemy struck by the swing, if any was adjacent.
        target: Option<EnemyId>,
    },
    /// Moves every active projectile one frame forward and resolves impacts.
    AdvanceProjectiles,
    /// Applies an AI decision to an enemy.
    EnemyThink {
        /// Enemy taking the decision.
        enemy: EnemyId,
        /// Decision to apply.
        decision: EnemyDecision,
    },
    /// Resolves enemies standing on the player's tile.
    ResolveContacts,
    /// Ends the session with a win when the player stands on the goal.
    CheckGoal,
    /// Awards the one-shot melee bonus once every enemy is dead.
    CheckClearBonus,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A fresh session started.
    SessionConfigured {
        /// Number of tile columns in the new grid.
        columns: u32,
        /// Number of tile rows in the new grid.
        rows: u32,
        /// Combat rules applied for the session.
        combat: CombatMode,
    },
    /// An enemy was placed into the dungeon.
    EnemySpawned {
        /// Identifier allocated to the enemy.
        enemy: EnemyId,
        /// Tile the enemy occupies.
        tile: TilePos,
    },
    /// The frame clock advanced.
    TimeAdvanced {
        /// Wall-clock time elapsed in the frame.
        dt: Duration,
    },
    /// The player stepped between two tiles.
    PlayerMoved {
        /// Tile occupied before the step.
        from: TilePos,
        /// Tile occupied after the step.
        to: TilePos,
    },
    /// The player lost a health point.
    PlayerDamaged {
        /// Health remaining after the hit.
        health: u32,
    },
    /// The player regained health.
    PlayerHealed {
        /// Health after healing.
        health: u32,
    },
    /// An enemy moved between two tiles.
    EnemyMoved {
        /// Enemy that moved.
        enemy: EnemyId,
        /// Tile occupied before the move.
        from: TilePos,
        /// Tile occupied after the move.
        to: TilePos,
    },
    /// An enemy lost a health point.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Health remaining after the hit.
        health: u32,
    },
    /// An enemy's health reached zero.
    EnemyDefeated {
        /// Enemy that died.
        enemy: EnemyId,
    },
    /// A fireball entered play.
    ProjectileLaunched {
        /// Identifier allocated to the projectile.
        projectile: ProjectileId,
        /// Enemy the fireball was aimed at.
        target: EnemyId,
    },
    /// A fireball left play.
    ProjectileExpired {
        /// Projectile that expired.
        projectile: ProjectileId,
        /// Reason the projectile stopped.
        reason: ExpiryReason,
    },
    /// The player swung a melee attack.
    SwingPerformed {
        /// Enemy struck by the swing, if any.
        target: Option<EnemyId>,
    },
    /// Points were added to the score.
    ScoreAwarded {
        /// Points added.
        amount: u32,
        /// Why the points were awarded.
        reason: ScoreReason,
        /// Score after the award.
        total: u32,
    },
    /// The session reached a terminal state.
    SessionEnded {
        /// Whether the player won or lost.
        outcome: Outcome,
        /// Final score.
        score: u32,
    },
}

/// Immutable representation of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Tile currently occupied by the player.
    pub tile: TilePos,
    /// Eased render position in pixels.
    pub render_position: PixelPoint,
    /// Current health pool.
    pub health: Health,
    /// Current visual-state tag.
    pub expression: Expression,
    /// Direction of the most recent successful step.
    pub facing: Option<Direction>,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Tile currently occupied by the enemy.
    pub tile: TilePos,
    /// Eased render position in pixels.
    pub render_position: PixelPoint,
    /// Current health pool.
    pub health: Health,
    /// Whether the enemy still takes part in the session.
    pub alive: bool,
    /// Current AI behaviour.
    pub mode: EnemyMode,
    /// Current visual-state tag.
    pub expression: Expression,
    /// AI ticks left before the next patrol step.
    pub patrol_cooldown: u32,
    /// AI ticks left before the enemy may decide again after a chase step.
    pub move_cooldown: u32,
    /// AI ticks left on the flee timer.
    pub flee_timer: u32,
}

impl EnemySnapshot {
    /// Reports whether the enemy stands on the provided tile.
    #[must_use]
    pub fn is_touching(&self, player: TilePos) -> bool {
        self.tile == player
    }

    /// Reports whether the player lies within `max_sight` Manhattan distance.
    #[must_use]
    pub fn can_see(&self, player: TilePos, max_sight: u32) -> bool {
        self.tile.manhattan_distance(player) <= max_sight
    }
}

/// Read-only snapshot describing every enemy slot, dead or alive.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over every enemy in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the enemies that are still alive, in storage order.
    pub fn living(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.alive)
    }

    /// Snapshot of the enemy with the provided identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of enemies that are still alive.
    #[must_use]
    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    /// Number of enemy slots, dead or alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a single projectile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Current position in tile units.
    pub position: TilePoint,
    /// Displacement applied every frame.
    pub velocity: TilePoint,
    /// Distance covered so far.
    pub traveled: f32,
    /// Distance after which the projectile expires.
    pub range: f32,
}

/// Problems found while reading a session query string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryIssue {
    /// The difficulty value was not recognised; HARD is used instead.
    UnknownDifficulty(String),
    /// The combat mode value was not recognised and was ignored.
    UnknownCombatMode(String),
    /// The seed was not an unsigned integer and was ignored.
    InvalidSeed(String),
    /// The key is not a session parameter and was ignored.
    UnknownKey(String),
}

/// Parameters read once when a session starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    /// Skin tone identifier used for player sprite lookup.
    pub skin: String,
    /// Clothing identifier used for player sprite lookup.
    pub clothes: String,
    /// Held prop identifier used for player sprite lookup.
    pub prop: Option<String>,
    /// Difficulty tier selecting the AI cadence.
    pub difficulty: Difficulty,
    /// Combat rules for the session.
    pub combat: CombatMode,
    /// Seed for the session's random source; entropy is used when absent.
    pub seed: Option<u64>,
    /// Number of enemies placed at session start.
    pub enemy_count: usize,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            skin: "f1c27d".to_owned(),
            clothes: "0033cc".to_owned(),
            prop: None,
            difficulty: Difficulty::default(),
            combat: CombatMode::default(),
            seed: None,
            enemy_count: DEFAULT_ENEMY_COUNT,
        }
    }
}

impl SessionParams {
    /// Parses parameters from a URL-style query such as
    /// `skin=f1c27d&clothes=0033cc&prop=none&difficulty=EASY`.
    #[must_use]
    pub fn from_query(query: &str) -> (Self, Vec<QueryIssue>) {
        let mut params = Self::default();
        let issues = params.apply_query(query);
        (params, issues)
    }

    /// Overlays the keys present in `query` onto these parameters.
    ///
    /// Keys and values are percent-decoded and a leading `?` is ignored.
    /// Unrecognised difficulty values fall back to HARD; every other problem
    /// leaves the field untouched.
    pub fn apply_query(&mut self, query: &str) -> Vec<QueryIssue> {
        let mut issues = Vec::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let (key, value) = (decode_component(key), decode_component(value));
            let (key, value) = (key.as_str(), value.as_str());
            match key {
                "skin" => self.skin = value.to_owned(),
                "clothes" => self.clothes = value.to_owned(),
                "prop" => self.set_prop(value),
                "difficulty" => match value.parse::<Difficulty>() {
                    Ok(difficulty) => self.difficulty = difficulty,
                    Err(_) => {
                        self.difficulty = Difficulty::Hard;
                        issues.push(QueryIssue::UnknownDifficulty(value.to_owned()));
                    }
                },
                "combat" => match value.parse::<CombatMode>() {
                    Ok(combat) => self.combat = combat,
                    Err(_) => issues.push(QueryIssue::UnknownCombatMode(value.to_owned())),
                },
                "seed" => match value.parse::<u64>() {
                    Ok(seed) => self.seed = Some(seed),
                    Err(_) => issues.push(QueryIssue::InvalidSeed(value.to_owned())),
                },
                other => issues.push(QueryIssue::UnknownKey(other.to_owned())),
            }
        }
        issues
    }

    /// Sets the held prop; `none` and the empty string clear it.
    pub fn set_prop(&mut self, value: &str) {
        self.prop = match value {
            "" | "none" => None,
            prop => Some(prop.to_owned()),
        };
    }
}

/// Decodes one form-encoded query component: `+` is a space and `%XX`
/// escapes are bytes. Invalid UTF-8 is replaced rather than rejected.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_and_chebyshev_distances_match_expectation() {
        let origin = TilePos::new(1, 1);
        let destination = TilePos::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
        assert_eq!(origin.chebyshev_distance(destination), 3);
    }

    #[test]
    fn stepping_off_the_origin_is_rejected() {
        let origin = TilePos::new(0, 0);
        assert_eq!(origin.step(Direction::West), None);
        assert_eq!(origin.step(Direction::North), None);
        assert_eq!(origin.step(Direction::East), Some(TilePos::new(1, 0)));
    }

    #[test]
    fn direction_to_only_accepts_orthogonal_neighbours() {
        let tile = TilePos::new(3, 3);
        assert_eq!(tile.direction_to(TilePos::new(3, 2)), Some(Direction::North));
        assert_eq!(tile.direction_to(TilePos::new(2, 3)), Some(Direction::West));
        assert_eq!(tile.direction_to(TilePos::new(4, 4)), None);
        assert_eq!(tile.direction_to(tile), None);
    }

    #[test]
    fn tile_point_maps_negative_coordinates_outside_the_grid() {
        assert_eq!(TilePoint::new(-0.1, 2.0).tile(), None);
        assert_eq!(TilePoint::new(2.9, 0.0).tile(), Some(TilePos::new(2, 0)));
    }

    #[test]
    fn open_grid_places_single_goal_opposite_the_start() {
        let grid = TileGrid::open(DEFAULT_COLUMNS, DEFAULT_ROWS);
        assert_eq!(grid.goal(), TilePos::new(18, 18));
        assert_eq!(grid.get(TilePos::new(18, 18)), Some(Tile::Goal));
        assert_eq!(grid.get(grid.start()), Some(Tile::Floor));
        let goals = grid.iter().filter(|(_, tile)| *tile == Tile::Goal).count();
        assert_eq!(goals, 1);
    }

    #[test]
    fn grid_from_codes_reads_rows_top_to_bottom() {
        let grid = TileGrid::from_codes(&[&[1, 1, 1], &[1, 0, 2], &[1, 1, 1]]);
        assert_eq!(grid.columns(), 3);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.get(TilePos::new(1, 1)), Some(Tile::Floor));
        assert_eq!(grid.get(TilePos::new(2, 1)), Some(Tile::Goal));
        assert_eq!(grid.get(TilePos::new(3, 1)), None);
        assert!(!grid.is_walkable(TilePos::new(0, 0)));
    }

    #[test]
    fn health_clamps_between_zero_and_maximum() {
        let mut health = Health::full(2);
        health.damage();
        health.damage();
        health.damage();
        assert_eq!(health.current(), 0);
        assert!(health.is_depleted());
        health.heal(5);
        assert_eq!(health.current(), 2);
    }

    #[test]
    fn difficulty_cadence_matches_tiers() {
        assert_eq!(CombatMode::Ranged.ai_cadence(Difficulty::Easy), 35);
        assert_eq!(CombatMode::Ranged.ai_cadence(Difficulty::Medium), 20);
        assert_eq!(CombatMode::Ranged.ai_cadence(Difficulty::Hard), 10);
        assert_eq!(CombatMode::Melee.ai_cadence(Difficulty::Easy), 5);
    }

    #[test]
    fn difficulty_parsing_is_strict() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert!("NIGHTMARE".parse::<Difficulty>().is_err());
    }

    #[test]
    fn win_bonus_counts_defeated_enemies_only_in_melee() {
        assert_eq!(CombatMode::Ranged.win_bonus(2, 3), 60);
        assert_eq!(CombatMode::Melee.win_bonus(2, 3), 60 + 150);
    }

    #[test]
    fn query_parsing_reads_customisation_and_difficulty() {
        let (params, issues) =
            SessionParams::from_query("?skin=8d5524&clothes=cc0000&prop=none&difficulty=EASY");
        assert!(issues.is_empty());
        assert_eq!(params.skin, "8d5524");
        assert_eq!(params.clothes, "cc0000");
        assert_eq!(params.prop, None);
        assert_eq!(params.difficulty, Difficulty::Easy);
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let (params, issues) = SessionParams::from_query(
            "difficulty=%45ASY&prop=magic%20wand&skin=8d5524&clothes=00+33cc",
        );
        assert!(issues.is_empty());
        assert_eq!(params.difficulty, Difficulty::Easy);
        assert_eq!(params.prop.as_deref(), Some("magic wand"));
        assert_eq!(params.skin, "8d5524");
        assert_eq!(params.clothes, "00 33cc");

        let (params, issues) = SessionParams::from_query("difficulty=%4Eope");
        assert_eq!(params.difficulty, Difficulty::Hard);
        assert_eq!(issues, vec![QueryIssue::UnknownDifficulty("Nope".to_owned())]);
    }

    #[test]
    fn unknown_query_difficulty_falls_back_to_hard() {
        let mut params = SessionParams {
            difficulty: Difficulty::Easy,
            ..SessionParams::default()
        };
        let issues = params.apply_query("difficulty=IMPOSSIBLE&colour=red");
        assert_eq!(params.difficulty, Difficulty::Hard);
        assert_eq!(
            issues,
            vec![
                QueryIssue::UnknownDifficulty("IMPOSSIBLE".to_owned()),
                QueryIssue::UnknownKey("colour".to_owned()),
            ]
        );
    }

    #[test]
    fn session_params_fill_missing_toml_fields_with_defaults() {
        let params: SessionParams = toml::from_str(
            r#"
                difficulty = "MEDIUM"
                combat = "melee"
                prop = "sword"
            "#,
        )
        .expect("valid session toml");
        assert_eq!(params.difficulty, Difficulty::Medium);
        assert_eq!(params.combat, CombatMode::Melee);
        assert_eq!(params.prop.as_deref(), Some("sword"));
        assert_eq!(params.skin, "f1c27d");
        assert_eq!(params.enemy_count, DEFAULT_ENEMY_COUNT);
    }
}
