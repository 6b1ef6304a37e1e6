#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-driven orchestration of a Dungeon Crawl session.
//!
//! [`GameLoop`] owns the world, the pure systems and the session's random
//! source. Every call to [`GameLoop::advance`] runs one frame in a fixed
//! order: debounced input, cosmetic tick, projectile flight, throttled AI,
//! contact damage, goal check and the melee clear bonus.

mod input;

use std::time::Duration;

use dungeon_crawl_core::{
    CombatMode, Command, Difficulty, Event, Outcome, TileGrid, DEFAULT_COLUMNS,
    DEFAULT_ENEMY_COUNT, DEFAULT_ROWS,
};
use dungeon_crawl_system_combat::Combat;
use dungeon_crawl_system_enemy_ai::{self as enemy_ai, EnemyAi};
use dungeon_crawl_system_map_generation::{self as map_generation, GenerationError};
use dungeon_crawl_system_spawning::{self as spawning, Spawning};
use dungeon_crawl_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use crate::input::{Action, HeldKeys};
use crate::input::Debounce;

/// Configuration parameters for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    columns: u32,
    rows: u32,
    difficulty: Difficulty,
    combat: CombatMode,
    enemy_count: usize,
    seed: u64,
}

impl Config {
    /// Creates a configuration for a default-sized dungeon.
    #[must_use]
    pub const fn new(difficulty: Difficulty, combat: CombatMode, seed: u64) -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            difficulty,
            combat,
            enemy_count: DEFAULT_ENEMY_COUNT,
            seed,
        }
    }

    /// Overrides the dungeon dimensions.
    #[must_use]
    pub const fn with_grid_size(mut self, columns: u32, rows: u32) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    /// Overrides the number of enemies placed per session.
    #[must_use]
    pub const fn with_enemy_count(mut self, enemy_count: usize) -> Self {
        self.enemy_count = enemy_count;
        self
    }

    /// Difficulty tier of the session.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Combat rules of the session.
    #[must_use]
    pub const fn combat(&self) -> CombatMode {
        self.combat
    }

    /// Seed of the session's random source.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Frames between two AI passes.
    #[must_use]
    pub const fn ai_cadence(&self) -> u32 {
        self.combat.ai_cadence(self.difficulty)
    }
}

/// Owns a running session and drives it one frame at a time.
#[derive(Debug)]
pub struct GameLoop {
    config: Config,
    world: World,
    spawning: Spawning,
    enemy_ai: EnemyAi,
    combat: Combat,
    rng: ChaCha8Rng,
    debounce: Debounce,
    frame: u64,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl GameLoop {
    /// Builds a session: generates the dungeon, configures the world and spawns enemies.
    pub fn new(config: Config) -> Result<Self, GenerationError> {
        let mut game = Self::idle(config);
        game.restart()?;
        Ok(game)
    }

    /// Builds a session on a prepared dungeon instead of a generated one.
    ///
    /// Later restarts generate fresh dungeons as usual.
    #[must_use]
    pub fn from_grid(config: Config, grid: TileGrid) -> Self {
        let mut game = Self::idle(config);
        game.start(grid);
        game
    }

    fn idle(config: Config) -> Self {
        Self {
            config,
            world: World::new(),
            spawning: Spawning::new(spawning::Config::new(config.enemy_count)),
            enemy_ai: EnemyAi::new(enemy_ai::Config::default()),
            combat: Combat::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            debounce: Debounce::ready(),
            frame: 0,
            events: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Discards all session state and starts over on a freshly generated dungeon.
    pub fn restart(&mut self) -> Result<(), GenerationError> {
        let grid = map_generation::generate(
            &map_generation::Config::new(self.config.columns, self.config.rows),
            &mut self.rng,
        )?;
        self.start(grid);
        Ok(())
    }

    fn start(&mut self, grid: TileGrid) {
        self.frame = 0;
        self.debounce = Debounce::ready();
        self.events.clear();
        self.submit(Command::ConfigureSession {
            grid,
            combat: self.config.combat,
        });

        let configured = self.events.clone();
        self.spawning.handle(
            &configured,
            query::tile_grid(&self.world),
            &mut self.rng,
            &mut self.commands,
        );
        self.flush_commands();

        log::info!(
            "session started: {} combat, {} difficulty, {} enemies",
            self.config.combat,
            self.config.difficulty,
            query::enemy_view(&self.world).len()
        );
    }

    /// Runs one frame and returns the events it produced.
    ///
    /// Frames after the session ended are no-ops.
    pub fn advance(&mut self, dt: Duration, keys: HeldKeys) -> &[Event] {
        self.events.clear();
        if self.is_over() {
            return &self.events;
        }

        if let Some(action) = self.debounce.admit(dt, keys.action()) {
            self.perform(action);
        }
        self.submit(Command::Tick { dt });
        if self.config.combat == CombatMode::Ranged {
            self.submit(Command::AdvanceProjectiles);
        }

        let cadence = u64::from(self.config.ai_cadence().max(1));
        if self.frame % cadence == 0 {
            self.think();
        }

        self.submit(Command::ResolveContacts);
        self.submit(Command::CheckGoal);
        if self.config.combat == CombatMode::Melee {
            self.submit(Command::CheckClearBonus);
        }

        if let Some(outcome) = self.outcome() {
            match outcome {
                Outcome::Won => log::info!("player escaped with score {}", self.score()),
                Outcome::Lost => log::info!("player defeated with score {}", self.score()),
            }
        }
        self.frame = self.frame.saturating_add(1);
        &self.events
    }

    /// Read-only access to the session state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Configuration the session runs with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Number of frames run since the session started.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Current score.
    #[must_use]
    pub fn score(&self) -> u32 {
        query::score(&self.world)
    }

    /// Terminal outcome, once reached.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        query::outcome(&self.world)
    }

    /// Reports whether the session has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Move(direction) => self.submit(Command::MovePlayer { direction }),
            Action::Attack => {
                self.combat.handle(
                    self.config.combat,
                    query::player(&self.world).tile,
                    &query::enemy_view(&self.world),
                    &mut self.commands,
                );
                self.flush_commands();
            }
        }
    }

    fn think(&mut self) {
        let enemies = query::enemy_view(&self.world);
        self.enemy_ai.handle(
            &enemies,
            query::player(&self.world).tile,
            query::tile_grid(&self.world),
            &mut self.rng,
            &mut self.commands,
        );
        log::debug!(
            "AI pass on frame {}: {} decisions for {} living enemies",
            self.frame,
            self.commands.len(),
            enemies.living_count()
        );
        self.flush_commands();
    }

    fn flush_commands(&mut self) {
        let commands = std::mem::take(&mut self.commands);
        for command in commands {
            self.submit(command);
        }
    }

    fn submit(&mut self, command: Command) {
        let first_new = self.events.len();
        world::apply(&mut self.world, command, &mut self.events);
        for event in &self.events[first_new..] {
            log::trace!("{event:?}");
        }
    }
}
