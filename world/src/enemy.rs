use std::time::Duration;

use dungeon_crawl_core::{
    EnemyId, EnemyMode, EnemySnapshot, Expression, Health, PixelPoint, TilePos,
    CHASE_MOVE_COOLDOWN, ENEMY_MAX_HEALTH, FLEE_TIMER_RESET, HURT_EXPRESSION,
};

use crate::mood::{ease, Mood};

const EASING: f32 = 0.2;

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    id: EnemyId,
    tile: TilePos,
    render_position: PixelPoint,
    health: Health,
    alive: bool,
    mode: EnemyMode,
    mood: Mood,
    patrol_cooldown: u32,
    move_cooldown: u32,
    flee_timer: u32,
}

impl Enemy {
    pub(crate) fn spawn(id: EnemyId, tile: TilePos) -> Self {
        Self {
            id,
            tile,
            render_position: PixelPoint::of_tile(tile),
            health: Health::full(ENEMY_MAX_HEALTH),
            alive: true,
            mode: EnemyMode::Patrol,
            mood: Mood::default(),
            patrol_cooldown: 0,
            move_cooldown: 0,
            flee_timer: 0,
        }
    }

    pub(crate) const fn id(&self) -> EnemyId {
        self.id
    }

    pub(crate) const fn tile(&self) -> TilePos {
        self.tile
    }

    pub(crate) const fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) const fn health(&self) -> Health {
        self.health
    }

    pub(crate) const fn move_cooldown(&self) -> u32 {
        self.move_cooldown
    }

    pub(crate) fn is_touching(&self, tile: TilePos) -> bool {
        self.tile == tile
    }

    /// Removes a health point and reports whether this hit killed the enemy.
    pub(crate) fn take_damage(&mut self) -> bool {
        let was_alive = self.alive;
        self.health.damage();
        self.mood.show_for(Expression::Hurt, HURT_EXPRESSION);
        if self.health.is_depleted() {
            self.alive = false;
        }
        was_alive && !self.alive
    }

    pub(crate) fn relocate(&mut self, tile: TilePos) {
        self.tile = tile;
    }

    pub(crate) fn cool_down(&mut self) {
        self.move_cooldown = self.move_cooldown.saturating_sub(1);
    }

    pub(crate) fn flee_to(&mut self, tile: TilePos) {
        self.tile = tile;
        self.mode = EnemyMode::Flee;
        self.mood.show(Expression::Hurt);
        self.flee_timer = FLEE_TIMER_RESET;
    }

    pub(crate) fn chase_to(&mut self, tile: TilePos) {
        self.tile = tile;
        self.mode = EnemyMode::Chase;
        self.mood.show(Expression::Angry);
        self.move_cooldown = CHASE_MOVE_COOLDOWN;
    }

    pub(crate) fn rest(&mut self) {
        self.mode = EnemyMode::Patrol;
        self.patrol_cooldown = self.patrol_cooldown.saturating_sub(1);
    }

    pub(crate) fn patrol_to(&mut self, tile: TilePos, rest: u32) {
        self.tile = tile;
        self.mode = EnemyMode::Patrol;
        self.mood.show(Expression::Neutral);
        self.patrol_cooldown = rest;
    }

    /// Runs down the flee timer by one AI pass. Nothing reads the timer besides snapshots.
    pub(crate) fn age_flee_timer(&mut self) {
        self.flee_timer = self.flee_timer.saturating_sub(1);
    }

    pub(crate) fn tick(&mut self, dt: Duration) {
        self.mood.tick(dt, self.alive);
        self.render_position = ease(
            self.render_position,
            PixelPoint::of_tile(self.tile),
            EASING,
            None,
        );
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            tile: self.tile,
            render_position: self.render_position,
            health: self.health,
            alive: self.alive,
            mode: self.mode,
            expression: self.mood.expression(),
            patrol_cooldown: self.patrol_cooldown,
            move_cooldown: self.move_cooldown,
            flee_timer: self.flee_timer,
        }
    }
}
