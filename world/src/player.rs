use std::time::Duration;

use dungeon_crawl_core::{
    Direction, Expression, Health, PixelPoint, PlayerSnapshot, TileGrid, TilePos,
    ANGRY_EXPRESSION, HAPPY_EXPRESSION, HURT_EXPRESSION, PLAYER_MAX_HEALTH,
};

use crate::mood::{ease, Mood};

const EASING: f32 = 0.3;
const SNAP_DISTANCE_PX: f32 = 0.5;

#[derive(Clone, Debug)]
pub(crate) struct Player {
    tile: TilePos,
    render_position: PixelPoint,
    health: Health,
    mood: Mood,
    facing: Option<Direction>,
}

impl Player {
    pub(crate) fn spawn(tile: TilePos) -> Self {
        Self {
            tile,
            render_position: PixelPoint::of_tile(tile),
            health: Health::full(PLAYER_MAX_HEALTH),
            mood: Mood::default(),
            facing: None,
        }
    }

    pub(crate) const fn tile(&self) -> TilePos {
        self.tile
    }

    pub(crate) const fn health(&self) -> Health {
        self.health
    }

    pub(crate) const fn facing(&self) -> Option<Direction> {
        self.facing
    }

    /// Steps onto a walkable neighbour, returning the new tile. Illegal targets leave the player in place.
    pub(crate) fn try_move(&mut self, direction: Direction, grid: &TileGrid) -> Option<TilePos> {
        let destination = self.tile.step(direction)?;
        if !grid.is_walkable(destination) {
            return None;
        }
        self.tile = destination;
        self.facing = Some(direction);
        Some(destination)
    }

    pub(crate) fn take_damage(&mut self) {
        self.health.damage();
        self.mood.show_for(Expression::Hurt, HURT_EXPRESSION);
    }

    pub(crate) fn heal(&mut self, amount: u32) {
        self.health.heal(amount);
        self.mood.show_for(Expression::Happy, HAPPY_EXPRESSION);
    }

    pub(crate) fn attack(&mut self) {
        self.mood.show_for(Expression::Angry, ANGRY_EXPRESSION);
    }

    pub(crate) fn tick(&mut self, dt: Duration) {
        self.mood.tick(dt, !self.health.is_depleted());
        self.render_position = ease(
            self.render_position,
            PixelPoint::of_tile(self.tile),
            EASING,
            Some(SNAP_DISTANCE_PX),
        );
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            tile: self.tile,
            render_position: self.render_position,
            health: self.health,
            expression: self.mood.expression(),
            facing: self.facing,
        }
    }
}
