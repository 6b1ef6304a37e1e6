use dungeon_crawl_core::{
    CombatMode, Expression, PixelPoint, SessionParams, TilePoint, SPRITE_SIZE_PX, TILE_SIZE_PX,
};
use dungeon_crawl_rendering::{
    palette, AssetKey, CirclePresentation, EndBanner, Hud, RenderingError, Scene,
    SpritePresentation, TileGridPresentation,
};
use dungeon_crawl_world::{query, World};
use glam::Vec2;

const PROJECTILE_RADIUS_PX: f32 = 4.0;
/// Radius of the cast-range and melee-reach rings, in tiles.
const INDICATOR_RADIUS_TILES: f32 = 1.5;

/// Describes the current state of `world` as a drawable scene.
pub(crate) fn build_scene(
    world: &World,
    params: &SessionParams,
) -> Result<Scene, RenderingError> {
    let grid = query::tile_grid(world);
    let tile_grid = TileGridPresentation::new(
        grid.columns(),
        grid.rows(),
        TILE_SIZE_PX,
        grid.iter().map(|(_, tile)| tile).collect(),
    )?;

    let player = query::player(world);
    let player_sprite = SpritePresentation::new(
        pixel(player.render_position),
        SPRITE_SIZE_PX,
        AssetKey::player(
            player.expression,
            &params.skin,
            &params.clothes,
            params.prop.as_deref(),
        ),
        palette::PLAYER_FALLBACK,
    );
    let player_center = pixel(player.render_position) + Vec2::splat(SPRITE_SIZE_PX / 2.0);

    let mut scene = Scene::new(tile_grid, player_sprite);
    let finished = query::outcome(world);
    match query::combat_mode(world) {
        CombatMode::Ranged if finished.is_none() => {
            scene.aim_indicator = Some(CirclePresentation::new(
                player_center,
                INDICATOR_RADIUS_TILES * TILE_SIZE_PX,
                palette::AIM,
            ));
        }
        CombatMode::Melee if query::attack_indicator_frames(world) > 0 => {
            scene.attack_indicator = Some(CirclePresentation::new(
                player_center,
                INDICATOR_RADIUS_TILES * TILE_SIZE_PX,
                palette::ATTACK,
            ));
        }
        _ => {}
    }

    let enemies = query::enemy_view(world);
    scene.enemies = enemies
        .living()
        .map(|enemy| {
            SpritePresentation::new(
                pixel(enemy.render_position),
                SPRITE_SIZE_PX,
                AssetKey::enemy(enemy.expression),
                palette::ENEMY_FALLBACK,
            )
            .with_alternate(AssetKey::enemy(Expression::Neutral))
        })
        .collect();
    scene.projectiles = query::projectiles(world)
        .iter()
        .map(|projectile| {
            CirclePresentation::new(
                tile_point(projectile.position),
                PROJECTILE_RADIUS_PX,
                palette::FIREBALL,
            )
        })
        .collect();

    let score = query::score(world);
    scene.hud = Hud {
        health: player.health.current(),
        living_enemies: enemies.living_count(),
        score,
    };
    scene.banner = finished.map(|outcome| EndBanner::for_outcome(outcome, score));
    Ok(scene)
}

fn pixel(point: PixelPoint) -> Vec2 {
    Vec2::new(point.x, point.y)
}

fn tile_point(point: TilePoint) -> Vec2 {
    Vec2::new(point.x * TILE_SIZE_PX, point.y * TILE_SIZE_PX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dungeon_crawl_core::{Command, Direction, EnemyId, Outcome, Tile, TileGrid, TilePos};
    use dungeon_crawl_world as world;

    fn session(combat: CombatMode, grid: TileGrid, enemies: &[TilePos]) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureSession { grid, combat },
            &mut events,
        );
        for tile in enemies {
            world::apply(&mut world, Command::SpawnEnemy { tile: *tile }, &mut events);
        }
        world
    }

    #[test]
    fn ranged_scene_shows_aim_ring_and_hud() {
        let world = session(
            CombatMode::Ranged,
            TileGrid::open(8, 8),
            &[TilePos::new(5, 5), TilePos::new(1, 6)],
        );
        let scene = build_scene(&world, &SessionParams::default()).expect("scene builds");

        assert_eq!(scene.tile_grid.tiles.len(), 64);
        assert_eq!(scene.tile_grid.tiles[0], Tile::Floor);
        assert_eq!(scene.tile_grid.tiles[6 * 8 + 6], Tile::Goal);
        assert_eq!(
            scene.player.asset.as_str(),
            "neutral-skinf1c27d-clothes0033cc"
        );
        assert_eq!(scene.player.position, Vec2::new(32.0, 32.0));

        let aim = scene.aim_indicator.expect("ranged sessions show the aim ring");
        assert_eq!(aim.center, Vec2::new(48.0, 48.0));
        assert_eq!(aim.radius, 48.0);
        assert!(scene.attack_indicator.is_none());

        assert_eq!(scene.enemies.len(), 2);
        assert_eq!(scene.enemies[0].asset.as_str(), "neutral");
        assert_eq!(
            scene.hud,
            Hud {
                health: 3,
                living_enemies: 2,
                score: 0,
            }
        );
        assert!(scene.banner.is_none());
    }

    #[test]
    fn fireball_is_drawn_in_pixels() {
        let mut world = session(CombatMode::Ranged, TileGrid::open(8, 8), &[TilePos::new(5, 1)]);
        let mut events = Vec::new();
        for _ in 0..3 {
            world::apply(
                &mut world,
                Command::MovePlayer {
                    direction: Direction::East,
                },
                &mut events,
            );
        }
        world::apply(
            &mut world,
            Command::LaunchFireball {
                target: EnemyId::new(0),
            },
            &mut events,
        );

        let scene = build_scene(&world, &SessionParams::default()).expect("scene builds");
        assert_eq!(scene.projectiles.len(), 1);
        assert_eq!(scene.projectiles[0].center, Vec2::new(144.0, 48.0));
        assert_eq!(scene.projectiles[0].radius, PROJECTILE_RADIUS_PX);
    }

    #[test]
    fn hurt_enemy_falls_back_to_the_neutral_sprite() {
        let mut world = session(CombatMode::Melee, TileGrid::open(8, 8), &[TilePos::new(5, 1)]);
        let mut events = Vec::new();
        for _ in 0..3 {
            world::apply(
                &mut world,
                Command::MovePlayer {
                    direction: Direction::East,
                },
                &mut events,
            );
        }
        world::apply(
            &mut world,
            Command::Swing {
                target: Some(EnemyId::new(0)),
            },
            &mut events,
        );

        let scene = build_scene(&world, &SessionParams::default()).expect("scene builds");
        let keys: Vec<_> = scene.enemies[0].candidates().map(AssetKey::as_str).collect();
        assert_eq!(keys, ["hurt", "neutral"]);
        assert_eq!(scene.enemies[0].fallback, palette::ENEMY_FALLBACK);
        assert!(scene.player.alternate.is_none());
    }

    #[test]
    fn prop_is_part_of_the_player_asset_key() {
        let world = session(CombatMode::Melee, TileGrid::open(6, 6), &[]);
        let params = SessionParams {
            prop: Some("sword".to_owned()),
            ..SessionParams::default()
        };
        let scene = build_scene(&world, &params).expect("scene builds");

        assert_eq!(
            scene.player.asset.as_str(),
            "neutral-skinf1c27d-clothes0033cc-sword"
        );
        assert!(scene.aim_indicator.is_none());
        assert!(scene.attack_indicator.is_none());
    }

    #[test]
    fn melee_swing_shows_attack_ring() {
        let mut world = session(CombatMode::Melee, TileGrid::open(6, 6), &[]);
        let mut events = Vec::new();
        world::apply(&mut world, Command::Swing { target: None }, &mut events);
        let scene = build_scene(&world, &SessionParams::default()).expect("scene builds");

        assert!(scene.attack_indicator.is_some());
    }

    #[test]
    fn finished_session_shows_banner() {
        let mut world = session(CombatMode::Ranged, TileGrid::open(3, 3), &[]);
        let mut events = Vec::new();
        world::apply(&mut world, Command::CheckGoal, &mut events);
        assert_eq!(query::outcome(&world), Some(Outcome::Won));

        let scene = build_scene(&world, &SessionParams::default()).expect("scene builds");
        let banner = scene.banner.expect("won sessions show a banner");
        assert_eq!(banner.message, "You escaped the dungeon!");
        assert_eq!(banner.score, 90);
        assert!(scene.aim_indicator.is_none());
    }
}
