#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Dungeon Crawl.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, so the adapter depends on macroquad without its default
//! `audio` feature.

mod sprites;

use std::{path::PathBuf, sync::mpsc, time::Duration};

use anyhow::{Context, Result};
use dungeon_crawl_core::Tile;
use dungeon_crawl_rendering::{
    palette, CirclePresentation, Color, EndBanner, FrameInput, Hud, Presentation,
    RenderingBackend, Scene, SpritePresentation, TileGridPresentation,
};
use glam::Vec2;
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};

use self::sprites::SpriteAtlas;

/// Height of the HUD strip above the dungeon, in scene pixels.
const HUD_HEIGHT: f32 = 40.0;
const HUD_FONT_SIZE: f32 = 24.0;
const BANNER_FONT_SIZE: f32 = 36.0;
const INDICATOR_THICKNESS: f32 = 2.0;
const WALL_INSET: f32 = 2.0;

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    manifest_path: PathBuf,
    load_sprites: bool,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            manifest_path: SpriteAtlas::default_manifest_path(),
            load_sprites: true,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.swap_interval = if enabled { Some(1) } else { Some(0) };
        self
    }

    /// Configures whether the backend loads sprite images before the first frame.
    ///
    /// Without sprites every entity is drawn as its fallback rectangle.
    #[must_use]
    pub fn with_sprite_loading(mut self, enabled: bool) -> Self {
        self.load_sprites = enabled;
        self
    }

    /// Overrides the location of the sprite manifest.
    #[must_use]
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            manifest_path,
            load_sprites,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let (width, height) = scene_size(&scene.tile_grid);
        let mut config = macroquad::window::Conf {
            window_title,
            window_width: width.ceil() as i32,
            window_height: height.ceil() as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let (init_sender, init_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let atlas = if load_sprites {
                match SpriteAtlas::from_manifest_path(&manifest_path)
                    .context("failed to initialise sprite atlas")
                {
                    Ok(atlas) => atlas,
                    Err(error) => {
                        let _ = init_sender.send(Err(error));
                        return;
                    }
                }
            } else {
                SpriteAtlas::default()
            };
            log::info!("loaded {} sprites", atlas.len());
            if load_sprites && !atlas.contains(&scene.player.asset) {
                log::warn!(
                    "no sprite named `{}`; the player is drawn as a rectangle",
                    scene.player.asset
                );
            }
            let _ = init_sender.send(Ok(()));

            let background = to_macroquad_color(clear_color);
            loop {
                if is_key_pressed(KeyCode::Escape) {
                    break;
                }

                let input = KeyObservations::poll().frame_input();
                let dt = Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));
                update_scene(dt, input, &mut scene);

                macroquad::window::clear_background(background);
                let metrics = SceneMetrics::fit(
                    &scene.tile_grid,
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                draw_scene(&scene, &metrics, &atlas);

                macroquad::window::next_frame().await;
            }
        });

        init_receiver.recv().unwrap_or_else(|_| Ok(()))?;
        Ok(())
    }
}

/// Keys observed on a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct KeyObservations {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    space: bool,
    restart_pressed: bool,
}

impl KeyObservations {
    fn poll() -> Self {
        Self {
            up: is_key_down(KeyCode::Up) || is_key_down(KeyCode::W),
            down: is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
            left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
            space: is_key_down(KeyCode::Space),
            restart_pressed: is_key_pressed(KeyCode::R),
        }
    }

    fn frame_input(self) -> FrameInput {
        FrameInput {
            up: self.up,
            down: self.down,
            left: self.left,
            right: self.right,
            attack: self.space,
            restart: self.restart_pressed,
        }
    }
}

/// Maps scene pixels onto the screen, keeping the aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset: Vec2,
}

impl SceneMetrics {
    fn fit(tile_grid: &TileGridPresentation, screen_width: f32, screen_height: f32) -> Self {
        let (width, height) = scene_size(tile_grid);
        if width <= f32::EPSILON || height <= f32::EPSILON {
            return Self {
                scale: 1.0,
                offset: Vec2::ZERO,
            };
        }
        let scale = (screen_width / width).min(screen_height / height).max(0.0);
        let offset = Vec2::new(
            (screen_width - width * scale) / 2.0,
            (screen_height - height * scale) / 2.0,
        );
        Self { scale, offset }
    }

    /// Screen position of a point given in dungeon pixels.
    fn to_screen(&self, point: Vec2) -> Vec2 {
        self.offset + (point + Vec2::new(0.0, HUD_HEIGHT)) * self.scale
    }

    fn length(&self, length: f32) -> f32 {
        length * self.scale
    }
}

/// Dungeon size plus the HUD strip, in scene pixels.
fn scene_size(tile_grid: &TileGridPresentation) -> (f32, f32) {
    (tile_grid.width(), tile_grid.height() + HUD_HEIGHT)
}

fn draw_scene(scene: &Scene, metrics: &SceneMetrics, atlas: &SpriteAtlas) {
    draw_tiles(&scene.tile_grid, metrics);
    if let Some(aim) = scene.aim_indicator {
        draw_ring(aim, metrics);
    }
    if let Some(attack) = scene.attack_indicator {
        draw_ring(attack, metrics);
    }
    for enemy in &scene.enemies {
        draw_sprite(enemy, metrics, atlas);
    }
    draw_sprite(&scene.player, metrics, atlas);
    for projectile in &scene.projectiles {
        let center = metrics.to_screen(projectile.center);
        macroquad::shapes::draw_circle(
            center.x,
            center.y,
            metrics.length(projectile.radius),
            to_macroquad_color(projectile.color),
        );
    }
    draw_hud(scene.hud, metrics);
    if let Some(banner) = &scene.banner {
        draw_banner(banner, scene, metrics);
    }
}

fn draw_tiles(tile_grid: &TileGridPresentation, metrics: &SceneMetrics) {
    let side = metrics.length(tile_grid.tile_length);
    for (corner, tile) in tile_grid.iter() {
        let origin = metrics.to_screen(corner);
        match tile {
            Tile::Wall => {
                fill_rect(origin, side, palette::WALL);
                let inset = metrics.length(WALL_INSET);
                fill_rect(
                    origin + Vec2::splat(inset),
                    (side - 2.0 * inset).max(0.0),
                    palette::WALL_INNER,
                );
            }
            Tile::Goal => fill_rect(origin, side, palette::GOAL),
            Tile::Floor => {
                fill_rect(origin, side, palette::FLOOR);
                macroquad::shapes::draw_rectangle_lines(
                    origin.x,
                    origin.y,
                    side,
                    side,
                    1.0,
                    to_macroquad_color(palette::FLOOR_OUTLINE),
                );
            }
        }
    }
}

fn draw_ring(circle: CirclePresentation, metrics: &SceneMetrics) {
    let center = metrics.to_screen(circle.center);
    macroquad::shapes::draw_circle_lines(
        center.x,
        center.y,
        metrics.length(circle.radius),
        INDICATOR_THICKNESS,
        to_macroquad_color(circle.color),
    );
}

fn draw_sprite(sprite: &SpritePresentation, metrics: &SceneMetrics, atlas: &SpriteAtlas) {
    let origin = metrics.to_screen(sprite.position);
    let side = metrics.length(sprite.size);
    let drawn = atlas
        .resolve(sprite)
        .is_some_and(|key| atlas.draw(key, origin, side));
    if !drawn {
        fill_rect(origin, side, sprite.fallback);
    }
}

fn draw_hud(hud: Hud, metrics: &SceneMetrics) {
    let text = format!(
        "Health: {}   Enemies: {}   Score: {}",
        hud.health, hud.living_enemies, hud.score
    );
    let baseline = metrics.offset + Vec2::new(8.0, HUD_HEIGHT * 0.7) * metrics.scale;
    let _ = macroquad::text::draw_text(
        &text,
        baseline.x,
        baseline.y,
        HUD_FONT_SIZE * metrics.scale,
        macroquad::color::WHITE,
    );
}

fn draw_banner(banner: &EndBanner, scene: &Scene, metrics: &SceneMetrics) {
    let width = metrics.length(scene.tile_grid.width());
    let height = metrics.length(scene.tile_grid.height());
    let origin = metrics.to_screen(Vec2::ZERO);
    macroquad::shapes::draw_rectangle(
        origin.x,
        origin.y,
        width,
        height,
        to_macroquad_color(Color::new(0.0, 0.0, 0.0, 0.6)),
    );

    let font_size = BANNER_FONT_SIZE * metrics.scale;
    let lines = [
        banner.message.clone(),
        format!("Score: {}", banner.score),
        "Press R to play again".to_owned(),
    ];
    for (index, line) in lines.iter().enumerate() {
        let size = macroquad::text::measure_text(line, None, font_size as u16, 1.0);
        let x = origin.x + (width - size.width) / 2.0;
        let y = origin.y + height / 2.0 + (index as f32 - 0.5) * font_size * 1.2;
        let _ = macroquad::text::draw_text(line, x, y, font_size, macroquad::color::WHITE);
    }
}

fn fill_rect(origin: Vec2, side: f32, color: Color) {
    macroquad::shapes::draw_rectangle(origin.x, origin.y, side, side, to_macroquad_color(color));
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
