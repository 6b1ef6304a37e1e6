#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Dungeon Crawl adapters.

use anyhow::Result as AnyResult;
use dungeon_crawl_core::{Expression, Outcome, Tile};
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with the provided alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

/// Colors used for the dungeon tiles and entities.
pub mod palette {
    use super::Color;

    /// Wall fill.
    pub const WALL: Color = Color::from_rgb_u8(0x44, 0x44, 0x44);
    /// Inset drawn inside every wall tile.
    pub const WALL_INNER: Color = Color::from_rgb_u8(0x55, 0x55, 0x55);
    /// Floor fill.
    pub const FLOOR: Color = Color::from_rgb_u8(0x99, 0x99, 0x99);
    /// Thin outline around floor tiles.
    pub const FLOOR_OUTLINE: Color = Color::from_rgb_u8(0x77, 0x77, 0x77);
    /// Goal fill.
    pub const GOAL: Color = Color::from_rgb_u8(0xff, 0xd7, 0x00);
    /// Rectangle drawn when no player sprite is available.
    pub const PLAYER_FALLBACK: Color = Color::from_rgb_u8(0x80, 0x80, 0x80);
    /// Rectangle drawn when no enemy sprite is available.
    pub const ENEMY_FALLBACK: Color = Color::from_rgb_u8(0xff, 0x00, 0x00);
    /// Fireball fill.
    pub const FIREBALL: Color = Color::from_rgb_u8(0xff, 0xa5, 0x00);
    /// Ring around the player showing the cast range.
    pub const AIM: Color = Color::from_rgb_u8(0xff, 0x64, 0x00).with_alpha(0.3);
    /// Ring around the player showing the melee reach after a swing.
    pub const ATTACK: Color = ENEMY_FALLBACK.with_alpha(0.35);
    /// Clear color behind the dungeon.
    pub const BACKGROUND: Color = Color::from_rgb_u8(0x22, 0x22, 0x22);
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Whether the up movement key is held.
    pub up: bool,
    /// Whether the down movement key is held.
    pub down: bool,
    /// Whether the left movement key is held.
    pub left: bool,
    /// Whether the right movement key is held.
    pub right: bool,
    /// Whether the attack key is held.
    pub attack: bool,
    /// Whether a restart was requested on this frame.
    pub restart: bool,
}

/// Semantic key used to look up a sprite image.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey(String);

impl AssetKey {
    /// Composite key selecting a player sprite by expression and cosmetics.
    #[must_use]
    pub fn player(expression: Expression, skin: &str, clothes: &str, prop: Option<&str>) -> Self {
        let mut key = format!("{expression}-skin{skin}-clothes{clothes}");
        if let Some(prop) = prop {
            key.push('-');
            key.push_str(prop);
        }
        Self(key)
    }

    /// Key selecting an enemy sprite by expression.
    #[must_use]
    pub fn enemy(expression: Expression) -> Self {
        Self(expression.as_str().to_owned())
    }

    /// Wraps an arbitrary manifest name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Textual form of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Describes the tile grid that composes the dungeon.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single square tile expressed in pixels.
    pub tile_length: f32,
    /// Row-major tile contents.
    pub tiles: Vec<Tile>,
}

impl TileGridPresentation {
    /// Creates a new tile grid descriptor.
    ///
    /// Returns an error when the tile length is not positive or the tile
    /// count does not match the dimensions.
    pub fn new(
        columns: u32,
        rows: u32,
        tile_length: f32,
        tiles: Vec<Tile>,
    ) -> std::result::Result<Self, RenderingError> {
        if tile_length <= 0.0 || !tile_length.is_finite() {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }
        let expected = u64::from(columns) * u64::from(rows);
        if tiles.len() as u64 != expected {
            return Err(RenderingError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            tiles,
        })
    }

    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Iterates tiles with the pixel position of their top-left corner.
    pub fn iter(&self) -> impl Iterator<Item = (Vec2, Tile)> + '_ {
        let columns = self.columns.max(1) as usize;
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let column = (index % columns) as f32;
            let row = (index / columns) as f32;
            (
                Vec2::new(column * self.tile_length, row * self.tile_length),
                *tile,
            )
        })
    }
}

/// Entity drawn from an image, or as a flat rectangle when the image is missing.
#[derive(Clone, Debug, PartialEq)]
pub struct SpritePresentation {
    /// Pixel position of the sprite's top-left corner.
    pub position: Vec2,
    /// Side length of the square sprite in pixels.
    pub size: f32,
    /// Image looked up in the sprite atlas.
    pub asset: AssetKey,
    /// Image tried when the atlas lacks `asset`.
    pub alternate: Option<AssetKey>,
    /// Rectangle color used when the atlas has neither image.
    pub fallback: Color,
}

impl SpritePresentation {
    /// Creates a new sprite descriptor.
    #[must_use]
    pub fn new(position: Vec2, size: f32, asset: AssetKey, fallback: Color) -> Self {
        Self {
            position,
            size,
            asset,
            alternate: None,
            fallback,
        }
    }

    /// Sets the image tried when `asset` is missing.
    #[must_use]
    pub fn with_alternate(mut self, alternate: AssetKey) -> Self {
        if alternate != self.asset {
            self.alternate = Some(alternate);
        }
        self
    }

    /// Images to try, in order, before drawing the fallback rectangle.
    pub fn candidates(&self) -> impl Iterator<Item = &AssetKey> {
        std::iter::once(&self.asset).chain(self.alternate.as_ref())
    }
}

/// Filled or stroked circle in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CirclePresentation {
    /// Pixel position of the centre.
    pub center: Vec2,
    /// Radius in pixels.
    pub radius: f32,
    /// Draw color.
    pub color: Color,
}

impl CirclePresentation {
    /// Creates a new circle descriptor.
    #[must_use]
    pub const fn new(center: Vec2, radius: f32, color: Color) -> Self {
        Self {
            center,
            radius,
            color,
        }
    }
}

/// Numeric read-outs shown next to the dungeon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Hud {
    /// Remaining player health.
    pub health: u32,
    /// Number of enemies still alive.
    pub living_enemies: usize,
    /// Current score.
    pub score: u32,
}

/// Overlay shown once the session has ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndBanner {
    /// Headline describing the outcome.
    pub message: String,
    /// Final score.
    pub score: u32,
}

impl EndBanner {
    /// Builds the banner for a finished session.
    #[must_use]
    pub fn for_outcome(outcome: Outcome, score: u32) -> Self {
        let message = match outcome {
            Outcome::Won => "You escaped the dungeon!",
            Outcome::Lost => "Game Over! You were defeated.",
        };
        Self {
            message: message.to_owned(),
            score,
        }
    }
}

/// Scene description combining the dungeon, its inhabitants and the HUD.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the dungeon.
    pub tile_grid: TileGridPresentation,
    /// Ring showing the fireball cast range, if any.
    pub aim_indicator: Option<CirclePresentation>,
    /// Ring showing the melee reach after a swing, if any.
    pub attack_indicator: Option<CirclePresentation>,
    /// The player.
    pub player: SpritePresentation,
    /// Fireballs in flight.
    pub projectiles: Vec<CirclePresentation>,
    /// Living enemies.
    pub enemies: Vec<SpritePresentation>,
    /// Numeric read-outs.
    pub hud: Hud,
    /// Overlay shown after the session ended.
    pub banner: Option<EndBanner>,
}

impl Scene {
    /// Creates a scene holding only the dungeon and the player.
    #[must_use]
    pub fn new(tile_grid: TileGridPresentation, player: SpritePresentation) -> Self {
        Self {
            tile_grid,
            aim_indicator: None,
            attack_indicator: None,
            player,
            projectiles: Vec::new(),
            enemies: Vec::new(),
            hud: Hud::default(),
            banner: None,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Dungeon Crawl scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and updates the scene before it is
    /// drawn. Backends fail before the first frame when their assets cannot
    /// be loaded.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive, finite side length.
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
    /// The tile list does not cover the grid exactly.
    TileCountMismatch {
        /// Number of tiles implied by the dimensions.
        expected: u64,
        /// Number of tiles supplied.
        actual: usize,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
            Self::TileCountMismatch { expected, actual } => {
                write!(f, "expected {expected} tiles, received {actual}")
            }
        }
    }
}

impl Error for RenderingError {}
