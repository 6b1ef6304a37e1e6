use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use dungeon_crawl_rendering::{AssetKey, SpritePresentation};
use glam::Vec2;
use macroquad::{
    color::WHITE,
    math::Vec2 as MacroquadVec2,
    texture::{self, DrawTextureParams, Texture2D},
};

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Textures loaded from the sprite manifest, keyed by asset name.
#[derive(Debug, Default)]
pub(crate) struct SpriteAtlas {
    textures: HashMap<AssetKey, Texture2D>,
}

impl SpriteAtlas {
    /// Loads every sprite listed in the manifest at `path`.
    pub(crate) fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    pub(crate) fn default_manifest_path() -> PathBuf {
        PathBuf::from("assets/manifest.toml")
    }

    /// Draws `key` stretched over the square at `position`.
    ///
    /// Returns `false` when the atlas has no such sprite so callers can draw
    /// a fallback instead.
    pub(crate) fn draw(&self, key: &AssetKey, position: Vec2, size: f32) -> bool {
        let Some(texture) = self.textures.get(key) else {
            return false;
        };
        texture::draw_texture_ex(
            *texture,
            position.x,
            position.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(MacroquadVec2::new(size, size)),
                ..DrawTextureParams::default()
            },
        );
        true
    }

    /// First image of `sprite` that the atlas holds, if any.
    pub(crate) fn resolve<'a>(&self, sprite: &'a SpritePresentation) -> Option<&'a AssetKey> {
        sprite.candidates().find(|key| self.contains(key))
    }

    pub(crate) fn contains(&self, key: &AssetKey) -> bool {
        self.textures.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.textures.len()
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(&AssetKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Self::from_entries(entries, &mut loader)
    }

    fn from_entries(
        entries: Vec<(AssetKey, PathBuf)>,
        loader: &mut impl FnMut(&AssetKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let mut textures = HashMap::with_capacity(entries.len());
        for (key, path) in entries {
            let texture = loader(&key, &path)
                .with_context(|| format!("failed to load sprite {key} from {}", path.display()))?;
            if textures.insert(key.clone(), texture).is_some() {
                bail!("duplicate sprite entry for {key}");
            }
        }
        Ok(Self { textures })
    }
}

fn default_loader(_key: &AssetKey, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    Ok(Texture2D::from_file_with_format(&bytes, None))
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    sprites: HashMap<String, String>,
}

/// Resolves manifest entries against `base_path`, sorted by key.
fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(AssetKey, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported sprite manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut entries = Vec::with_capacity(manifest.sprites.len());
    for (name, relative_path) in manifest.sprites {
        if name.trim().is_empty() {
            bail!("sprite manifest contains an empty key");
        }
        if Path::new(&relative_path).is_absolute() {
            bail!("sprite `{name}` must use a path relative to the manifest");
        }
        entries.push((AssetKey::named(name), base_path.join(relative_path)));
    }
    entries.sort();
    Ok(entries)
}
