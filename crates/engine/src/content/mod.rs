mod atlas;
mod loader;
mod manifest;
mod spawn_table;
mod tiled;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use crate::world::{
    CombatConfig, LevelData, PhysicsConfig, SpawnTuning, SpriteAtlas, TileProperties,
    TilemapError,
};

pub use loader::ContentLoader;
pub use manifest::MANIFEST_FILE_NAME;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {path} at '{field_path}': {message}")]
    Json {
        path: PathBuf,
        field_path: String,
        message: String,
    },
    #[error("malformed XML in {path} (line {line}, column {column}): {message}")]
    Xml {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },
    #[error("invalid value in {path}: {message}")]
    InvalidValue { path: PathBuf, message: String },
    #[error("invalid tile map {path}: {source}")]
    Tilemap {
        path: PathBuf,
        #[source]
        source: TilemapError,
    },
    #[error("manifest {path} lists no levels")]
    NoLevels { path: PathBuf },
    #[error("content loader stopped before reporting a result")]
    LoaderDisconnected,
}

/// Everything a scene needs to start playing, fully parsed and validated.
#[derive(Debug, Clone, Default)]
pub struct GameContent {
    pub levels: Vec<LevelData>,
    pub atlas: SpriteAtlas,
    pub physics: PhysicsConfig,
    pub combat: CombatConfig,
    pub spawn: SpawnTuning,
}

/// Loads the manifest under `assets_dir` and every document it references.
/// The first malformed document aborts the load.
pub fn load_game_content(assets_dir: &Path) -> Result<GameContent, ContentError> {
    let manifest_path = assets_dir.join(MANIFEST_FILE_NAME);
    let manifest = manifest::read_manifest(&manifest_path)?;
    if manifest.levels.is_empty() {
        return Err(ContentError::NoLevels {
            path: manifest_path,
        });
    }

    let atlas = atlas::load_atlas(assets_dir, &assets_dir.join(&manifest.atlas))?;
    let decorative = TileProperties::with_decorative(manifest.decorative_tiles.iter().copied());

    let mut levels = Vec::with_capacity(manifest.levels.len());
    for entry in &manifest.levels {
        let map = tiled::load_tile_map(assets_dir, &assets_dir.join(&entry.map), &decorative)?;
        let table = spawn_table::load_level_table(&assets_dir.join(&entry.spawns))?;
        levels.push(LevelData {
            name: entry.name.clone(),
            map,
            player_start: table.player_start,
            spawns: table.spawns,
        });
    }

    info!(
        levels = levels.len(),
        sprites = atlas.len(),
        "game_content_loaded"
    );
    Ok(GameContent {
        levels,
        atlas,
        physics: manifest.physics,
        combat: manifest.combat,
        spawn: manifest.spawn,
    })
}

pub(crate) fn read_text(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserializes a JSON document, reporting the failing field path.
pub(crate) fn parse_json<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<T, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let field_path = error.path().to_string();
        let source = error.into_inner();
        ContentError::Json {
            path: path.to_path_buf(),
            field_path,
            message: source.to_string(),
        }
    })
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    let raw = read_text(path)?;
    parse_json(path, &raw)
}

pub(crate) fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}
