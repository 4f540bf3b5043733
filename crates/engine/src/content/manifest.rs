use std::path::Path;

use serde::Deserialize;

use super::{read_json, ContentError};
use crate::world::{CombatConfig, PhysicsConfig, SpawnTuning, DEFAULT_DECORATIVE_TILE_IDS};

pub const MANIFEST_FILE_NAME: &str = "game.json";

/// `assets/game.json`. Paths are relative to the assets directory; tuning
/// sections fall back to their defaults field by field.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GameManifest {
    pub atlas: String,
    pub levels: Vec<LevelEntry>,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub spawn: SpawnTuning,
    #[serde(default = "default_decorative_tiles")]
    pub decorative_tiles: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelEntry {
    pub name: String,
    pub map: String,
    pub spawns: String,
}

fn default_decorative_tiles() -> Vec<u32> {
    DEFAULT_DECORATIVE_TILE_IDS.to_vec()
}

pub(crate) fn read_manifest(path: &Path) -> Result<GameManifest, ContentError> {
    read_json(path)
}
