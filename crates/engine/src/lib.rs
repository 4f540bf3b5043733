use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
mod sprite_keys;
pub mod world;

pub use app::{
    draw_centered_text, run_app, run_app_with_metrics, text_width_px, AppError, ContentState,
    DrawCommand, DrawList, InputAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot,
    MetricsHandle, PixelRect, Rgba, Scene, SceneCommand, SceneHost, LINE_ADVANCE,
};
pub use content::{load_game_content, ContentError, ContentLoader, GameContent};
pub use sprite_keys::SpriteKeyError;
pub use world::{
    Aabb, AnimationInput, Body, CombatConfig, DashState, Enemy, Entity, EntityKind, Facing, Fire,
    LevelData, Motion, PhysicsConfig, PhysicsEngine, Player, PlayerAnimation, PlayerPose, Roster,
    SpawnKind, SpawnRecord, SpawnTuning, SpriteAtlas, SpriteRegion, TileMap, TileProperties,
    TilemapError, Tileset, UpdateContext, ViewRect, DEFAULT_DECORATIVE_TILE_IDS, EMPTY_TILE,
    ENEMY_SIZE, FIRE_SIZE, PLAYER_HEIGHT, PLAYER_WIDTH,
};

pub const ROOT_ENV_VAR: &str = "PLATFORMER_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "PLATFORMER_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain an assets/ directory with game.json."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing assets/game.json.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/platformer\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join("assets");
    Ok(AppPaths { root, assets_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("assets").join(content::MANIFEST_FILE_NAME).is_file()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
