use std::env;
use std::str::FromStr;

use platformer_engine::{LoopConfig, Scene};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::PlatformerScene;

const START_LEVEL_ENV_VAR: &str = "PLATFORMER_START_LEVEL";
const RENDER_FPS_ENV_VAR: &str = "PLATFORMER_RENDER_FPS";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Platformer Startup ===");

    let config = LoopConfig {
        max_render_fps: read_env_number::<u32>(RENDER_FPS_ENV_VAR).filter(|fps| *fps > 0),
        ..LoopConfig::default()
    };
    let start_level = read_env_number::<usize>(START_LEVEL_ENV_VAR).unwrap_or(0);
    let scene = PlatformerScene::new(
        start_level,
        config.view_width as f32,
        config.view_height as f32,
    );

    AppWiring {
        config,
        scene: Box::new(scene),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn read_env_number<T: FromStr>(var: &'static str) -> Option<T> {
    let raw = env::var(var).ok()?;
    parse_number(&raw).or_else(|| {
        warn!(var, value = %raw, "ignoring_invalid_env_value");
        None
    })
}

fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<T>().ok()
}
