use fastrand::Rng;
use serde::Deserialize;
use tracing::debug;

use super::entity::{Enemy, Entity, Fire, Player, Roster};
use super::tilemap::TileMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnKind {
    Enemy,
    Fire,
}

/// One `{x, y, type}` entry of a level's spawn table. Coordinates are the
/// top-left corner of the spawned entity in map pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpawnRecord {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: SpawnKind,
}

/// Base values and symmetric jitter for per-instance spawn randomisation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnTuning {
    pub detection_radius: f32,
    pub detection_radius_jitter: f32,
    pub enemy_speed: f32,
    pub enemy_speed_jitter: f32,
    pub fire_fall_speed: f32,
    pub fire_fall_speed_jitter: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            detection_radius: 300.0,
            detection_radius_jitter: 50.0,
            enemy_speed: 1.5,
            enemy_speed_jitter: 0.5,
            fire_fall_speed: 3.0,
            fire_fall_speed_jitter: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LevelData {
    pub name: String,
    pub map: TileMap,
    pub player_start: (f32, f32),
    pub spawns: Vec<SpawnRecord>,
}

impl LevelData {
    pub fn enemy_spawn_count(&self) -> usize {
        self.spawns
            .iter()
            .filter(|spawn| spawn.kind == SpawnKind::Enemy)
            .count()
    }

    /// Builds the level's roster. The same seed always yields the same
    /// detection radii and speeds.
    pub fn instantiate(&self, tuning: &SpawnTuning, seed: u64, now_tick: u64) -> Roster {
        let mut rng = Rng::with_seed(seed);
        let (start_x, start_y) = self.player_start;
        let mut roster = Roster::new(Player::new(start_x, start_y));

        for spawn in &self.spawns {
            let entity = match spawn.kind {
                SpawnKind::Enemy => Entity::Enemy(Enemy::new(
                    spawn.x,
                    spawn.y,
                    jittered(&mut rng, tuning.detection_radius, tuning.detection_radius_jitter),
                    jittered(&mut rng, tuning.enemy_speed, tuning.enemy_speed_jitter),
                )),
                SpawnKind::Fire => Entity::Fire(Fire::new(
                    spawn.x,
                    spawn.y,
                    jittered(&mut rng, tuning.fire_fall_speed, tuning.fire_fall_speed_jitter),
                    now_tick,
                )),
            };
            roster.spawn(entity);
        }

        debug!(
            level = %self.name,
            entities = roster.len(),
            seed,
            "level_roster_built"
        );
        roster
    }
}

fn jittered(rng: &mut Rng, base: f32, jitter: f32) -> f32 {
    let value = base + (rng.f32() * 2.0 - 1.0) * jitter.abs();
    value.max(0.0)
}
