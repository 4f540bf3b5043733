mod animation;
mod atlas;
mod entity;
mod level;
mod physics;
mod tilemap;

pub use animation::{
    AnimationInput, PlayerAnimation, PlayerPose, ATTACK_DURATION_TICKS, ATTACK_FRAME_SPLIT_TICKS,
    RUN_FRAME_COUNT, RUN_FRAME_PERIOD_TICKS,
};
pub use atlas::{SpriteAtlas, SpriteRegion, PLACEHOLDER_SIZE_PX};
pub use entity::{
    Aabb, Body, CombatConfig, Enemy, Entity, EntityKind, Facing, Fire, Player, Roster,
    UpdateContext, ENEMY_SIZE, FIRE_SIZE, PLAYER_HEIGHT, PLAYER_WIDTH,
};
pub use level::{LevelData, SpawnKind, SpawnRecord, SpawnTuning};
pub use physics::{DashState, Motion, PhysicsConfig, PhysicsEngine};
pub use tilemap::{
    sheet_offset, strip_flip_flags, TileMap, TileProperties, TilemapError, Tileset, ViewRect,
    DEFAULT_DECORATIVE_TILE_IDS, EMPTY_TILE, MAX_PIXEL_EXTENT,
};
