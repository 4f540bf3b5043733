use serde::Deserialize;

use super::entity::{Body, Facing};
use super::tilemap::TileMap;

const GROUND_PROBE_INSET_PX: f32 = 5.0;
const CEILING_PROBE_INSET_PX: f32 = 8.0;
const WALL_PROBE_INSET_PX: f32 = 5.0;
const PENETRATION_STEP_PX: f32 = 2.0;
const PENETRATION_STEP_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_power: f32,
    pub move_speed: f32,
    pub dash_speed: f32,
    pub dash_duration_ticks: u32,
    pub max_jumps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            max_fall_speed: 10.0,
            jump_power: 10.0,
            move_speed: 4.0,
            dash_speed: 12.0,
            dash_duration_ticks: 12,
            max_jumps: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashState {
    pub active: bool,
    pub ticks_left: u32,
    pub direction: Facing,
}

impl Default for DashState {
    fn default() -> Self {
        Self {
            active: false,
            ticks_left: 0,
            direction: Facing::Right,
        }
    }
}

impl DashState {
    fn cancel(&mut self) {
        self.active = false;
        self.ticks_left = 0;
    }
}

/// Intent and contact state the physics engine reads and writes each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Motion {
    pub move_x: f32,
    pub jump_requested: bool,
    pub jump_count: u32,
    pub is_jumping: bool,
    pub grounded: bool,
    pub ceiling_blocked: bool,
    pub dash: DashState,
}

#[derive(Debug, Clone, Default)]
pub struct PhysicsEngine {
    config: PhysicsConfig,
}

impl PhysicsEngine {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Integrates one frame of motion. Returns `false` without touching the
    /// body when no map is loaded yet.
    pub fn step(&self, map: Option<&TileMap>, body: &mut Body, motion: &mut Motion) -> bool {
        let Some(map) = map else {
            return false;
        };

        motion.grounded = ground_contact(map, body);
        if motion.grounded {
            motion.jump_count = 0;
        }
        motion.ceiling_blocked = ceiling_contact(map, body);

        if motion.jump_requested {
            motion.jump_requested = false;
            if motion.jump_count < self.config.max_jumps && !motion.ceiling_blocked {
                body.velocity_y = -self.config.jump_power;
                motion.jump_count += 1;
                motion.is_jumping = true;
                motion.grounded = false;
            }
        }

        let dashing = motion.dash.active;
        if !(dashing && motion.grounded) {
            body.velocity_y = (body.velocity_y + self.config.gravity).min(self.config.max_fall_speed);
        }
        if body.velocity_y < 0.0 && motion.ceiling_blocked {
            body.velocity_y = 0.0;
        }

        body.y += body.velocity_y;
        if body.velocity_y < 0.0 {
            resolve_head_bump(map, body);
        }
        if resolve_ground_penetration(map, body) {
            land(motion);
        }

        if dashing {
            self.advance_dash(map, body, motion);
            if resolve_ground_penetration(map, body) {
                land(motion);
            }
        } else {
            self.move_horizontal(map, body, motion);
        }
        true
    }

    fn move_horizontal(&self, map: &TileMap, body: &mut Body, motion: &Motion) {
        if motion.move_x == 0.0 {
            return;
        }
        let next_x = (body.x + motion.move_x * self.config.move_speed).max(0.0);
        if wall_blocks(map, body, next_x, motion.move_x) {
            return;
        }
        body.x = next_x;
    }

    fn advance_dash(&self, map: &TileMap, body: &mut Body, motion: &mut Motion) {
        let dash = &mut motion.dash;
        dash.ticks_left = dash.ticks_left.saturating_sub(1);
        let direction = dash.direction.sign();
        let next_x = body.x + direction * self.config.dash_speed;
        if next_x < 0.0 || wall_blocks(map, body, next_x, direction) {
            dash.cancel();
            body.velocity_y = 0.0;
            return;
        }
        body.x = next_x;
        if dash.ticks_left == 0 {
            dash.active = false;
        }
    }
}

fn land(motion: &mut Motion) {
    motion.jump_count = 0;
    motion.is_jumping = false;
    motion.grounded = true;
}

fn probe_xs(body: &Body, inset: f32) -> [f32; 3] {
    [
        body.left() + inset,
        body.center_x(),
        body.right() - inset,
    ]
}

fn any_solid(map: &TileMap, xs: [f32; 3], y: f32) -> bool {
    xs.into_iter().any(|x| map.is_solid_at(x, y))
}

fn ground_contact(map: &TileMap, body: &Body) -> bool {
    any_solid(map, probe_xs(body, GROUND_PROBE_INSET_PX), body.bottom() + 1.0)
}

fn ceiling_contact(map: &TileMap, body: &Body) -> bool {
    any_solid(map, probe_xs(body, CEILING_PROBE_INSET_PX), body.top() - 1.0)
}

/// Last pixel row the body occupies.
fn feet_row(body: &Body) -> f32 {
    body.bottom().ceil() - 1.0
}

fn feet_in_solid(map: &TileMap, body: &Body) -> bool {
    any_solid(map, probe_xs(body, GROUND_PROBE_INSET_PX), feet_row(body))
}

fn wall_blocks(map: &TileMap, body: &Body, next_x: f32, direction: f32) -> bool {
    let edge_x = if direction > 0.0 {
        (next_x + body.width).ceil() - 1.0
    } else {
        next_x
    };
    let near_top = body.top() + WALL_PROBE_INSET_PX;
    let near_bottom = body.bottom() - WALL_PROBE_INSET_PX;
    map.is_solid_at(edge_x, near_top) || map.is_solid_at(edge_x, near_bottom)
}

fn resolve_head_bump(map: &TileMap, body: &mut Body) {
    let top = body.top().floor();
    if !any_solid(map, probe_xs(body, CEILING_PROBE_INSET_PX), top) {
        return;
    }
    let tile_height = map.tile_height() as f32;
    body.y = ((top / tile_height).floor() + 1.0) * tile_height;
    body.velocity_y = 0.0;
}

/// Lifts a body whose feet ended up inside solid ground and settles its feet
/// on the tile boundary. Returns `true` when a landing happened.
fn resolve_ground_penetration(map: &TileMap, body: &mut Body) -> bool {
    if body.velocity_y < 0.0 || !feet_in_solid(map, body) {
        return false;
    }

    let mut cleared = false;
    for _ in 0..PENETRATION_STEP_ATTEMPTS {
        body.y -= PENETRATION_STEP_PX;
        if !feet_in_solid(map, body) {
            cleared = true;
            break;
        }
    }
    if !cleared {
        let xs = probe_xs(body, GROUND_PROBE_INSET_PX);
        let mut row = feet_row(body);
        while row >= 0.0 && any_solid(map, xs, row) {
            row -= 1.0;
        }
        body.y = row + 1.0 - body.height;
    }

    let tile_height = map.tile_height() as f32;
    let surface = (body.bottom() / tile_height).ceil() * tile_height;
    if any_solid(map, probe_xs(body, GROUND_PROBE_INSET_PX), surface) {
        body.y = surface - body.height;
    }
    body.velocity_y = 0.0;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::TileMap;

    const TILE: u32 = 32;

    /// 20x12 map with a solid floor on row 10 and whatever extra solid cells
    /// `solid` lists as `(column, row)`.
    fn floor_map(solid: &[(u32, u32)]) -> TileMap {
        let columns = 20u32;
        let rows = 12u32;
        let mut tiles = vec![0u32; (columns * rows) as usize];
        for column in 0..columns {
            tiles[(10 * columns + column) as usize] = 1;
        }
        for &(column, row) in solid {
            tiles[(row * columns + column) as usize] = 1;
        }
        TileMap::new(columns, rows, TILE, TILE, tiles, Vec::new()).expect("map")
    }

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(x, y, 32.0, 48.0)
    }

    fn floor_top() -> f32 {
        (10 * TILE) as f32
    }

    fn settle(engine: &PhysicsEngine, map: &TileMap, body: &mut Body, motion: &mut Motion) {
        for _ in 0..200 {
            engine.step(Some(map), body, motion);
        }
    }

    #[test]
    fn missing_map_is_a_no_op() {
        let engine = PhysicsEngine::default();
        let mut body = body_at(10.0, 10.0);
        let mut motion = Motion {
            move_x: 1.0,
            jump_requested: true,
            ..Motion::default()
        };
        let before_body = body;
        let before_motion = motion;
        assert!(!engine.step(None, &mut body, &mut motion));
        assert_eq!(body, before_body);
        assert_eq!(motion, before_motion);
    }

    #[test]
    fn falling_body_lands_exactly_on_floor_boundary() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(64.0, 13.0);
        let mut motion = Motion::default();
        let tolerance = PENETRATION_STEP_PX * PENETRATION_STEP_ATTEMPTS as f32;

        for _ in 0..200 {
            engine.step(Some(&map), &mut body, &mut motion);
            assert!(body.bottom() <= floor_top() + tolerance);
        }
        assert_eq!(body.bottom(), floor_top());
        assert_eq!(body.velocity_y, 0.0);
        assert!(motion.grounded);
        assert_eq!(motion.jump_count, 0);
    }

    #[test]
    fn resting_body_stays_put() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(64.0, floor_top() - 48.0);
        let mut motion = Motion::default();
        for _ in 0..30 {
            engine.step(Some(&map), &mut body, &mut motion);
            assert_eq!(body.bottom(), floor_top());
        }
    }

    #[test]
    fn deep_penetration_falls_back_to_pixel_scan() {
        let engine = PhysicsEngine::default();
        // Floor plus a two-tile-thick block under the body.
        let map = floor_map(&[(2, 8), (2, 9), (3, 8), (3, 9)]);
        let mut body = body_at(70.0, (9 * TILE) as f32);
        let mut motion = Motion::default();
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.bottom(), (8 * TILE) as f32);
        assert_eq!(body.velocity_y, 0.0);
    }

    #[test]
    fn jump_count_never_exceeds_two_between_landings() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(64.0, floor_top() - 48.0);
        let mut motion = Motion::default();
        settle(&engine, &map, &mut body, &mut motion);

        let mut max_seen = 0;
        for tick in 0..120 {
            motion.jump_requested = tick % 3 == 0;
            engine.step(Some(&map), &mut body, &mut motion);
            max_seen = max_seen.max(motion.jump_count);
            assert!(motion.jump_count <= 2);
        }
        assert_eq!(max_seen, 2);
    }

    #[test]
    fn double_jump_reapplies_jump_velocity_in_air() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(64.0, floor_top() - 48.0);
        let mut motion = Motion::default();
        settle(&engine, &map, &mut body, &mut motion);

        motion.jump_requested = true;
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(motion.jump_count, 1);
        assert!(motion.is_jumping);
        for _ in 0..5 {
            engine.step(Some(&map), &mut body, &mut motion);
        }
        motion.jump_requested = true;
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(motion.jump_count, 2);
        assert_eq!(body.velocity_y, -10.0 + 0.5);

        let y_before = body.y;
        motion.jump_requested = true;
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(motion.jump_count, 2);
        assert!(!motion.jump_requested);
        assert!(body.y > y_before - 10.0);
    }

    #[test]
    fn ceiling_blocks_jump() {
        let engine = PhysicsEngine::default();
        let ceiling: Vec<(u32, u32)> = (0..20).map(|column| (column, 7)).collect();
        let map = floor_map(&ceiling);
        // Head flush against the underside of row 7.
        let mut body = body_at(64.0, (8 * TILE) as f32);
        let mut motion = Motion {
            jump_requested: true,
            ..Motion::default()
        };
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(motion.jump_count, 0);
        assert!(motion.ceiling_blocked);
    }

    #[test]
    fn head_bump_stops_upward_motion_below_tile() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[(2, 5), (3, 5)]);
        let mut body = body_at(70.0, (6 * TILE) as f32 + 4.0);
        let mut motion = Motion::default();
        body.velocity_y = -10.0;
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.top(), (6 * TILE) as f32);
        assert_eq!(body.velocity_y, 0.0);
    }

    #[test]
    fn horizontal_move_clamps_at_left_edge() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(2.0, floor_top() - 48.0);
        let mut motion = Motion {
            move_x: -1.0,
            ..Motion::default()
        };
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.x, 0.0);
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.x, 0.0);
    }

    #[test]
    fn wall_blocks_move_without_partial_slide() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[(5, 9), (5, 8)]);
        // Right edge 2px short of the wall at x=160.
        let mut body = body_at(126.0, floor_top() - 48.0);
        let mut motion = Motion {
            move_x: 1.0,
            ..Motion::default()
        };
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.x, 126.0);
    }

    #[test]
    fn free_move_applies_speed() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(100.0, floor_top() - 48.0);
        let mut motion = Motion {
            move_x: 1.0,
            ..Motion::default()
        };
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.x, 104.0);
    }

    #[test]
    fn dash_moves_at_dash_speed_until_timer_expires() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(64.0, floor_top() - 48.0);
        let mut motion = Motion {
            move_x: -1.0,
            dash: DashState {
                active: true,
                ticks_left: 3,
                direction: Facing::Right,
            },
            ..Motion::default()
        };
        for _ in 0..3 {
            engine.step(Some(&map), &mut body, &mut motion);
        }
        assert_eq!(body.x, 64.0 + 36.0);
        assert!(!motion.dash.active);
        assert_eq!(body.bottom(), floor_top());
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.x, 100.0 - 4.0);
    }

    #[test]
    fn dash_into_wall_cancels_and_zeroes_velocity() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[(5, 9), (5, 8)]);
        let mut body = body_at(120.0, floor_top() - 48.0 - 20.0);
        body.velocity_y = 3.0;
        let mut motion = Motion {
            dash: DashState {
                active: true,
                ticks_left: 10,
                direction: Facing::Right,
            },
            ..Motion::default()
        };
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.x, 120.0);
        assert!(!motion.dash.active);
        assert_eq!(motion.dash.ticks_left, 0);
        assert_eq!(body.velocity_y, 0.0);
    }

    #[test]
    fn dash_cannot_cross_left_edge() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(5.0, floor_top() - 48.0);
        let mut motion = Motion {
            dash: DashState {
                active: true,
                ticks_left: 10,
                direction: Facing::Left,
            },
            ..Motion::default()
        };
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.x, 5.0);
        assert!(!motion.dash.active);
    }

    #[test]
    fn airborne_dash_still_falls() {
        let engine = PhysicsEngine::default();
        let map = floor_map(&[]);
        let mut body = body_at(64.0, 40.0);
        let mut motion = Motion {
            dash: DashState {
                active: true,
                ticks_left: 5,
                direction: Facing::Right,
            },
            ..Motion::default()
        };
        engine.step(Some(&map), &mut body, &mut motion);
        assert_eq!(body.velocity_y, 0.5);
        assert_eq!(body.y, 40.5);
    }
}
