use serde::Deserialize;

use super::animation::{AnimationInput, PlayerAnimation, PlayerPose, ATTACK_DURATION_TICKS};
use super::physics::{DashState, Motion};
use super::tilemap::TileMap;

pub const PLAYER_WIDTH: f32 = 32.0;
pub const PLAYER_HEIGHT: f32 = 48.0;
pub const ENEMY_SIZE: (f32, f32) = (32.0, 32.0);
pub const FIRE_SIZE: (f32, f32) = (16.0, 16.0);

const ENEMY_SPRITES: [&str; 2] = ["enemy_left", "enemy_right"];
const FIRE_SPRITE: &str = "fire";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Facing implied by a horizontal intent; zero intent implies nothing.
    pub fn from_intent(move_x: f32) -> Option<Self> {
        if move_x > 0.0 {
            Some(Self::Right)
        } else if move_x < 0.0 {
            Some(Self::Left)
        } else {
            None
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Position and vertical motion shared by every entity variant. `x`/`y` is
/// the top-left corner; y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub velocity_y: f32,
    pub alive: bool,
    pub last_attack_tick: Option<u64>,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            velocity_y: 0.0,
            alive: true,
            last_attack_tick: None,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn aabb(&self) -> Aabb {
        Aabb {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn distance_to(&self, other: &Body) -> f32 {
        let dx = other.center_x() - self.center_x();
        let dy = other.center_y() - self.center_y();
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CombatConfig {
    pub attack_cooldown_ticks: u64,
    pub attack_range: f32,
    pub enemy_score: u32,
    pub fire_respawn_ticks: u64,
    pub death_restart_ticks: u32,
    pub level_complete_ticks: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_cooldown_ticks: 30,
            attack_range: 24.0,
            enemy_score: 100,
            fire_respawn_ticks: 180,
            death_restart_ticks: 90,
            level_complete_ticks: 120,
        }
    }
}

/// Read-only view of the world handed to non-player entities each tick.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub player: Option<&'a Player>,
    pub map: Option<&'a TileMap>,
    pub now_tick: u64,
    pub fire_respawn_ticks: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub body: Body,
    pub motion: Motion,
    pub dash_charges: u32,
    attacking: bool,
    attack_timer: u32,
    animation: PlayerAnimation,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            body: Body::new(x, y, PLAYER_WIDTH, PLAYER_HEIGHT),
            motion: Motion::default(),
            dash_charges: 0,
            attacking: false,
            attack_timer: 0,
            animation: PlayerAnimation::default(),
        }
    }

    pub fn facing(&self) -> Facing {
        self.animation.facing()
    }

    pub fn pose(&self) -> PlayerPose {
        self.animation.pose()
    }

    pub fn animation(&self) -> &PlayerAnimation {
        &self.animation
    }

    pub fn sprite_name(&self) -> &'static str {
        self.animation.pose().sprite_name()
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn attack_timer(&self) -> u32 {
        self.attack_timer
    }

    pub fn is_dashing(&self) -> bool {
        self.motion.dash.active
    }

    pub fn set_move_intent(&mut self, move_x: f32) {
        self.motion.move_x = move_x.clamp(-1.0, 1.0);
    }

    /// Arms a single jump; the physics step consumes it.
    pub fn request_jump(&mut self) {
        if self.body.alive {
            self.motion.jump_requested = true;
        }
    }

    pub fn try_attack(&mut self, now_tick: u64, cooldown_ticks: u64) -> bool {
        if !self.body.alive || self.attacking {
            return false;
        }
        if let Some(last) = self.body.last_attack_tick {
            if now_tick.saturating_sub(last) < cooldown_ticks {
                return false;
            }
        }
        self.attacking = true;
        self.attack_timer = 0;
        self.body.last_attack_tick = Some(now_tick);
        true
    }

    /// Starts a dash toward this tick's horizontal intent, or the current
    /// facing when there is none, spending one charge.
    pub fn try_start_dash(&mut self, duration_ticks: u32) -> bool {
        if !self.body.alive || self.dash_charges == 0 || self.motion.dash.active {
            return false;
        }
        self.dash_charges -= 1;
        self.motion.dash = DashState {
            active: true,
            ticks_left: duration_ticks.max(1),
            direction: Facing::from_intent(self.motion.move_x).unwrap_or(self.facing()),
        };
        true
    }

    pub fn grant_dash_charge(&mut self) {
        self.dash_charges = self.dash_charges.saturating_add(1);
    }

    /// Strip in front of the player that hurts enemies while an attack runs.
    pub fn attack_hitbox(&self, range: f32) -> Option<Aabb> {
        if !self.attacking || !self.body.alive {
            return None;
        }
        let x = match self.facing() {
            Facing::Right => self.body.right(),
            Facing::Left => self.body.left() - range,
        };
        Some(Aabb {
            x,
            y: self.body.top(),
            width: range,
            height: self.body.height,
        })
    }

    /// Advances the animation state machine and the attack timer by one tick.
    pub fn update_state(&mut self) {
        let input = AnimationInput {
            attacking: self.attacking,
            attack_timer: self.attack_timer,
            dashing: self.motion.dash.active,
            dash_direction: self.motion.dash.direction,
            move_x: self.motion.move_x,
            is_jumping: self.motion.is_jumping,
            velocity_y: self.body.velocity_y,
        };
        self.animation.update(&input);

        if self.attacking {
            self.attack_timer += 1;
            if self.attack_timer >= ATTACK_DURATION_TICKS {
                self.attacking = false;
                self.attack_timer = 0;
            }
        }
    }

    pub fn kill(&mut self) {
        self.body.alive = false;
        self.motion.move_x = 0.0;
        self.motion.jump_requested = false;
        self.motion.dash = DashState::default();
        self.attacking = false;
        self.attack_timer = 0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub body: Body,
    pub detection_radius: f32,
    pub speed: f32,
    pub facing: Facing,
    pub move_x: f32,
}

impl Enemy {
    pub fn new(x: f32, y: f32, detection_radius: f32, speed: f32) -> Self {
        Self {
            body: Body::new(x, y, ENEMY_SIZE.0, ENEMY_SIZE.1),
            detection_radius,
            speed,
            facing: Facing::Left,
            move_x: 0.0,
        }
    }

    pub fn sprite_name(&self) -> &'static str {
        ENEMY_SPRITES[self.facing.index()]
    }

    /// Chases the player while it is inside the detection radius. Enemies
    /// ignore gravity and only stop for a wall at foot level.
    pub fn update(&mut self, ctx: &UpdateContext<'_>) {
        if !self.body.alive {
            return;
        }
        let Some(player) = ctx.player.filter(|player| player.body.alive) else {
            return;
        };

        if self.body.distance_to(&player.body) <= self.detection_radius {
            let dx = player.body.center_x() - self.body.center_x();
            self.move_x = if dx > 0.0 {
                1.0
            } else if dx < 0.0 {
                -1.0
            } else {
                0.0
            };
            if let Some(facing) = Facing::from_intent(self.move_x) {
                self.facing = facing;
            }
        } else {
            self.move_x = 0.0;
        }

        let Some(map) = ctx.map else {
            return;
        };
        if self.move_x == 0.0 {
            return;
        }
        let next_x = self.body.x + self.move_x * self.speed;
        if next_x < 0.0 {
            return;
        }
        let front_x = if self.move_x > 0.0 {
            (next_x + self.body.width).ceil() - 1.0
        } else {
            next_x
        };
        let foot_y = self.body.bottom().ceil() - 1.0;
        if !map.is_solid_at(front_x, foot_y) {
            self.body.x = next_x;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fire {
    pub body: Body,
    pub fall_speed: f32,
    pub active: bool,
    pub spawn_tick: u64,
    origin: (f32, f32),
}

impl Fire {
    pub fn new(x: f32, y: f32, fall_speed: f32, spawn_tick: u64) -> Self {
        Self {
            body: Body::new(x, y, FIRE_SIZE.0, FIRE_SIZE.1),
            fall_speed,
            active: true,
            spawn_tick,
            origin: (x, y),
        }
    }

    pub fn origin(&self) -> (f32, f32) {
        self.origin
    }

    pub fn sprite_name(&self) -> &'static str {
        FIRE_SPRITE
    }

    pub fn extinguish(&mut self) {
        self.active = false;
    }

    pub fn update(&mut self, ctx: &UpdateContext<'_>) {
        let Some(map) = ctx.map else {
            return;
        };
        if !self.active {
            if ctx.now_tick.saturating_sub(self.spawn_tick) >= ctx.fire_respawn_ticks {
                self.body.x = self.origin.0;
                self.body.y = self.origin.1;
                self.body.velocity_y = 0.0;
                self.spawn_tick = ctx.now_tick;
                self.active = true;
            }
            return;
        }

        self.body.velocity_y = self.fall_speed;
        self.body.y += self.fall_speed;
        let landed = map.is_solid_at(self.body.center_x(), self.body.bottom());
        if landed || self.body.top() >= map.pixel_height() {
            self.active = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Enemy,
    Fire,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Player(Player),
    Enemy(Enemy),
    Fire(Fire),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Player(_) => EntityKind::Player,
            Self::Enemy(_) => EntityKind::Enemy,
            Self::Fire(_) => EntityKind::Fire,
        }
    }

    pub fn body(&self) -> &Body {
        match self {
            Self::Player(player) => &player.body,
            Self::Enemy(enemy) => &enemy.body,
            Self::Fire(fire) => &fire.body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match self {
            Self::Player(player) => &mut player.body,
            Self::Enemy(enemy) => &mut enemy.body,
            Self::Fire(fire) => &mut fire.body,
        }
    }

    /// Whether the entity should be drawn and take part in interactions.
    pub fn is_live(&self) -> bool {
        match self {
            Self::Fire(fire) => fire.body.alive && fire.active,
            other => other.body().alive,
        }
    }

    pub fn sprite_name(&self) -> &'static str {
        match self {
            Self::Player(player) => player.sprite_name(),
            Self::Enemy(enemy) => enemy.sprite_name(),
            Self::Fire(fire) => fire.sprite_name(),
        }
    }

    /// Per-tick behaviour for everything the physics engine does not drive.
    pub fn update(&mut self, ctx: &UpdateContext<'_>) {
        match self {
            Self::Player(_) => {}
            Self::Enemy(enemy) => enemy.update(ctx),
            Self::Fire(fire) => fire.update(ctx),
        }
    }
}

/// Entity list for one level. The player, when present, is always the first
/// entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    entities: Vec<Entity>,
}

impl Roster {
    pub fn new(player: Player) -> Self {
        Self {
            entities: vec![Entity::Player(player)],
        }
    }

    pub fn spawn(&mut self, entity: Entity) {
        match entity {
            Entity::Player(_) => {
                if matches!(self.entities.first(), Some(Entity::Player(_))) {
                    self.entities[0] = entity;
                } else {
                    self.entities.insert(0, entity);
                }
            }
            other => self.entities.push(other),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn player(&self) -> Option<&Player> {
        match self.entities.first() {
            Some(Entity::Player(player)) => Some(player),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        match self.entities.first_mut() {
            Some(Entity::Player(player)) => Some(player),
            _ => None,
        }
    }

    /// Splits the roster into the player and everything else.
    pub fn split_player_mut(&mut self) -> (Option<&mut Player>, &mut [Entity]) {
        if !matches!(self.entities.first(), Some(Entity::Player(_))) {
            return (None, self.entities.as_mut_slice());
        }
        match self.entities.split_first_mut() {
            Some((Entity::Player(player), rest)) => (Some(player), rest),
            _ => (None, &mut []),
        }
    }

    pub fn npcs(&self) -> &[Entity] {
        match self.entities.first() {
            Some(Entity::Player(_)) => &self.entities[1..],
            _ => &self.entities,
        }
    }

    pub fn living_enemy_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|entity| matches!(entity, Entity::Enemy(enemy) if enemy.body.alive))
            .count()
    }

    /// Runs every non-player entity for one tick against the current player.
    pub fn update_npcs(&mut self, map: Option<&TileMap>, now_tick: u64, fire_respawn_ticks: u64) {
        let (player, rest) = self.split_player_mut();
        let ctx = UpdateContext {
            player: player.map(|player| &*player),
            map,
            now_tick,
            fire_respawn_ticks,
        };
        for entity in rest.iter_mut() {
            entity.update(&ctx);
        }
    }
}
