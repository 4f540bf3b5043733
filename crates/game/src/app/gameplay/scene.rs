use platformer_engine::{
    CombatConfig, DrawList, GameContent, InputAction, InputSnapshot, LevelData, PhysicsEngine,
    PixelRect, Roster, Scene, SceneCommand, SpawnTuning, SpriteAtlas, TileMap,
};
use tracing::{info, warn};

use super::combat::resolve_interactions;
use super::hud;

const SKY_COLOR: [u8; 4] = [92, 148, 252, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Playing,
    PlayerDead { ticks_left: u32 },
    LevelComplete { ticks_left: u32 },
    Victory,
}

/// Live state of the level being played.
#[derive(Debug, Clone)]
pub(crate) struct ActiveLevel {
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) map: TileMap,
    pub(crate) roster: Roster,
}

/// Game loop orchestrator: turns input into player intents, drives physics
/// and entity updates, resolves combat and sequences levels.
pub(crate) struct PlatformerScene {
    start_level: usize,
    view_size: (f32, f32),
    levels: Vec<LevelData>,
    atlas: SpriteAtlas,
    combat: CombatConfig,
    spawn: SpawnTuning,
    physics: PhysicsEngine,
    level: Option<ActiveLevel>,
    session: SessionState,
    score: u32,
    score_at_level_start: u32,
    tick: u64,
}

impl PlatformerScene {
    pub(crate) fn new(start_level: usize, view_width: f32, view_height: f32) -> Self {
        Self {
            start_level,
            view_size: (view_width, view_height),
            levels: Vec::new(),
            atlas: SpriteAtlas::default(),
            combat: CombatConfig::default(),
            spawn: SpawnTuning::default(),
            physics: PhysicsEngine::default(),
            level: None,
            session: SessionState::Playing,
            score: 0,
            score_at_level_start: 0,
            tick: 0,
        }
    }

    pub(crate) fn session(&self) -> SessionState {
        self.session
    }

    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    pub(crate) fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn level(&self) -> Option<&ActiveLevel> {
        self.level.as_ref()
    }

    fn begin_level(&mut self, index: usize) {
        let Some(data) = self.levels.get(index) else {
            self.level = None;
            return;
        };
        let mut map = data.map.clone();
        map.set_view_size(self.view_size.0, self.view_size.1);
        let roster = data.instantiate(&self.spawn, index as u64, self.tick);
        if let Some(player) = roster.player() {
            map.center_view_on(player.body.center_x(), player.body.center_y());
        }
        info!(
            level = %data.name,
            index,
            enemy_count = data.enemy_spawn_count(),
            "level_started"
        );
        self.level = Some(ActiveLevel {
            index,
            name: data.name.clone(),
            map,
            roster,
        });
        self.session = SessionState::Playing;
        self.score_at_level_start = self.score;
    }

    fn restart_level(&mut self) {
        let index = self.level.as_ref().map_or(self.start_level, |level| level.index);
        self.score = self.score_at_level_start;
        self.begin_level(index);
    }

    fn advance_level(&mut self) {
        let next = self.level.as_ref().map_or(0, |level| level.index + 1);
        if next < self.levels.len() {
            self.begin_level(next);
        } else {
            info!(score = self.score, "game_won");
            self.session = SessionState::Victory;
        }
    }

    fn step_playing(&mut self, input: &InputSnapshot) {
        let Some(level) = self.level.as_mut() else {
            return;
        };
        let dash_ticks = self.physics.config().dash_duration_ticks;

        if let Some(player) = level.roster.player_mut() {
            player.set_move_intent(input.horizontal_intent());
            if input.was_pressed(InputAction::Jump) {
                player.request_jump();
            }
            if input.was_pressed(InputAction::Attack)
                && player.try_attack(self.tick, self.combat.attack_cooldown_ticks)
            {
                info!(tick = self.tick, "player_attack");
            }
            if input.was_pressed(InputAction::Dash) {
                if player.try_start_dash(dash_ticks) {
                    info!(charges_left = player.dash_charges, "player_dash");
                } else {
                    info!(charges = player.dash_charges, "player_dash_refused");
                }
            }

            self.physics
                .step(Some(&level.map), &mut player.body, &mut player.motion);
            player.update_state();
        }

        level
            .roster
            .update_npcs(Some(&level.map), self.tick, self.combat.fire_respawn_ticks);
        let outcome = resolve_interactions(&mut level.roster, &level.map, &self.combat);
        self.score = self
            .score
            .saturating_add(outcome.kills.saturating_mul(self.combat.enemy_score));

        if let Some(player) = level.roster.player() {
            level
                .map
                .center_view_on(player.body.center_x(), player.body.center_y());
        }

        if let Some(cause) = outcome.death {
            info!(cause = cause.as_str(), tick = self.tick, "player_died");
            self.session = SessionState::PlayerDead {
                ticks_left: self.combat.death_restart_ticks,
            };
        } else if level.roster.living_enemy_count() == 0 {
            info!(level = %level.name, score = self.score, "level_complete");
            self.session = SessionState::LevelComplete {
                ticks_left: self.combat.level_complete_ticks,
            };
        }
    }
}

impl Scene for PlatformerScene {
    fn load(&mut self, content: &GameContent) {
        self.levels = content.levels.clone();
        self.atlas = content.atlas.clone();
        self.combat = content.combat;
        self.spawn = content.spawn;
        self.physics = PhysicsEngine::new(content.physics);
        self.score = 0;
        self.tick = 0;

        let index = if self.start_level < self.levels.len() {
            self.start_level
        } else {
            warn!(
                requested = self.start_level,
                available = self.levels.len(),
                "start_level_out_of_range_using_first"
            );
            0
        };
        self.begin_level(index);
    }

    fn update(&mut self, input: &InputSnapshot) -> SceneCommand {
        self.tick += 1;
        if self.level.is_none() {
            return SceneCommand::None;
        }

        if input.was_pressed(InputAction::Restart) {
            if self.session == SessionState::Victory {
                return SceneCommand::Restart;
            }
            info!("level_restart_requested");
            self.restart_level();
            return SceneCommand::None;
        }

        match self.session {
            SessionState::Playing => self.step_playing(input),
            SessionState::PlayerDead { ticks_left } => {
                if ticks_left <= 1 {
                    self.restart_level();
                } else {
                    self.session = SessionState::PlayerDead {
                        ticks_left: ticks_left - 1,
                    };
                }
            }
            SessionState::LevelComplete { ticks_left } => {
                if ticks_left <= 1 {
                    self.advance_level();
                } else {
                    self.session = SessionState::LevelComplete {
                        ticks_left: ticks_left - 1,
                    };
                }
            }
            SessionState::Victory => {}
        }
        SceneCommand::None
    }

    fn render(&self, draw: &mut DrawList) {
        draw.clear(SKY_COLOR);
        let Some(level) = self.level() else {
            hud::draw_banner(draw, "NO LEVELS LOADED");
            return;
        };

        level.map.draw_tiles(draw);
        let view = level.map.view();
        for entity in level.roster.entities() {
            if !entity.is_live() {
                continue;
            }
            let body = entity.body();
            let target = PixelRect::new(
                (body.x - view.x).round() as i32,
                (body.y - view.y).round() as i32,
                body.width.round() as u32,
                body.height.round() as u32,
            );
            self.atlas.draw_sprite(draw, entity.sprite_name(), target);
        }

        let dash_charges = level
            .roster
            .player()
            .map_or(0, |player| player.dash_charges);
        hud::draw_status(draw, &level.name, self.score, dash_charges);
        match self.session {
            SessionState::Playing => {}
            SessionState::PlayerDead { .. } => hud::draw_banner(draw, "YOU DIED"),
            SessionState::LevelComplete { .. } => hud::draw_banner(draw, "LEVEL COMPLETE!"),
            SessionState::Victory => hud::draw_banner(
                draw,
                &format!("YOU WIN!\nSCORE {}\nPRESS R TO PLAY AGAIN", self.score),
            ),
        }
    }

    fn unload(&mut self) {
        self.level = None;
        self.levels.clear();
        self.session = SessionState::Playing;
    }

    fn debug_title(&self) -> Option<String> {
        let level = self.level()?;
        Some(format!(
            "{} | score {} | enemies {} | {:?} | tick {}",
            level.name,
            self.score(),
            level.roster.living_enemy_count(),
            self.session(),
            self.tick()
        ))
    }
}
