use platformer_engine::{
    DrawCommand, DrawList, GameContent, InputAction, InputSnapshot, LevelData, Scene,
    SceneCommand, SpawnKind, SpawnRecord, TileMap,
};

use super::hud::status_line;
use super::scene::{PlatformerScene, SessionState};

const TILE: u32 = 32;
const COLUMNS: u32 = 20;
const ROWS: u32 = 10;
const FLOOR_TOP: f32 = ((ROWS - 1) * TILE) as f32;
const PLAYER_START: (f32, f32) = (100.0, FLOOR_TOP - 48.0);
const VIEW: (f32, f32) = (320.0, 180.0);

fn floor_map() -> TileMap {
    let mut tiles = vec![0; (COLUMNS * ROWS) as usize];
    for column in 0..COLUMNS {
        tiles[((ROWS - 1) * COLUMNS + column) as usize] = 1;
    }
    TileMap::new(COLUMNS, ROWS, TILE, TILE, tiles, Vec::new()).expect("floor map")
}

fn open_map() -> TileMap {
    TileMap::new(COLUMNS, ROWS, TILE, TILE, vec![0; (COLUMNS * ROWS) as usize], Vec::new())
        .expect("open map")
}

fn enemy_at(x: f32) -> SpawnRecord {
    SpawnRecord {
        x,
        y: FLOOR_TOP - 32.0,
        kind: SpawnKind::Enemy,
    }
}

fn level(name: &str, map: TileMap, spawns: Vec<SpawnRecord>) -> LevelData {
    LevelData {
        name: name.to_string(),
        map,
        player_start: PLAYER_START,
        spawns,
    }
}

/// Enemy far outside any detection radius keeps the level in play.
fn quiet_level(name: &str) -> LevelData {
    level(name, floor_map(), vec![enemy_at(560.0)])
}

/// Enemy just inside attack range in front of the player.
fn duel_level(name: &str) -> LevelData {
    level(name, floor_map(), vec![enemy_at(140.0)])
}

fn loaded_scene(levels: Vec<LevelData>, start_level: usize) -> PlatformerScene {
    let content = GameContent {
        levels,
        ..GameContent::default()
    };
    let mut scene = PlatformerScene::new(start_level, VIEW.0, VIEW.1);
    scene.load(&content);
    scene
}

fn advance(scene: &mut PlatformerScene, input: &InputSnapshot, ticks: usize) {
    for _ in 0..ticks {
        scene.update(input);
    }
}

fn player_position(scene: &PlatformerScene) -> (f32, f32) {
    let player = scene
        .level()
        .and_then(|level| level.roster.player())
        .expect("player");
    (player.body.x, player.body.y)
}

fn level_index(scene: &PlatformerScene) -> usize {
    scene.level().expect("active level").index
}

fn pressed(action: InputAction) -> InputSnapshot {
    InputSnapshot::empty().with_action_pressed(action)
}

#[test]
fn load_starts_requested_level_at_player_start() {
    let scene = loaded_scene(vec![quiet_level("One"), quiet_level("Two")], 1);
    assert_eq!(level_index(&scene), 1);
    assert_eq!(scene.session(), SessionState::Playing);
    assert_eq!(player_position(&scene), PLAYER_START);
}

#[test]
fn out_of_range_start_level_falls_back_to_first() {
    let scene = loaded_scene(vec![quiet_level("One")], 7);
    assert_eq!(level_index(&scene), 0);
}

#[test]
fn empty_content_leaves_scene_idle() {
    let mut scene = loaded_scene(Vec::new(), 0);
    assert!(scene.level().is_none());
    assert_eq!(scene.update(&InputSnapshot::empty()), SceneCommand::None);

    let mut draw = DrawList::new(320, 180);
    scene.render(&mut draw);
    assert!(draw.commands().iter().any(|command| {
        matches!(command, DrawCommand::Text { text, .. } if text.contains("NO LEVELS"))
    }));
}

#[test]
fn player_rests_on_floor_and_runs_right() {
    let mut scene = loaded_scene(vec![quiet_level("One")], 0);
    advance(&mut scene, &InputSnapshot::empty(), 5);
    assert_eq!(player_position(&scene), PLAYER_START);

    let run_right = InputSnapshot::empty().with_action_down(InputAction::RunRight, true);
    advance(&mut scene, &run_right, 10);
    let (x, y) = player_position(&scene);
    assert_eq!(x, PLAYER_START.0 + 40.0);
    assert_eq!(y, PLAYER_START.1);
    let player = scene
        .level()
        .and_then(|level| level.roster.player())
        .expect("player");
    assert!(player.sprite_name().starts_with("run_right_"));
}

#[test]
fn camera_follows_player_within_map_bounds() {
    let mut scene = loaded_scene(vec![quiet_level("One")], 0);
    let run_right = InputSnapshot::empty().with_action_down(InputAction::RunRight, true);
    advance(&mut scene, &run_right, 30);

    let level = scene.level().expect("level");
    let player = level.roster.player().expect("player");
    let view = level.map.view();
    assert_eq!(view.x, player.body.center_x() - VIEW.0 * 0.5);
    assert_eq!(view.y, level.map.pixel_height() - VIEW.1);
}

#[test]
fn jump_press_leaves_the_ground_once() {
    let mut scene = loaded_scene(vec![quiet_level("One")], 0);
    scene.update(&pressed(InputAction::Jump));
    let (_, after_jump) = player_position(&scene);
    assert!(after_jump < PLAYER_START.1);

    // Holding the key does not re-trigger the jump.
    let held = InputSnapshot::empty().with_action_down(InputAction::Jump, true);
    advance(&mut scene, &held, 60);
    assert_eq!(player_position(&scene).1, PLAYER_START.1);
}

#[test]
fn defeating_last_enemy_scores_and_advances_level() {
    let mut scene = loaded_scene(vec![duel_level("One"), quiet_level("Two")], 0);
    scene.update(&pressed(InputAction::Attack));

    assert_eq!(scene.score(), 100);
    assert!(matches!(
        scene.session(),
        SessionState::LevelComplete { .. }
    ));
    let charges = scene
        .level()
        .and_then(|level| level.roster.player())
        .map(|player| player.dash_charges);
    assert_eq!(charges, Some(1));

    advance(&mut scene, &InputSnapshot::empty(), 120);
    assert_eq!(scene.session(), SessionState::Playing);
    assert_eq!(level_index(&scene), 1);
    assert_eq!(scene.score(), 100);
}

#[test]
fn dash_needs_a_charge_earned_from_a_kill() {
    let mut scene = loaded_scene(vec![level(
        "One",
        floor_map(),
        vec![enemy_at(140.0), enemy_at(560.0)],
    )], 0);

    scene.update(&pressed(InputAction::Dash));
    assert_eq!(player_position(&scene).0, PLAYER_START.0);

    scene.update(&pressed(InputAction::Attack));
    assert_eq!(scene.session(), SessionState::Playing);
    let before = player_position(&scene).0;
    scene.update(&pressed(InputAction::Dash));
    let player = scene
        .level()
        .and_then(|level| level.roster.player())
        .expect("player");
    assert!(player.is_dashing());
    assert_eq!(player.dash_charges, 0);
    assert_eq!(player.body.x, before + 12.0);
}

#[test]
fn dash_pressed_while_turning_goes_the_new_way() {
    let mut scene = loaded_scene(vec![level(
        "One",
        floor_map(),
        vec![enemy_at(140.0), enemy_at(560.0)],
    )], 0);
    scene.update(&pressed(InputAction::Attack));
    let before = player_position(&scene).0;

    let turn_and_dash = InputSnapshot::empty()
        .with_action_down(InputAction::RunLeft, true)
        .with_action_pressed(InputAction::Dash);
    scene.update(&turn_and_dash);
    assert_eq!(player_position(&scene).0, before - 12.0);
}

#[test]
fn enemy_contact_kills_player_and_level_restarts() {
    let mut scene = loaded_scene(vec![level("One", floor_map(), vec![enemy_at(110.0)])], 0);
    scene.update(&InputSnapshot::empty());
    assert_eq!(
        scene.session(),
        SessionState::PlayerDead { ticks_left: 90 }
    );

    let mut draw = DrawList::new(320, 180);
    scene.render(&mut draw);
    assert!(draw.commands().iter().any(|command| {
        matches!(command, DrawCommand::Text { text, .. } if text.contains("YOU DIED"))
    }));

    advance(&mut scene, &InputSnapshot::empty(), 90);
    assert_eq!(scene.session(), SessionState::Playing);
    assert_eq!(player_position(&scene), PLAYER_START);
}

#[test]
fn falling_off_the_map_kills_player() {
    let mut scene = loaded_scene(vec![level("Pit", open_map(), vec![enemy_at(560.0)])], 0);
    for _ in 0..200 {
        scene.update(&InputSnapshot::empty());
        if matches!(scene.session(), SessionState::PlayerDead { .. }) {
            break;
        }
    }
    assert!(matches!(scene.session(), SessionState::PlayerDead { .. }));
}

#[test]
fn restart_key_resets_level_and_score() {
    let mut scene = loaded_scene(
        vec![level("One", floor_map(), vec![enemy_at(140.0), enemy_at(560.0)])],
        0,
    );
    scene.update(&pressed(InputAction::Attack));
    assert_eq!(scene.score(), 100);
    let run_right = InputSnapshot::empty().with_action_down(InputAction::RunRight, true);
    advance(&mut scene, &run_right, 5);

    assert_eq!(scene.update(&pressed(InputAction::Restart)), SceneCommand::None);
    assert_eq!(scene.score(), 0);
    assert_eq!(player_position(&scene), PLAYER_START);
    assert_eq!(
        scene.level().map(|level| level.roster.living_enemy_count()),
        Some(2)
    );
}

#[test]
fn clearing_last_level_is_victory_and_restart_replays() {
    let mut scene = loaded_scene(vec![duel_level("Final")], 0);
    scene.update(&pressed(InputAction::Attack));
    advance(&mut scene, &InputSnapshot::empty(), 120);
    assert_eq!(scene.session(), SessionState::Victory);

    let mut draw = DrawList::new(320, 180);
    scene.render(&mut draw);
    assert!(draw.commands().iter().any(|command| {
        matches!(command, DrawCommand::Text { text, .. } if text.contains("YOU WIN"))
    }));

    assert_eq!(
        scene.update(&pressed(InputAction::Restart)),
        SceneCommand::Restart
    );
}

#[test]
fn fires_respawn_after_hitting_the_floor() {
    let fire = SpawnRecord {
        x: 400.0,
        y: 0.0,
        kind: SpawnKind::Fire,
    };
    let mut scene = loaded_scene(
        vec![level("One", floor_map(), vec![fire, enemy_at(560.0)])],
        0,
    );
    let fire_active = |scene: &PlatformerScene| {
        scene
            .level()
            .map(|level| level.roster.npcs()[0].is_live())
            .expect("level")
    };

    assert!(fire_active(&scene));
    advance(&mut scene, &InputSnapshot::empty(), 150);
    assert!(!fire_active(&scene));
    advance(&mut scene, &InputSnapshot::empty(), 60);
    assert!(fire_active(&scene));
}

#[test]
fn render_draws_hud_and_placeholders_for_unknown_sprites() {
    let scene = loaded_scene(vec![quiet_level("Meadow")], 0);
    let mut draw = DrawList::new(320, 180);
    scene.render(&mut draw);

    let expected = status_line("Meadow", 0, 0);
    assert_eq!(expected, "MEADOW  SCORE 0  DASH 0");
    assert!(draw.commands().iter().any(|command| {
        matches!(command, DrawCommand::Text { text, .. } if *text == expected)
    }));
    assert!(draw.commands().iter().any(|command| {
        matches!(command, DrawCommand::Placeholder { label, .. } if label == "idle_right")
    }));
}

#[test]
fn debug_title_reports_level_and_enemies() {
    let scene = loaded_scene(vec![quiet_level("Meadow")], 0);
    let title = scene.debug_title().expect("title");
    assert!(title.starts_with("Meadow | score 0 | enemies 1"));
    assert_eq!(scene.tick(), 0);
}
