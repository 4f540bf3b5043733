use tracing::{error, info};

use super::input::{ActionStates, InputAction};
use super::metrics::LoopMetricsSnapshot;
use super::rendering::{text_width_px, DrawList, PixelRect, LINE_ADVANCE};
use crate::content::{ContentError, GameContent};

const BACKDROP_COLOR: [u8; 4] = [18, 20, 28, 255];
const BANNER_COLOR: [u8; 4] = [235, 235, 240, 255];
const FAILURE_COLOR: [u8; 4] = [255, 110, 110, 255];
const OVERLAY_PANEL_COLOR: [u8; 4] = [0, 0, 0, 160];
const OVERLAY_TEXT_COLOR: [u8; 4] = [140, 255, 140, 255];
const OVERLAY_MARGIN_PX: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Unload and load the scene again against the same content.
    Restart,
    Quit,
}

/// Input for one simulation tick: which actions are held, and which were
/// newly pressed since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    quit_requested: bool,
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, held: ActionStates, pressed: ActionStates) -> Self {
        Self {
            quit_requested,
            held,
            pressed,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    /// Marks a fresh press; the action also counts as held.
    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.pressed.set(action, true);
        self.held.set(action, true);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    /// -1, 0 or 1 from the run keys; opposite keys cancel out.
    pub fn horizontal_intent(&self) -> f32 {
        let left = self.is_down(InputAction::RunLeft) as i32;
        let right = self.is_down(InputAction::RunRight) as i32;
        (right - left) as f32
    }
}

pub trait Scene {
    fn load(&mut self, content: &GameContent);
    fn update(&mut self, input: &InputSnapshot) -> SceneCommand;
    fn render(&self, draw: &mut DrawList);
    fn unload(&mut self) {}
    fn debug_title(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub enum ContentState {
    #[default]
    Loading,
    Ready(GameContent),
    /// Terminal: a malformed document is never retried.
    Failed(String),
}

/// Owns the active scene and gates it on content readiness. Until content
/// arrives the scene is neither loaded nor updated.
pub struct SceneHost {
    scene: Box<dyn Scene>,
    content: ContentState,
    is_loaded: bool,
    overlay_visible: bool,
}

impl SceneHost {
    pub fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            content: ContentState::Loading,
            is_loaded: false,
            overlay_visible: false,
        }
    }

    pub fn content_state(&self) -> &ContentState {
        &self.content
    }

    pub fn is_ready(&self) -> bool {
        self.is_loaded
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Accepts the result of the content load. Only the first result is
    /// applied.
    pub fn set_content(&mut self, result: Result<GameContent, ContentError>) {
        if !matches!(self.content, ContentState::Loading) {
            return;
        }
        match result {
            Ok(content) => {
                info!(levels = content.levels.len(), "content_ready");
                self.content = ContentState::Ready(content);
                self.load_scene();
            }
            Err(error) => {
                error!(error = %error, "content_load_failed");
                self.content = ContentState::Failed(error.to_string());
            }
        }
    }

    pub fn update(&mut self, input: &InputSnapshot) -> SceneCommand {
        if input.was_pressed(InputAction::ToggleOverlay) {
            self.overlay_visible = !self.overlay_visible;
            info!(overlay_visible = self.overlay_visible, "overlay_toggled");
        }
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        if !self.is_loaded {
            return SceneCommand::None;
        }

        let command = self.scene.update(input);
        if command == SceneCommand::Restart {
            self.scene.unload();
            self.is_loaded = false;
            self.load_scene();
            info!("scene_restarted");
        }
        command
    }

    pub fn render(&self, draw: &mut DrawList, metrics: Option<&LoopMetricsSnapshot>) {
        draw.reset();
        match &self.content {
            ContentState::Loading => {
                draw.clear(BACKDROP_COLOR);
                draw_centered_text(draw, "LOADING...", BANNER_COLOR);
            }
            ContentState::Failed(message) => {
                draw.clear(BACKDROP_COLOR);
                let text = format!("CONTENT FAILED TO LOAD\n{message}");
                draw_centered_text(draw, &text, FAILURE_COLOR);
            }
            ContentState::Ready(_) => self.scene.render(draw),
        }

        if let Some(metrics) = metrics.filter(|_| self.overlay_visible) {
            let text = metrics.overlay_text();
            let width = text_width_px(&text) as i32;
            let x = draw.width() as i32 - width - OVERLAY_MARGIN_PX;
            draw.fill_rect(
                PixelRect::new(
                    x - 2,
                    OVERLAY_MARGIN_PX - 2,
                    width as u32 + 4,
                    LINE_ADVANCE + 2,
                ),
                OVERLAY_PANEL_COLOR,
            );
            draw.text(x, OVERLAY_MARGIN_PX, text, OVERLAY_TEXT_COLOR);
        }
    }

    pub fn debug_title(&self) -> Option<String> {
        if self.is_loaded {
            self.scene.debug_title()
        } else {
            None
        }
    }

    pub fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload();
            self.is_loaded = false;
        }
    }

    fn load_scene(&mut self) {
        if let ContentState::Ready(content) = &self.content {
            self.scene.load(content);
            self.is_loaded = true;
        }
    }
}

/// Centres possibly multi-line `text` in the frame.
pub fn draw_centered_text(draw: &mut DrawList, text: &str, color: [u8; 4]) {
    let line_count = text.lines().count().max(1) as i32;
    let block_height = line_count * LINE_ADVANCE as i32;
    let top = (draw.height() as i32 - block_height) / 2;
    for (index, line) in text.lines().enumerate() {
        let width = text_width_px(line) as i32;
        let x = (draw.width() as i32 - width) / 2;
        draw.text(x, top + index as i32 * LINE_ADVANCE as i32, line, color);
    }
}
