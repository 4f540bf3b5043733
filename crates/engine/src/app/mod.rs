mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, run_app_with_metrics, AppError, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{
    text_width_px, DrawCommand, DrawList, PixelRect, Renderer, Rgba, GLYPH_HEIGHT, LINE_ADVANCE,
};
pub use scene::{
    draw_centered_text, ContentState, InputSnapshot, Scene, SceneCommand, SceneHost,
};
