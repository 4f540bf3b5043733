use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::content::ContentLoader;
use crate::{resolve_app_paths, StartupError};

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::{
    DrawList, InputAction, InputSnapshot, MetricsHandle, Renderer, Scene, SceneCommand, SceneHost,
};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Logical frame size scenes draw into; the surface scales it to the
    /// window.
    pub view_width: u32,
    pub view_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Platformer".to_string(),
            window_width: 1280,
            window_height: 720,
            view_width: 640,
            view_height: 360,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    run_app_with_metrics(config, scene, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        "startup"
    );
    let mut content_loader = Some(ContentLoader::spawn(app_paths.assets_dir.clone()));
    let mut host = SceneHost::new(scene);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(
        Arc::clone(&window),
        config.view_width,
        config.view_height,
        app_paths.assets_dir.clone(),
    )
    .map_err(AppError::CreateRenderer)?;
    let (frame_width, frame_height) = renderer.frame_size();
    let mut draw_list = DrawList::new(frame_width, frame_height);

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::default();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        view_width = frame_width,
        view_height = frame_height,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize_surface(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => input_collector.release_all(),
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_key(event.physical_key, event.state);
                }
                WindowEvent::RedrawRequested => {
                    if let Some(loader) = content_loader.as_ref() {
                        if let Some(result) = loader.poll() {
                            host.set_content(result);
                            content_loader = None;
                        }
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    accumulator =
                        accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        metrics_accumulator.record_tick();
                        if host.update(&input_snapshot) == SceneCommand::Quit {
                            info!(reason = "quit_action", "shutdown_requested");
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        let dropped_ticks =
                            (step_plan.dropped_backlog.as_nanos() / fixed_dt.as_nanos()) as u32;
                        metrics_accumulator.record_dropped_ticks(dropped_ticks);
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep = compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let metrics = metrics_handle.snapshot();
                    host.render(&mut draw_list, Some(&metrics));
                    if let Err(error) = renderer.render(&draw_list) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = host.debug_title();
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(&config.window_title));
                        last_applied_title = next_title;
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            worst_frame_ms = snapshot.worst_frame_ms,
                            dropped_ticks = snapshot.dropped_ticks,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                host.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Folds raw key events into held state plus press edges for the next tick.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    held: ActionStates,
    pressed: ActionStates,
}

impl InputCollector {
    fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let Some(action) = action_for_key(key) else {
            return;
        };
        match state {
            ElementState::Pressed => {
                if action.is_edge_triggered() && !self.held.is_down(action) {
                    self.pressed.set(action, true);
                }
                self.held.set(action, true);
                if action == InputAction::Quit {
                    self.quit_requested = true;
                }
            }
            ElementState::Released => self.held.set(action, false),
        }
    }

    fn release_all(&mut self) {
        self.held.clear();
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(self.quit_requested, self.held, self.pressed);
        self.pressed.clear();
        snapshot
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match code {
        KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::RunLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::RunRight,
        KeyCode::KeyW | KeyCode::ArrowUp | KeyCode::Space => InputAction::Jump,
        KeyCode::KeyJ | KeyCode::KeyX => InputAction::Attack,
        KeyCode::KeyK | KeyCode::ShiftLeft | KeyCode::ShiftRight => InputAction::Dash,
        KeyCode::KeyR => InputAction::Restart,
        KeyCode::F3 => InputAction::ToggleOverlay,
        KeyCode::Escape => InputAction::Quit,
        _ => return None,
    };
    Some(action)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
