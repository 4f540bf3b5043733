//! Loop timing. The runner fills a [`MetricsAccumulator`] every frame and
//! publishes one [`LoopMetricsSnapshot`] per interval through a
//! [`MetricsHandle`] that the overlay reads.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    pub dropped_ticks: u32,
}

impl LoopMetricsSnapshot {
    /// Uppercase so the bitmap font can draw all of it.
    pub fn overlay_text(&self) -> String {
        format!(
            "FPS {:.0} TPS {:.0} {:.1}MS MAX {:.1}MS DROP {}",
            self.fps, self.tps, self.frame_time_ms, self.worst_frame_ms, self.dropped_ticks
        )
    }
}

/// Most recently published snapshot. A poisoned lock still hands out the
/// last value written.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<Mutex<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Window {
    frames: u32,
    ticks: u32,
    dropped_ticks: u32,
    frame_time_total: Duration,
    worst_frame: Duration,
}

impl Window {
    fn summarize(&self, elapsed: Duration) -> LoopMetricsSnapshot {
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match self.frames {
            0 => 0.0,
            frames => self.frame_time_total.as_secs_f32() * 1000.0 / frames as f32,
        };
        LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms,
            worst_frame_ms: self.worst_frame.as_secs_f32() * 1000.0,
            dropped_ticks: self.dropped_ticks,
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    interval: Duration,
    window: Window,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            window_start: Instant::now(),
            interval,
            window: Window::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        let window = &mut self.window;
        window.frames = window.frames.saturating_add(1);
        window.frame_time_total = window.frame_time_total.saturating_add(frame_dt);
        window.worst_frame = window.worst_frame.max(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.window.ticks = self.window.ticks.saturating_add(1);
    }

    pub(crate) fn record_dropped_ticks(&mut self, count: u32) {
        self.window.dropped_ticks = self.window.dropped_ticks.saturating_add(count);
    }

    /// Closes the window once `interval` has passed and starts a new one.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let snapshot = std::mem::take(&mut self.window).summarize(elapsed);
        self.window_start = now;
        Some(snapshot)
    }
}
