use crate::app::SceneApp;
use orbitlight_render::Renderer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Source of frame timestamps, in milliseconds since the loop started.
pub trait FrameScheduler {
    /// Timestamp of the next frame, or `None` when no more frames will come.
    fn next_frame(&mut self) -> Option<f64>;
}

/// Deterministic timestamps at a fixed rate: `0, 1000/fps, 2000/fps, ...`.
#[derive(Debug, Clone)]
pub struct FixedStepScheduler {
    step_ms: f64,
    frame: u64,
    limit: Option<u64>,
}

impl FixedStepScheduler {
    /// `fps` below 1 is treated as 1.
    pub fn new(fps: f64) -> Self {
        Self {
            step_ms: 1000.0 / fps.max(1.0),
            frame: 0,
            limit: None,
        }
    }

    /// Stop after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }
}

impl FrameScheduler for FixedStepScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        if self.limit.is_some_and(|limit| self.frame >= limit) {
            return None;
        }
        let t = self.frame as f64 * self.step_ms;
        self.frame += 1;
        Some(t)
    }
}

/// Wall-clock timestamps from a monotonic clock. Never runs out.
#[derive(Debug, Clone)]
pub struct ClockScheduler {
    start: Instant,
}

impl ClockScheduler {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since construction.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for ClockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for ClockScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        Some(self.elapsed_ms())
    }
}

/// Shared stop flag for a frame loop. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    SchedulerExhausted,
}

/// What a finished loop did.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStats {
    pub frames: u64,
    pub last_timestamp_ms: Option<f64>,
    pub stop: StopReason,
}

/// Drive `app` until the scheduler runs dry or `cancel` fires.
///
/// Cancellation is checked before each frame, so a frame in progress always
/// completes. `on_frame` receives every rendered output with its timestamp.
pub fn run_loop<S, R, F>(
    app: &mut SceneApp,
    scheduler: &mut S,
    renderer: &mut R,
    cancel: &CancelToken,
    mut on_frame: F,
) -> LoopStats
where
    S: FrameScheduler + ?Sized,
    R: Renderer,
    F: FnMut(f64, R::Output),
{
    let mut frames = 0;
    let mut last_timestamp_ms = None;
    let stop = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }
        let Some(t) = scheduler.next_frame() else {
            break StopReason::SchedulerExhausted;
        };
        let output = app.frame(renderer, t);
        on_frame(t, output);
        frames += 1;
        last_timestamp_ms = Some(t);
    };

    tracing::info!(frames, ?stop, "frame loop stopped");
    LoopStats {
        frames,
        last_timestamp_ms,
        stop,
    }
}
