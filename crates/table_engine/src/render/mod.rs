//! Render layer
//!
//! The backend seam plus the frame pacer. The engine flattens the scene
//! into a [`Frame`] and hands it to whatever [`RenderBackend`] is
//! plugged in; nothing above this module knows how frames become
//! pixels.

use thiserror::Error;

use crate::foundation::math::Mat4;
use crate::foundation::time::Timer;
use crate::scene::graph::{DirectionalLight, DrawItem};

/// Throughput floor below which wide viewports drop to half rate
pub const MIN_FULL_RATE_FPS: f32 = 50.0;

/// Render backend errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The backend could not present the frame
    #[error("failed to present frame: {0}")]
    Present(String),

    /// The backend lost its output surface
    #[error("render surface lost")]
    SurfaceLost,
}

/// One flattened frame, ready for a backend
pub struct Frame<'a> {
    /// View matrix
    pub view: Mat4,
    /// Projection matrix
    pub projection: Mat4,
    /// Renderable items in arbitrary order
    pub items: &'a [DrawItem],
    /// Directional light rig
    pub lights: &'a [DirectionalLight],
}

/// Seam between the engine and a concrete rendering implementation
pub trait RenderBackend {
    /// Current output size in pixels
    fn viewport(&self) -> (u32, u32);

    /// Draw one frame
    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError>;
}

/// Decides which frames run at full rate
///
/// Narrow viewports always run. Wide viewports drop to half rate
/// while measured throughput sits under [`MIN_FULL_RATE_FPS`], trading
/// smoothness for interaction latency on struggling hardware.
pub struct FramePacer {
    timer: Timer,
    skip_next: bool,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePacer {
    /// Create a pacer with a fresh timer
    pub fn new() -> Self {
        Self {
            timer: Timer::new(),
            skip_next: false,
        }
    }

    /// Advance the clock and decide whether this frame should run
    ///
    /// Returns the frame delta in seconds and the run decision. A
    /// skipped frame drops both the scene update and the draw; the
    /// clock still advances so the skip covers real wall time.
    pub fn tick(&mut self, wide_viewport: bool) -> (f32, bool) {
        self.timer.update();
        let draw = !std::mem::take(&mut self.skip_next);
        if draw && should_skip_next(self.timer.instantaneous_fps(), wide_viewport) {
            self.skip_next = true;
        }
        (self.timer.delta_time(), draw)
    }
}

/// Whether the frame after a `fps`-paced one should be skipped
pub fn should_skip_next(fps: f32, wide_viewport: bool) -> bool {
    wide_viewport && fps < MIN_FULL_RATE_FPS
}
