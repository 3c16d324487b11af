//! Scene parameters
//!
//! The single source of truth driving all derived geometry. Parameter
//! values are immutable once applied; the controller diffs a new value
//! against the previously applied one to decide which derived
//! subsystems need rebuilding.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Allowed tabletop width in millimeters
pub const WIDTH_RANGE_MM: (f32, f32) = (1200.0, 2400.0);

/// Allowed tabletop depth in millimeters
pub const DEPTH_RANGE_MM: (f32, f32) = (300.0, 900.0);

/// Allowed leg length in millimeters
pub const LEG_LENGTH_RANGE_MM: (f32, f32) = (500.0, 1200.0);

/// Tabletop dimensions in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableDimensions {
    /// Width (lateral axis)
    pub width: f32,
    /// Depth (front-to-back axis)
    pub depth: f32,
}

impl TableDimensions {
    /// Create dimensions without validation
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }

    /// Clamp into the supported ranges
    ///
    /// The UI collaborator clamps before values reach the core, but
    /// out-of-range input must still degrade to the nearest valid value
    /// rather than fail: visual continuity beats strict validation at
    /// this layer.
    pub fn clamped(self) -> Self {
        let width = clamp_with_warning("width", self.width, WIDTH_RANGE_MM);
        let depth = clamp_with_warning("depth", self.depth, DEPTH_RANGE_MM);
        Self { width, depth }
    }
}

/// The full parameter set driving the scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParameters {
    /// Tabletop dimensions in millimeters
    pub dimensions: TableDimensions,
    /// Leg length in millimeters
    pub leg_length: f32,
    /// Path of the tabletop material bundle
    pub material_path: String,
    /// Path of the support variant bundle
    pub supports_path: String,
}

impl SceneParameters {
    /// Clamp every numeric field into its supported range
    pub fn clamped(mut self) -> Self {
        self.dimensions = self.dimensions.clamped();
        self.leg_length = clamp_with_warning("leg length", self.leg_length, LEG_LENGTH_RANGE_MM);
        self
    }

    /// Which derived subsystems a transition from `prev` invalidates
    pub fn diff(&self, prev: &Self) -> RebuildFlags {
        let mut flags = RebuildFlags::empty();
        if self.dimensions != prev.dimensions || self.leg_length != prev.leg_length {
            flags |= RebuildFlags::SIZE;
        }
        if self.material_path != prev.material_path {
            flags |= RebuildFlags::MATERIAL;
        }
        if self.supports_path != prev.supports_path {
            flags |= RebuildFlags::SUPPORTS;
        }
        flags
    }
}

bitflags! {
    /// Derived subsystems invalidated by a parameter change
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RebuildFlags: u8 {
        /// Tabletop geometry, texture transform, leg and support placement
        const SIZE = 1;
        /// Tabletop material swap
        const MATERIAL = 1 << 1;
        /// Support assembly teardown and reload
        const SUPPORTS = 1 << 2;
    }
}

fn clamp_with_warning(name: &str, value: f32, (min, max): (f32, f32)) -> f32 {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if (clamped - value).abs() > f32::EPSILON || value.is_nan() {
        log::warn!("{name} {value}mm outside [{min}, {max}]mm, clamping to {clamped}mm");
    }
    clamped
}
