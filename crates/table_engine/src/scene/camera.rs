//! Orbit-style camera rig
//!
//! Damped orbit/pan/zoom around a fixed look-at center, with polar,
//! distance, and pan-target bounds. Distance bounds and the base
//! placement switch on a responsive viewport breakpoint.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Viewport width at or below which the narrow breakpoint applies
pub const VIEWPORT_BREAKPOINT: u32 = 768;

/// Per-frame damping factor at the 60 Hz reference rate
pub const DAMPING_FACTOR: f32 = 0.05;

/// Lower polar bound (prevents looking from straight above)
pub const MIN_POLAR: f32 = std::f32::consts::FRAC_PI_4;

/// Upper polar bound (prevents looking from below the floor)
pub const MAX_POLAR: f32 = std::f32::consts::PI / 2.2;

/// Vertical field of view in degrees
const FOV_DEGREES: f32 = 50.0;

const NEAR_PLANE: f32 = 0.01;
const FAR_PLANE: f32 = 10_000.0;

/// Fixed look-at center of the scene
fn look_center() -> Vec3 {
    Vec3::new(0.0, 0.25, 0.0)
}

/// Orbit bounds for one viewport breakpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitBounds {
    /// Minimum polar angle
    pub min_polar: f32,
    /// Maximum polar angle
    pub max_polar: f32,
    /// Minimum orbit distance
    pub min_distance: f32,
    /// Maximum orbit distance
    pub max_distance: f32,
    /// Pan target minimum corner
    pub pan_min: Vec3,
    /// Pan target maximum corner
    pub pan_max: Vec3,
}

impl OrbitBounds {
    /// Bounds for the given breakpoint
    pub fn for_breakpoint(narrow: bool) -> Self {
        Self {
            min_polar: MIN_POLAR,
            max_polar: MAX_POLAR,
            min_distance: 0.5,
            max_distance: if narrow { 5.0 } else { 3.0 },
            pan_min: Vec3::new(-1.0, 0.0, -1.0),
            pan_max: Vec3::new(1.0, 0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    azimuth: f32,
    polar: f32,
    distance: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let distance = offset.norm().max(f32::EPSILON);
        Self {
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
            distance,
        }
    }

    fn to_offset(self) -> Vec3 {
        let radial = self.distance * self.polar.sin();
        Vec3::new(
            radial * self.azimuth.sin(),
            self.distance * self.polar.cos(),
            radial * self.azimuth.cos(),
        )
    }

    fn clamped(self, bounds: &OrbitBounds) -> Self {
        Self {
            azimuth: self.azimuth,
            polar: self.polar.clamp(bounds.min_polar, bounds.max_polar),
            distance: self.distance.clamp(bounds.min_distance, bounds.max_distance),
        }
    }

    fn approach(&mut self, desired: Self, alpha: f32) {
        self.azimuth += (desired.azimuth - self.azimuth) * alpha;
        self.polar += (desired.polar - self.polar) * alpha;
        self.distance += (desired.distance - self.distance) * alpha;
    }
}

/// Camera plus damped orbit controls
pub struct CameraRig {
    bounds: OrbitBounds,
    narrow: bool,
    aspect: f32,
    current: Spherical,
    desired: Spherical,
    target: Vec3,
    desired_target: Vec3,
    /// Scene-root vertical offset for the active breakpoint
    pub scene_offset_y: f32,
}

impl CameraRig {
    /// Create the rig for an initial viewport size
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        let narrow = viewport_width <= VIEWPORT_BREAKPOINT;
        let base = Spherical::from_offset(Self::base_position(narrow) - look_center());
        let mut rig = Self {
            bounds: OrbitBounds::for_breakpoint(narrow),
            narrow,
            aspect: aspect_ratio(viewport_width, viewport_height),
            current: base,
            desired: base,
            target: look_center(),
            desired_target: look_center(),
            scene_offset_y: scene_offset(narrow),
        };
        rig.desired = rig.desired.clamped(&rig.bounds);
        rig.current = rig.desired;
        rig
    }

    fn base_position(narrow: bool) -> Vec3 {
        if narrow {
            Vec3::new(1.5, 1.5, 3.0)
        } else {
            Vec3::new(1.25, 1.0, 1.35)
        }
    }

    /// Queue an orbit rotation
    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) {
        self.desired.azimuth += d_azimuth;
        self.desired.polar += d_polar;
        self.desired = self.desired.clamped(&self.bounds);
    }

    /// Queue a zoom by distance delta
    pub fn zoom(&mut self, d_distance: f32) {
        self.desired.distance += d_distance;
        self.desired = self.desired.clamped(&self.bounds);
    }

    /// Queue a pan of the orbit target, clamped to the pan box
    pub fn pan(&mut self, dx: f32, dz: f32) {
        let next = self.desired_target + Vec3::new(dx, 0.0, dz);
        self.desired_target = Vec3::new(
            next.x.clamp(self.bounds.pan_min.x, self.bounds.pan_max.x),
            next.y.clamp(self.bounds.pan_min.y, self.bounds.pan_max.y),
            next.z.clamp(self.bounds.pan_min.z, self.bounds.pan_max.z),
        );
    }

    /// Advance the damped state
    pub fn update(&mut self, delta_time: f32) {
        // Damping is calibrated per-frame at 60 Hz; scale to wall time
        let alpha = 1.0 - (1.0 - DAMPING_FACTOR).powf(delta_time * 60.0);
        self.current.approach(self.desired, alpha);
        self.current = self.current.clamped(&self.bounds);
        self.target += (self.desired_target - self.target) * alpha;
    }

    /// Switch breakpoint bounds and base placement for a viewport change
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let narrow = width <= VIEWPORT_BREAKPOINT;
        self.aspect = aspect_ratio(width, height);
        if narrow == self.narrow {
            return;
        }
        self.narrow = narrow;
        self.bounds = OrbitBounds::for_breakpoint(narrow);
        self.scene_offset_y = scene_offset(narrow);
        self.desired =
            Spherical::from_offset(Self::base_position(narrow) - look_center()).clamped(&self.bounds);
        self.current = self.current.clamped(&self.bounds);
    }

    /// Whether the narrow breakpoint is active
    pub fn is_narrow(&self) -> bool {
        self.narrow
    }

    /// Current camera position in world space
    pub fn position(&self) -> Vec3 {
        self.target + self.current.to_offset()
    }

    /// Current orbit distance
    pub fn distance(&self) -> f32 {
        self.current.distance
    }

    /// Current polar angle
    pub fn polar(&self) -> f32 {
        self.current.polar
    }

    /// Current pan target
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// View matrix re-aimed at the fixed look-at center
    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.position();
        Mat4::look_at_rh(
            &Point3::from(eye),
            &Point3::from(look_center()),
            &Vec3::y_axis(),
        )
    }

    /// Perspective projection for the current aspect ratio
    pub fn projection_matrix(&self) -> Mat4 {
        nalgebra::Perspective3::new(self.aspect, FOV_DEGREES.to_radians(), NEAR_PLANE, FAR_PLANE)
            .to_homogeneous()
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let ratio = width as f32 / (height.max(1)) as f32;
    ratio
}

fn scene_offset(narrow: bool) -> f32 {
    if narrow {
        -0.25
    } else {
        -0.1
    }
}
