//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene engine.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform positioned and rotated about the vertical axis
    pub fn from_position_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_axis_angle(&Vector3::y_axis(), yaw),
            ..Default::default()
        }
    }

    /// Extract the rotation angle about the vertical axis
    ///
    /// Stable for pure yaw rotations, unlike a full Euler decomposition.
    pub fn yaw(&self) -> f32 {
        let forward = self.rotation * Vec3::new(0.0, 0.0, 1.0);
        forward.x.atan2(forward.z)
    }

    /// Convert to a 4x4 transformation matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Mat4 {
        let translation = Mat4::new_translation(&self.position);
        let rotation = self.rotation.to_homogeneous();
        let scale = Mat4::new_nonuniform_scaling(&self.scale);
        translation * rotation * scale
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,

    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create a bounding box from explicit corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a bounding box centered at the origin with the given full extents
    pub fn from_extents(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width / 2.0, height / 2.0, depth / 2.0);
        Self { min: -half, max: half }
    }

    /// Compute the bounding box of a set of points
    ///
    /// Returns a degenerate box at the origin for an empty set.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self {
                min: Vec3::zeros(),
                max: Vec3::zeros(),
            };
        };

        let mut min = Vec3::from(*first);
        let mut max = min;
        for p in iter {
            let v = Vec3::from(*p);
            min = min.inf(&v);
            max = max.sup(&v);
        }
        Self { min, max }
    }

    /// Full extent along the X axis
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Full extent along the Y axis
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Full extent along the Z axis
    pub fn depth(&self) -> f32 {
        self.max.z - self.min.z
    }

    /// Center point of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }
}
