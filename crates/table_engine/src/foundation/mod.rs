//! Foundation layer - math, timing, and logging utilities

pub mod logging;
pub mod math;
pub mod time;

pub use math::{Aabb, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use time::Timer;
