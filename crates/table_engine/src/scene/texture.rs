//! Texture mapping policy
//!
//! Recomputes texture repeat and offset whenever the tabletop
//! dimensions change, so surface patterns tile at constant density
//! instead of stretching with the slab.

use crate::foundation::math::Vec2;
use crate::scene::geometry::MM_TO_UNITS;
use crate::scene::graph::Material;

/// Tiles of pattern per scene unit of tabletop
pub const TILING_DENSITY: f32 = 1.5;

/// Repeat and offset applied to every texture channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureTransform {
    /// Tiling repeat
    pub repeat: Vec2,
    /// Tiling offset
    pub offset: Vec2,
}

/// Derive the texture transform for the given tabletop dimensions
///
/// Repeat scales linearly with each dimension; the offset recenters the
/// pattern on the slab, so it grows linearly and opposite in sign.
pub fn compute_texture_transform(width_mm: f32, depth_mm: f32) -> TextureTransform {
    TextureTransform {
        repeat: Vec2::new(
            width_mm / MM_TO_UNITS * TILING_DENSITY,
            depth_mm / MM_TO_UNITS * TILING_DENSITY,
        ),
        offset: Vec2::new(
            -width_mm / (2.0 * MM_TO_UNITS),
            -depth_mm / (2.0 * MM_TO_UNITS),
        ),
    }
}

/// Write the transform to every texture channel present on `material`
///
/// Absent channels are skipped. The material is flagged for re-upload.
pub fn apply_to_material(material: &mut Material, transform: &TextureTransform) {
    for channel in material.texture_channels_mut() {
        channel.repeat = transform.repeat;
        channel.offset = transform.offset;
    }
    material.needs_upload = true;
}
