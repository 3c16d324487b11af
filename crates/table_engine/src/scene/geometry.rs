//! Geometry builder
//!
//! Pure functions deriving tabletop geometry and leg/support placement
//! from the table parameters. Millimeter inputs convert to scene units
//! through [`MM_TO_UNITS`]; that divisor is part of the external
//! contract, not a tunable.

use crate::assets::MeshData;
use crate::foundation::math::{Aabb, Transform, Vec3};
use crate::scene::graph::Geometry;
use crate::scene::parts::LegTemplate;

/// Millimeters per scene unit
pub const MM_TO_UNITS: f32 = 1000.0;

/// Tabletop slab thickness in scene units
pub const TABLETOP_HEIGHT: f32 = 0.015;

/// Height of the tabletop above the floor
pub const TABLETOP_Y: f32 = 0.5;

/// Inset of each leg from the tabletop edge
pub const LEG_MARGIN: f32 = 0.02;

/// Vertical lift of the leg assembly roots
pub const LEG_BASE_Y: f32 = 0.0075;

/// Depth the source leg model was authored for, in millimeters
pub const LEG_REFERENCE_DEPTH_MM: f32 = 300.0;

/// Leg length the source leg model was authored for, in millimeters
pub const LEG_REFERENCE_LENGTH_MM: f32 = 500.0;

/// Vertical base of the support assemblies
pub const SUPPORT_BASE_Y: f32 = -0.005;

/// Corner inset used for supports before the leg template is available
pub const SUPPORT_CORNER_MARGIN: f32 = 0.055;

/// Axis-aligned box tabletop geometry centered at the local origin
///
/// Extents are exactly `(width/1000, height, depth/1000)`. The previous
/// geometry must be released by the caller; this function never touches
/// the scene graph.
pub fn build_tabletop_geometry(width_mm: f32, depth_mm: f32, height: f32) -> Geometry {
    let width = width_mm / MM_TO_UNITS;
    let depth = depth_mm / MM_TO_UNITS;
    Geometry {
        mesh: box_mesh(width, height, depth),
        bounds: Aabb::from_extents(width, height, depth),
    }
}

/// Placement of one leg assembly root
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegRootPlacement {
    /// Root position in scene units
    pub position: Vec3,
    /// Rotation about the vertical axis
    pub yaw: f32,
}

/// Mirrored left/right leg root placements for the given width
pub fn compute_leg_transforms(width_mm: f32) -> [LegRootPlacement; 2] {
    let lateral = width_mm / (2.0 * MM_TO_UNITS) - LEG_MARGIN;
    [
        LegRootPlacement {
            position: Vec3::new(lateral, LEG_BASE_Y, 0.0),
            yaw: std::f32::consts::FRAC_PI_2,
        },
        LegRootPlacement {
            position: Vec3::new(-lateral, LEG_BASE_Y, 0.0),
            yaw: -std::f32::consts::FRAC_PI_2,
        },
    ]
}

/// Scale factors and anchor-preserving offsets for the leg sub-parts
///
/// All offsets derive from the template's own bounding boxes so that a
/// differently proportioned leg model lays out correctly without any
/// hardcoded extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPartLayout {
    /// Scale applied along the caps' long axis ( = depth / reference depth)
    pub lateral_scale: f32,
    /// Scale applied along the columns ( = leg length / reference length)
    pub vertical_scale: f32,
    /// How far a cap end moves when the cap is rescaled:
    /// `(cap_width/2) * lateral_scale - cap_width/2`
    pub cap_shift: f32,
    /// How far the column bottom moves when the column is rescaled:
    /// `column_height * vertical_scale - column_height`
    pub column_drop: f32,
    /// Half-span of the rescaled cap, measured from the leg center
    pub cap_half_span: f32,
}

/// Derive the sub-part layout for the given depth and leg length
pub fn compute_leg_part_layout(
    depth_mm: f32,
    leg_length_mm: f32,
    template: &LegTemplate,
) -> LegPartLayout {
    let lateral_scale = depth_mm / LEG_REFERENCE_DEPTH_MM;
    let vertical_scale = leg_length_mm / LEG_REFERENCE_LENGTH_MM;

    let cap_half = template.cap_bounds().width() / 2.0;
    let column_height = template.column_bounds().height();

    LegPartLayout {
        lateral_scale,
        vertical_scale,
        cap_shift: cap_half * lateral_scale - cap_half,
        column_drop: column_height * vertical_scale - column_height,
        cap_half_span: cap_half * lateral_scale,
    }
}

/// Four corner placements for the support assembly
///
/// With a leg layout available, each support drops to the bottom of the
/// rescaled leg column and sits flush against the end of the leg's
/// width-spanning cap. Before the leg template has loaded, the corners
/// fall back to a fixed inset from the tabletop edge.
pub fn compute_support_transforms(
    width_mm: f32,
    depth_mm: f32,
    layout: Option<&LegPartLayout>,
) -> [Transform; 4] {
    let lateral = width_mm / (2.0 * MM_TO_UNITS) - LEG_MARGIN;
    let (y, forward) = match layout {
        Some(layout) => (SUPPORT_BASE_Y - layout.column_drop, layout.cap_half_span),
        None => (
            SUPPORT_BASE_Y,
            depth_mm / (2.0 * MM_TO_UNITS) - SUPPORT_CORNER_MARGIN,
        ),
    };
    [
        Transform::from_position(Vec3::new(lateral, y, forward)),
        Transform::from_position(Vec3::new(-lateral, y, forward)),
        Transform::from_position(Vec3::new(lateral, y, -forward)),
        Transform::from_position(Vec3::new(-lateral, y, -forward)),
    ]
}

/// Box mesh centered at the origin: 24 vertices, 36 indices
fn box_mesh(width: f32, height: f32, depth: f32) -> MeshData {
    let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);

    // One quad per face so normals and UVs stay per-face
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // +X
        ([1.0, 0.0, 0.0], [[hw, -hh, -hd], [hw, hh, -hd], [hw, hh, hd], [hw, -hh, hd]]),
        // -X
        ([-1.0, 0.0, 0.0], [[-hw, -hh, hd], [-hw, hh, hd], [-hw, hh, -hd], [-hw, -hh, -hd]]),
        // +Y
        ([0.0, 1.0, 0.0], [[-hw, hh, hd], [hw, hh, hd], [hw, hh, -hd], [-hw, hh, -hd]]),
        // -Y
        ([0.0, -1.0, 0.0], [[-hw, -hh, -hd], [hw, -hh, -hd], [hw, -hh, hd], [-hw, -hh, hd]]),
        // +Z
        ([0.0, 0.0, 1.0], [[-hw, -hh, hd], [hw, -hh, hd], [hw, hh, hd], [-hw, hh, hd]]),
        // -Z
        ([0.0, 0.0, -1.0], [[hw, -hh, -hd], [-hw, -hh, -hd], [-hw, hh, -hd], [hw, hh, -hd]]),
    ];

    let mut mesh = MeshData::default();
    for (face, (normal, corners)) in faces.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let base = (face * 4) as u32;
        mesh.positions.extend_from_slice(corners);
        mesh.normals.extend(std::iter::repeat(*normal).take(4));
        mesh.tex_coords
            .extend_from_slice(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}
