//! Scene layer
//!
//! The parametric table scene: graph and resource arenas, the parameter
//! model, pure geometry/placement derivation, texture policy, leg and
//! support assemblies, the orbit camera, and the controller tying them
//! together.

pub mod camera;
pub mod geometry;
pub mod graph;
pub mod parameters;
pub mod parts;
pub mod table_scene;
pub mod texture;

pub use camera::{CameraRig, OrbitBounds, DAMPING_FACTOR, VIEWPORT_BREAKPOINT};
pub use geometry::{
    build_tabletop_geometry, compute_leg_part_layout, compute_leg_transforms,
    compute_support_transforms, LegPartLayout, LegRootPlacement,
};
pub use graph::{
    DirectionalLight, DrawItem, Geometry, GeometryKey, Material, MaterialKey, MeshAttachment,
    Node, NodeKey, SceneGraph, TextureState,
};
pub use parameters::{RebuildFlags, SceneParameters, TableDimensions};
pub use parts::{LegAssembly, LegPart, LegTemplate, SupportAssembly};
pub use table_scene::{ScenePhase, SceneError, TableScene, LEG_MODEL_PATH};
pub use texture::{apply_to_material, compute_texture_transform, TextureTransform, TILING_DENSITY};
