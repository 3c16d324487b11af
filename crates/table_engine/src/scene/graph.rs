//! Scene-graph arena
//!
//! Nodes, geometries, and materials live in keyed arenas. A key is the
//! only way to reach a resource, and disposal is arena removal, so a
//! released resource cannot be reached again and double-dispose is
//! structurally impossible.

use slotmap::{new_key_type, SlotMap};

use crate::assets::{ChannelPresence, MaterialData, MeshData};
use crate::foundation::math::{Aabb, Mat4, Transform, Vec2, Vec3};

new_key_type! {
    /// Stable handle to a scene node
    pub struct NodeKey;

    /// Stable handle to a geometry resource
    pub struct GeometryKey;

    /// Stable handle to a material resource
    pub struct MaterialKey;
}

/// Geometry resource: mesh data plus its local bounds
#[derive(Debug, Clone)]
pub struct Geometry {
    /// Vertex and index data
    pub mesh: MeshData,
    /// Local-space bounding box
    pub bounds: Aabb,
}

/// Per-channel texture tiling state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureState {
    /// Tiling repeat
    pub repeat: Vec2,
    /// Tiling offset
    pub offset: Vec2,
}

impl Default for TextureState {
    fn default() -> Self {
        Self {
            repeat: Vec2::new(1.0, 1.0),
            offset: Vec2::zeros(),
        }
    }
}

/// Material resource with up to four texture channels
#[derive(Debug, Clone)]
pub struct Material {
    /// Base color factor (RGBA)
    pub base_color: [f32; 4],
    /// Metallic factor
    pub metallic: f32,
    /// Roughness factor
    pub roughness: f32,
    /// Base color map
    pub color_map: Option<TextureState>,
    /// Metalness map
    pub metalness_map: Option<TextureState>,
    /// Roughness map
    pub roughness_map: Option<TextureState>,
    /// Normal map
    pub normal_map: Option<TextureState>,
    /// Whether the backend must re-upload this material
    pub needs_upload: bool,
}

impl Material {
    /// Untextured material with a flat color
    pub fn solid_color(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            metallic: 0.0,
            roughness: 1.0,
            color_map: None,
            metalness_map: None,
            roughness_map: None,
            normal_map: None,
            needs_upload: true,
        }
    }

    /// Instantiate channel state from parsed bundle data
    pub fn from_data(data: &MaterialData) -> Self {
        let channel = |present: bool| present.then(TextureState::default);
        let ChannelPresence {
            color,
            metalness,
            roughness,
            normal,
        } = data.channels;
        Self {
            base_color: data.base_color,
            metallic: data.metallic,
            roughness: data.roughness,
            color_map: channel(color),
            metalness_map: channel(metalness),
            roughness_map: channel(roughness),
            normal_map: channel(normal),
            needs_upload: true,
        }
    }

    /// Mutable iterator over the texture channels present on this material
    pub fn texture_channels_mut(&mut self) -> impl Iterator<Item = &mut TextureState> {
        [
            self.color_map.as_mut(),
            self.metalness_map.as_mut(),
            self.roughness_map.as_mut(),
            self.normal_map.as_mut(),
        ]
        .into_iter()
        .flatten()
    }

    /// Number of texture channels present
    pub fn channel_count(&self) -> usize {
        [
            self.color_map.is_some(),
            self.metalness_map.is_some(),
            self.roughness_map.is_some(),
            self.normal_map.is_some(),
        ]
        .into_iter()
        .filter(|p| *p)
        .count()
    }
}

/// Directional light
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    /// Direction the light points toward the scene from
    pub position: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Light color (RGB)
    pub color: [f32; 3],
}

/// Mesh attachment binding a node to its resources
#[derive(Debug, Clone, Copy)]
pub struct MeshAttachment {
    /// Geometry resource
    pub geometry: GeometryKey,
    /// Material resource
    pub material: MaterialKey,
}

/// One renderable or grouping node
#[derive(Debug, Clone)]
pub struct Node {
    /// Optional authored name
    pub name: Option<String>,
    /// Parent node, if any
    pub parent: Option<NodeKey>,
    /// Local transform
    pub transform: Transform,
    /// Mesh attachment for renderable nodes
    pub mesh: Option<MeshAttachment>,
}

impl Node {
    /// Empty grouping node at the given transform
    pub fn group(transform: Transform) -> Self {
        Self {
            name: None,
            parent: None,
            transform,
            mesh: None,
        }
    }
}

/// Flattened draw-list entry handed to the render backend
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    /// World transform of the node
    pub world: Mat4,
    /// Geometry to draw
    pub geometry: GeometryKey,
    /// Material to draw with
    pub material: MaterialKey,
}

/// The renderable scene: node hierarchy plus resource arenas
#[derive(Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
    geometries: SlotMap<GeometryKey, Geometry>,
    materials: SlotMap<MaterialKey, Material>,
    lights: Vec<DirectionalLight>,
    /// Vertical offset of the whole scene, breakpoint-dependent
    pub root_offset_y: f32,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node
    pub fn add_node(&mut self, node: Node) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Insert a geometry resource
    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryKey {
        self.geometries.insert(geometry)
    }

    /// Insert a material resource
    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    /// Add a directional light
    pub fn add_directional_light(&mut self, position: Vec3, intensity: f32, color: [f32; 3]) {
        self.lights.push(DirectionalLight {
            position,
            intensity,
            color,
        });
    }

    /// Read a node
    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Mutate a node
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Read a geometry resource
    pub fn geometry(&self, key: GeometryKey) -> Option<&Geometry> {
        self.geometries.get(key)
    }

    /// Read a material resource
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    /// Mutate a material resource
    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    /// Remove a node from the graph
    pub fn remove_node(&mut self, key: NodeKey) -> Option<Node> {
        self.nodes.remove(key)
    }

    /// Release a geometry resource; returns whether it was live
    pub fn dispose_geometry(&mut self, key: GeometryKey) -> bool {
        self.geometries.remove(key).is_some()
    }

    /// Release a material resource; returns whether it was live
    pub fn dispose_material(&mut self, key: MaterialKey) -> bool {
        self.materials.remove(key).is_some()
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live geometry resources
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    /// Number of live material resources
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// The directional light rig
    pub fn lights(&self) -> &[DirectionalLight] {
        &self.lights
    }

    /// World transform of a node, walking the parent chain
    pub fn world_transform(&self, key: NodeKey) -> Mat4 {
        let mut matrix = Mat4::identity();
        let mut cursor = Some(key);
        while let Some(k) = cursor {
            let Some(node) = self.nodes.get(k) else { break };
            matrix = node.transform.to_matrix() * matrix;
            cursor = node.parent;
        }
        Mat4::new_translation(&Vec3::new(0.0, self.root_offset_y, 0.0)) * matrix
    }

    /// Flatten every renderable node into a draw list
    pub fn draw_list(&self) -> Vec<DrawItem> {
        self.nodes
            .iter()
            .filter_map(|(key, node)| {
                node.mesh.map(|mesh| DrawItem {
                    world: self.world_transform(key),
                    geometry: mesh.geometry,
                    material: mesh.material,
                })
            })
            .collect()
    }

    /// Release every node and resource
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.geometries.clear();
        self.materials.clear();
        self.lights.clear();
    }
}
