//! Leg and support assemblies
//!
//! The leg model's sub-parts are resolved once at load time into a
//! typed registry keyed by [`LegPart`], so placement code never
//! traverses the graph matching node names and a missing structural
//! part is a load error instead of a silent no-op.

use crate::assets::{AssetError, ModelBundle};
use crate::foundation::math::{Aabb, Transform, Vec3};
use crate::scene::geometry::{LegPartLayout, LegRootPlacement};
use crate::scene::graph::{
    Geometry, GeometryKey, Material, MaterialKey, MeshAttachment, Node, NodeKey, SceneGraph,
};

/// Fallback color for model bundles that carry no material
const MODEL_FALLBACK_COLOR: [f32; 4] = [0.23, 0.23, 0.24, 1.0];

/// Closed enumeration of the leg model's sub-part roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegPart {
    /// Upper width-spanning cap
    Top,
    /// Lower width-spanning cap
    Bottom,
    /// Left vertical column
    Left,
    /// Right vertical column
    Right,
    /// Decorative end cap, upper left
    LeftTop,
    /// Decorative end cap, lower left
    LeftBottom,
    /// Decorative end cap, upper right
    RightTop,
    /// Decorative end cap, lower right
    RightBottom,
    /// Circle detail on the left column
    CirclesLeft,
    /// Circle detail on the right column
    CirclesRight,
}

impl LegPart {
    /// Every part role, in registry order
    pub const ALL: [Self; 10] = [
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::LeftTop,
        Self::LeftBottom,
        Self::RightTop,
        Self::RightBottom,
        Self::CirclesLeft,
        Self::CirclesRight,
    ];

    /// Map an authored node name onto a part role
    pub fn from_node_name(name: &str) -> Option<Self> {
        match name {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "leftTop" => Some(Self::LeftTop),
            "leftBottom" => Some(Self::LeftBottom),
            "rightTop" => Some(Self::RightTop),
            "rightBottom" => Some(Self::RightBottom),
            "circlesLeft" => Some(Self::CirclesLeft),
            "circlesRight" => Some(Self::CirclesRight),
            _ => None,
        }
    }

    /// Structural parts must exist in every leg model; decorative parts
    /// may be absent
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Top | Self::Bottom | Self::Left | Self::Right)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }
}

/// Immutable per-part data resolved from the loaded template
#[derive(Debug, Clone, Copy)]
pub struct PartRecord {
    /// Shared geometry resource for this part
    pub geometry: GeometryKey,
    /// Translation of the part as authored in the bundle
    pub base_translation: Vec3,
    /// Local bounding box of the part mesh
    pub bounds: Aabb,
}

/// Typed sub-part registry built once when the leg bundle loads
#[derive(Debug)]
pub struct LegTemplate {
    records: [Option<PartRecord>; 10],
    material: MaterialKey,
}

impl LegTemplate {
    /// Resolve a bundle into the registry, installing shared resources
    /// into the graph
    ///
    /// Fails with [`AssetError::MissingPart`] when a structural part is
    /// absent; decorative parts are optional.
    pub fn from_bundle(
        bundle: &ModelBundle,
        graph: &mut SceneGraph,
        path: &str,
    ) -> Result<Self, AssetError> {
        // Validate before installing anything so a rejected bundle
        // leaves no orphan resources in the graph
        for role in LegPart::ALL {
            let present = bundle
                .parts
                .iter()
                .any(|p| LegPart::from_node_name(&p.name) == Some(role));
            if role.is_structural() && !present {
                return Err(AssetError::MissingPart {
                    path: path.into(),
                    part: format!("{role:?}"),
                });
            }
        }

        let material = match bundle.material.as_ref() {
            Some(data) => Material::from_data(data),
            None => Material::solid_color(MODEL_FALLBACK_COLOR),
        };
        let material = graph.add_material(material);

        let mut records: [Option<PartRecord>; 10] = [None; 10];
        for part in &bundle.parts {
            let Some(role) = LegPart::from_node_name(&part.name) else {
                log::debug!("leg bundle {path}: ignoring unrecognized part {:?}", part.name);
                continue;
            };
            let geometry = graph.add_geometry(Geometry {
                mesh: part.mesh.clone(),
                bounds: part.bounds,
            });
            records[role.index()] = Some(PartRecord {
                geometry,
                base_translation: part.translation,
                bounds: part.bounds,
            });
        }

        Ok(Self { records, material })
    }

    /// Record for a part role, if the model carries it
    pub fn get(&self, part: LegPart) -> Option<&PartRecord> {
        self.records[part.index()].as_ref()
    }

    /// Bounding box of the width-spanning cap
    ///
    /// Structural presence is validated at construction; a degenerate
    /// box is returned only for a registry built without validation.
    pub fn cap_bounds(&self) -> Aabb {
        self.records[LegPart::Top.index()].map_or_else(degenerate_bounds, |r| r.bounds)
    }

    /// Bounding box of the left vertical column
    pub fn column_bounds(&self) -> Aabb {
        self.records[LegPart::Left.index()].map_or_else(degenerate_bounds, |r| r.bounds)
    }

    /// Shared material of the template
    pub fn material(&self) -> MaterialKey {
        self.material
    }
}

fn degenerate_bounds() -> Aabb {
    Aabb::new(Vec3::zeros(), Vec3::zeros())
}

/// One cloned leg instance: a root node plus one node per present part
pub struct LegInstance {
    /// Root grouping node carrying the mirrored placement
    pub root: NodeKey,
    parts: [Option<NodeKey>; 10],
}

impl LegInstance {
    /// Node for a part role, if present
    pub fn part_node(&self, part: LegPart) -> Option<NodeKey> {
        self.parts[part.index()]
    }
}

/// The two mirrored leg instances plus their shared template
pub struct LegAssembly {
    /// Typed sub-part registry
    pub template: LegTemplate,
    /// Left and right instances
    pub instances: [LegInstance; 2],
}

impl LegAssembly {
    /// Clone the template into the two mirrored instances
    ///
    /// Instances are independent scene-graph nodes sharing only the
    /// template's immutable geometry resources.
    pub fn instantiate(template: LegTemplate, graph: &mut SceneGraph) -> Self {
        let instances = [(); 2].map(|()| {
            let root = graph.add_node(Node::group(Transform::identity()));
            let mut parts: [Option<NodeKey>; 10] = [None; 10];
            for role in LegPart::ALL {
                let Some(record) = template.get(role) else {
                    continue;
                };
                let mut node = Node::group(Transform::from_position(record.base_translation));
                node.name = Some(format!("{role:?}"));
                node.parent = Some(root);
                node.mesh = Some(MeshAttachment {
                    geometry: record.geometry,
                    material: template.material(),
                });
                parts[role.index()] = Some(graph.add_node(node));
            }
            LegInstance { root, parts }
        });
        Self { template, instances }
    }

    /// Re-place both instances for the given root placements and part
    /// layout
    ///
    /// Scaled parts keep their unscaled edges anchored to their
    /// structural neighbors: columns stay flush under the rescaled
    /// caps, end caps and circle details stay flush against the
    /// columns.
    pub fn apply_layout(
        &self,
        graph: &mut SceneGraph,
        placements: &[LegRootPlacement; 2],
        layout: &LegPartLayout,
    ) {
        let top_base = self
            .template
            .get(LegPart::Top)
            .map_or_else(Vec3::zeros, |r| r.base_translation);
        let bottom_base = self
            .template
            .get(LegPart::Bottom)
            .map_or_else(Vec3::zeros, |r| r.base_translation);

        for (instance, placement) in self.instances.iter().zip(placements.iter()) {
            if let Some(root) = graph.node_mut(instance.root) {
                root.transform = Transform::from_position_yaw(placement.position, placement.yaw);
            }

            for role in LegPart::ALL {
                let Some(node_key) = instance.part_node(role) else {
                    continue;
                };
                let Some(record) = self.template.get(role) else {
                    continue;
                };
                let base = record.base_translation;
                let mut transform = Transform::from_position(base);
                match role {
                    LegPart::Top | LegPart::Bottom => {
                        transform.scale = Vec3::new(layout.lateral_scale, 1.0, 1.0);
                    }
                    LegPart::Left => {
                        transform.scale = Vec3::new(1.0, layout.vertical_scale, 1.0);
                        transform.position.x = top_base.x - layout.cap_shift;
                    }
                    LegPart::Right => {
                        transform.scale = Vec3::new(1.0, layout.vertical_scale, 1.0);
                        transform.position.x = bottom_base.x + layout.cap_shift;
                    }
                    LegPart::LeftTop | LegPart::CirclesLeft => {
                        transform.position.x = top_base.x - layout.cap_shift;
                    }
                    LegPart::RightTop => {
                        transform.position.x = top_base.x + layout.cap_shift;
                    }
                    LegPart::LeftBottom => {
                        transform.position.x = bottom_base.x - layout.cap_shift;
                    }
                    LegPart::RightBottom | LegPart::CirclesRight => {
                        transform.position.x = bottom_base.x + layout.cap_shift;
                    }
                }
                // Parts hanging from the column bottom follow the
                // rescaled column down
                if matches!(
                    role,
                    LegPart::Bottom | LegPart::LeftBottom | LegPart::RightBottom
                ) {
                    transform.position.y = base.y - layout.column_drop;
                }
                if let Some(node) = graph.node_mut(node_key) {
                    node.transform = transform;
                }
            }
        }
    }
}

/// The four corner support instances
pub struct SupportAssembly {
    roots: [NodeKey; 4],
    children: Vec<NodeKey>,
    geometries: Vec<GeometryKey>,
    material: MaterialKey,
}

impl SupportAssembly {
    /// Instantiate four clones of the support bundle
    pub fn instantiate(bundle: &ModelBundle, graph: &mut SceneGraph) -> Self {
        let material = match bundle.material.as_ref() {
            Some(data) => Material::from_data(data),
            None => Material::solid_color(MODEL_FALLBACK_COLOR),
        };
        let material = graph.add_material(material);

        let geometries: Vec<GeometryKey> = bundle
            .parts
            .iter()
            .map(|part| {
                graph.add_geometry(Geometry {
                    mesh: part.mesh.clone(),
                    bounds: part.bounds,
                })
            })
            .collect();

        let mut children = Vec::with_capacity(geometries.len() * 4);
        let roots = [(); 4].map(|()| {
            let root = graph.add_node(Node::group(Transform::identity()));
            for (part, geometry) in bundle.parts.iter().zip(geometries.iter()) {
                let mut node = Node::group(Transform::from_position(part.translation));
                node.name = Some(part.name.clone());
                node.parent = Some(root);
                node.mesh = Some(MeshAttachment {
                    geometry: *geometry,
                    material,
                });
                children.push(graph.add_node(node));
            }
            root
        });

        Self {
            roots,
            children,
            geometries,
            material,
        }
    }

    /// Root node keys of the four instances
    pub fn roots(&self) -> &[NodeKey; 4] {
        &self.roots
    }

    /// Re-place the four instances
    pub fn set_transforms(&self, graph: &mut SceneGraph, transforms: &[Transform; 4]) {
        for (root, transform) in self.roots.iter().zip(transforms.iter()) {
            if let Some(node) = graph.node_mut(*root) {
                node.transform = transform.clone();
            }
        }
    }

    /// Remove every node and release the shared resources
    ///
    /// Shared geometry and material are released exactly once even
    /// though four instances referenced them.
    pub fn teardown(self, graph: &mut SceneGraph) {
        for child in self.children {
            graph.remove_node(child);
        }
        for root in self.roots {
            graph.remove_node(root);
        }
        for geometry in self.geometries {
            graph.dispose_geometry(geometry);
        }
        graph.dispose_material(self.material);
    }
}
