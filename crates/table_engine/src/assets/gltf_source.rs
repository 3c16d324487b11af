//! Filesystem-backed glTF bundle source
//!
//! Resolves the virtual asset paths used by the configurator
//! ("/models/legCustom.glb", "/materials/top_walnut_mat.glb", ...)
//! against a root directory and parses the bundles with the `gltf`
//! crate.

use std::path::{Path, PathBuf};

use super::{
    AssetError, AssetSource, BundlePart, ChannelPresence, MaterialData, MeshData, ModelBundle,
};
use crate::foundation::math::{Aabb, Vec3};

/// Loads model bundles from a directory tree
pub struct GltfSource {
    root: PathBuf,
}

impl GltfSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a virtual asset path onto the filesystem
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl AssetSource for GltfSource {
    fn load_model(&mut self, path: &str) -> Result<ModelBundle, AssetError> {
        let file = self.resolve(path);
        if let Err(source) = std::fs::metadata(&file) {
            return Err(AssetError::Io { path: file, source });
        }

        let (document, buffers, _images) = gltf::import(&file).map_err(|e| AssetError::Parse {
            path: file.clone(),
            reason: e.to_string(),
        })?;

        let mut bundle = ModelBundle::default();
        for scene in document.scenes() {
            for node in scene.nodes() {
                collect_node(&node, &buffers, Vec3::zeros(), &mut bundle, &file)?;
            }
        }

        log::debug!(
            "loaded bundle {path}: {} part(s), material: {}",
            bundle.parts.len(),
            bundle.material.is_some()
        );
        Ok(bundle)
    }
}

fn collect_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent_translation: Vec3,
    bundle: &mut ModelBundle,
    file: &Path,
) -> Result<(), AssetError> {
    let (t, _, _) = node.transform().decomposed();
    let translation = parent_translation + Vec3::new(t[0], t[1], t[2]);

    if let Some(mesh) = node.mesh() {
        let name = node
            .name()
            .or_else(|| mesh.name())
            .unwrap_or("unnamed")
            .to_string();
        let data = read_mesh(&mesh, buffers, file)?;
        if bundle.material.is_none() {
            bundle.material = read_material(&mesh);
        }
        bundle.parts.push(BundlePart {
            name,
            translation,
            bounds: Aabb::from_points(data.positions.iter()),
            mesh: data,
        });
    }

    for child in node.children() {
        collect_node(&child, buffers, translation, bundle, file)?;
    }
    Ok(())
}

fn read_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    file: &Path,
) -> Result<MeshData, AssetError> {
    let mut data = MeshData::default();
    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions = reader.read_positions().ok_or_else(|| AssetError::Parse {
            path: file.to_path_buf(),
            reason: format!("mesh {:?} primitive has no positions", mesh.name()),
        })?;

        #[allow(clippy::cast_possible_truncation)]
        let base = data.positions.len() as u32;
        data.positions.extend(positions);
        if let Some(normals) = reader.read_normals() {
            data.normals.extend(normals);
        }
        if let Some(tex_coords) = reader.read_tex_coords(0) {
            data.tex_coords.extend(tex_coords.into_f32());
        }

        match reader.read_indices() {
            Some(indices) => data.indices.extend(indices.into_u32().map(|i| base + i)),
            // Non-indexed primitive: treat vertices as a triangle list
            None => {
                #[allow(clippy::cast_possible_truncation)]
                let count = (data.positions.len() as u32) - base;
                data.indices.extend((0..count).map(|i| base + i));
            }
        }
    }
    Ok(data)
}

fn read_material(mesh: &gltf::Mesh) -> Option<MaterialData> {
    let primitive = mesh.primitives().next()?;
    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();

    // glTF stores metalness and roughness in one combined texture; both
    // scene channels derive their presence from it.
    let metallic_roughness = pbr.metallic_roughness_texture().is_some();
    Some(MaterialData {
        base_color: pbr.base_color_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        channels: ChannelPresence {
            color: pbr.base_color_texture().is_some(),
            metalness: metallic_roughness,
            roughness: metallic_roughness,
            normal: material.normal_texture().is_some(),
        },
    })
}
