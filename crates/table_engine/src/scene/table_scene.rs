//! Table scene controller
//!
//! Owns the scene graph, camera rig, and the applied parameter set, and
//! turns parameter updates into the minimal set of rebuilds. Model and
//! material loads arrive asynchronously through the asset server;
//! completions whose request token has been superseded are discarded so
//! the scene always reflects the newest applied parameters.

use thiserror::Error;

use crate::assets::{
    AssetError, AssetServer, LoadCompletion, MaterialCache, MaterialSlot, ModelBundle,
    ResourceClass,
};
use crate::foundation::math::{Transform, Vec3};
use crate::scene::camera::CameraRig;
use crate::scene::geometry::{
    build_tabletop_geometry, compute_leg_part_layout, compute_leg_transforms,
    compute_support_transforms, TABLETOP_HEIGHT, TABLETOP_Y,
};
use crate::scene::graph::{
    GeometryKey, Material, MaterialKey, MeshAttachment, Node, NodeKey, SceneGraph,
};
use crate::scene::parameters::{RebuildFlags, SceneParameters};
use crate::scene::parts::{LegAssembly, LegTemplate, SupportAssembly};
use crate::scene::texture::{apply_to_material, compute_texture_transform};

/// Path of the leg-assembly template model
pub const LEG_MODEL_PATH: &str = "/models/legCustom.glb";

/// Placeholder tabletop color shown until the first material lands
const PLACEHOLDER_COLOR: [f32; 4] = [0.78, 0.698, 0.6, 1.0];

/// Lifecycle phase of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePhase {
    /// Constructed, leg template not yet loaded
    Initializing,
    /// Leg template installed, fully interactive
    Ready,
    /// Disposed, rejects further updates
    Disposed,
}

/// Scene controller errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// The scene has been disposed and rejects updates
    #[error("scene has been disposed")]
    Disposed,

    /// An asset failure surfaced through the controller
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// The parametric table scene
pub struct TableScene {
    graph: SceneGraph,
    camera: CameraRig,
    params: SceneParameters,
    phase: ScenePhase,
    tabletop: NodeKey,
    tabletop_geometry: GeometryKey,
    tabletop_material: MaterialKey,
    legs: Option<LegAssembly>,
    supports: Option<SupportAssembly>,
    material_cache: MaterialCache,
}

impl TableScene {
    /// Build the initial scene and queue the initial asset loads
    ///
    /// The tabletop appears immediately with a placeholder color; legs,
    /// supports, and the first material stream in as the server pumps.
    pub fn new(
        params: SceneParameters,
        server: &mut AssetServer,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Self {
        let params = params.clamped();
        let camera = CameraRig::new(viewport_width, viewport_height);

        let mut graph = SceneGraph::new();
        graph.root_offset_y = camera.scene_offset_y;
        install_light_rig(&mut graph);

        let geometry = build_tabletop_geometry(
            params.dimensions.width,
            params.dimensions.depth,
            TABLETOP_HEIGHT,
        );
        let tabletop_geometry = graph.add_geometry(geometry);
        let tabletop_material = graph.add_material(Material::solid_color(PLACEHOLDER_COLOR));
        let mut node = Node::group(Transform::from_position(Vec3::new(0.0, TABLETOP_Y, 0.0)));
        node.name = Some("tabletop".to_string());
        node.mesh = Some(MeshAttachment {
            geometry: tabletop_geometry,
            material: tabletop_material,
        });
        let tabletop = graph.add_node(node);

        let mut scene = Self {
            graph,
            camera,
            params,
            phase: ScenePhase::Initializing,
            tabletop,
            tabletop_geometry,
            tabletop_material,
            legs: None,
            supports: None,
            material_cache: MaterialCache::new(),
        };

        server.request(ResourceClass::Legs, LEG_MODEL_PATH);
        scene.request_supports(server);
        scene.request_material(server);
        scene
    }

    /// Apply a new parameter set
    ///
    /// Values are clamped into their supported ranges, diffed against
    /// the applied set, and only the invalidated subsystems rebuild.
    pub fn apply(
        &mut self,
        server: &mut AssetServer,
        next: SceneParameters,
    ) -> Result<(), SceneError> {
        if self.phase == ScenePhase::Disposed {
            return Err(SceneError::Disposed);
        }
        let next = next.clamped();
        let flags = next.diff(&self.params);
        self.params = next;

        if flags.contains(RebuildFlags::SIZE) {
            self.update_table_size();
        }
        if flags.contains(RebuildFlags::MATERIAL) {
            self.request_material(server);
        }
        if flags.contains(RebuildFlags::SUPPORTS) {
            if let Some(old) = self.supports.take() {
                old.teardown(&mut self.graph);
            }
            self.request_supports(server);
        }
        Ok(())
    }

    /// Hand a finished load to the scene
    ///
    /// Stale completions are discarded; failed loads are logged and the
    /// previous state kept.
    pub fn on_model_loaded(&mut self, server: &AssetServer, completion: LoadCompletion) {
        if self.phase == ScenePhase::Disposed {
            return;
        }
        let LoadCompletion { token, path, result } = completion;

        let bundle = match result {
            Ok(bundle) => bundle,
            Err(err) => {
                log::error!("load of {path} failed, keeping previous state: {err}");
                if token.class() == ResourceClass::Material {
                    self.material_cache.clear_pending(&path);
                }
                return;
            }
        };

        // Stale material bundles still populate the cache below; stale
        // model bundles have nothing to contribute
        if !server.is_current(token) && token.class() != ResourceClass::Material {
            log::debug!("discarding stale {:?} load for {path}", token.class());
            return;
        }

        match token.class() {
            ResourceClass::Legs => match LegTemplate::from_bundle(&bundle, &mut self.graph, &path) {
                Ok(template) => {
                    self.legs = Some(LegAssembly::instantiate(template, &mut self.graph));
                    self.refresh_placements();
                    if self.phase == ScenePhase::Initializing {
                        self.phase = ScenePhase::Ready;
                        log::info!("leg template installed, scene ready");
                    }
                }
                Err(err) => log::error!("leg model {path} rejected: {err}"),
            },
            ResourceClass::Supports => {
                if let Some(old) = self.supports.take() {
                    old.teardown(&mut self.graph);
                }
                self.supports = Some(SupportAssembly::instantiate(&bundle, &mut self.graph));
                self.refresh_placements();
            }
            ResourceClass::Material => self.on_material_loaded(&path, &bundle),
        }
    }

    /// Advance the camera rig and keep the scene offset in sync
    pub fn animate(&mut self, delta_time: f32) {
        self.camera.update(delta_time);
        self.graph.root_offset_y = self.camera.scene_offset_y;
    }

    /// React to a viewport resize
    pub fn on_viewport_change(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        self.graph.root_offset_y = self.camera.scene_offset_y;
    }

    /// Release every scene resource
    ///
    /// Safe to call more than once; only the first call releases.
    pub fn dispose(&mut self) {
        if self.phase == ScenePhase::Disposed {
            return;
        }
        if let Some(supports) = self.supports.take() {
            supports.teardown(&mut self.graph);
        }
        self.legs = None;
        self.graph.clear();
        self.phase = ScenePhase::Disposed;
        log::info!("scene disposed");
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// The applied parameter set
    pub fn parameters(&self) -> &SceneParameters {
        &self.params
    }

    /// The scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The camera rig
    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    /// Mutable camera rig for orbit/pan/zoom input
    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    fn request_supports(&mut self, server: &mut AssetServer) {
        server.request(ResourceClass::Supports, &self.params.supports_path);
    }

    fn request_material(&mut self, server: &mut AssetServer) {
        let path = self.params.material_path.clone();
        match self.material_cache.loaded_key(&path) {
            Some(key) => self.swap_tabletop_material(key),
            None => {
                if matches!(
                    self.material_cache.get(&path),
                    Some(MaterialSlot::Pending(_))
                ) {
                    // In-flight load will resolve this path
                    return;
                }
                let token = server.request(ResourceClass::Material, &path);
                self.material_cache.mark_pending(&path, token);
            }
        }
    }

    fn on_material_loaded(&mut self, path: &str, bundle: &ModelBundle) {
        let Some(data) = bundle.material.as_ref() else {
            log::error!(
                "{}",
                AssetError::MissingMaterial { path: path.into() }
            );
            self.material_cache.clear_pending(path);
            return;
        };
        let key = self.graph.add_material(Material::from_data(data));
        self.material_cache.insert_loaded(path, key);
        // Path identity decides application: the applied parameters may
        // have re-selected this path while its load was in flight, so
        // request-token freshness alone would wrongly discard it
        if path == self.params.material_path {
            self.swap_tabletop_material(key);
        } else {
            log::debug!("material {path} cached without applying (superseded)");
        }
    }

    fn swap_tabletop_material(&mut self, key: MaterialKey) {
        let old = self.tabletop_material;
        if old == key {
            return;
        }
        self.tabletop_material = key;
        if let Some(mesh) = self
            .graph
            .node_mut(self.tabletop)
            .and_then(|node| node.mesh.as_mut())
        {
            mesh.material = key;
        }
        self.refresh_tabletop_texture();
        // The placeholder and any non-cached material die here; cached
        // materials stay alive for future swaps
        if !self.material_cache.owns_key(old) {
            self.graph.dispose_material(old);
        }
    }

    fn update_table_size(&mut self) {
        let dims = self.params.dimensions;
        let geometry = build_tabletop_geometry(dims.width, dims.depth, TABLETOP_HEIGHT);
        let new_key = self.graph.add_geometry(geometry);
        self.graph.dispose_geometry(self.tabletop_geometry);
        self.tabletop_geometry = new_key;
        if let Some(mesh) = self
            .graph
            .node_mut(self.tabletop)
            .and_then(|node| node.mesh.as_mut())
        {
            mesh.geometry = new_key;
        }
        self.refresh_tabletop_texture();
        self.refresh_placements();
    }

    /// Re-derive texture tiling from the applied dimensions
    fn refresh_tabletop_texture(&mut self) {
        let dims = self.params.dimensions;
        let transform = compute_texture_transform(dims.width, dims.depth);
        if let Some(material) = self.graph.material_mut(self.tabletop_material) {
            apply_to_material(material, &transform);
        }
    }

    /// Re-place legs and supports from the applied parameters
    fn refresh_placements(&mut self) {
        let dims = self.params.dimensions;
        let placements = compute_leg_transforms(dims.width);
        let layout = self
            .legs
            .as_ref()
            .map(|legs| compute_leg_part_layout(dims.depth, self.params.leg_length, &legs.template));

        if let (Some(legs), Some(layout)) = (&self.legs, layout.as_ref()) {
            legs.apply_layout(&mut self.graph, &placements, layout);
        }
        if let Some(supports) = &self.supports {
            let transforms = compute_support_transforms(dims.width, dims.depth, layout.as_ref());
            supports.set_transforms(&mut self.graph, &transforms);
        }
    }
}

/// Five directional lights: four from above the corners, one from below
fn install_light_rig(graph: &mut SceneGraph) {
    const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
    for position in [
        Vec3::new(5.0, 5.0, 7.5),
        Vec3::new(-5.0, 5.0, 7.5),
        Vec3::new(5.0, 5.0, -7.5),
        Vec3::new(-5.0, 5.0, -7.5),
        Vec3::new(5.0, -5.0, -7.5),
    ] {
        graph.add_directional_light(position, 0.5, WHITE);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use approx::assert_relative_eq;

    use super::*;
    use crate::assets::test_support::{leg_bundle, material_bundle, support_bundle, FakeSource};
    use crate::assets::ChannelPresence;
    use crate::scene::geometry::{LEG_MARGIN, SUPPORT_BASE_Y};
    use crate::scene::parameters::TableDimensions;
    use crate::scene::parts::LegPart;

    const ASHWOOD: &str = "/materials/top_ashwood_mat.glb";
    const WALNUT: &str = "/materials/top_walnut_mat.glb";

    fn params() -> SceneParameters {
        SceneParameters {
            dimensions: TableDimensions::new(1200.0, 600.0),
            leg_length: 500.0,
            material_path: ASHWOOD.to_string(),
            supports_path: "/models/prop_01.glb".to_string(),
        }
    }

    fn server_with_counter() -> (AssetServer, Rc<Cell<usize>>) {
        let mut source = FakeSource::new();
        source.insert(LEG_MODEL_PATH, leg_bundle(0.24, 0.4));
        source.insert("/models/prop_01.glb", support_bundle());
        source.insert("/models/prop_02.glb", support_bundle());
        let textured = ChannelPresence {
            color: true,
            metalness: true,
            roughness: true,
            normal: true,
        };
        source.insert(ASHWOOD, material_bundle(textured));
        source.insert(WALNUT, material_bundle(textured));
        let fetches = source.fetch_counter();
        (AssetServer::new(Box::new(source)), fetches)
    }

    fn server() -> AssetServer {
        server_with_counter().0
    }

    fn pump_all(scene: &mut TableScene, server: &mut AssetServer) {
        loop {
            let completions = server.pump(usize::MAX);
            if completions.is_empty() {
                break;
            }
            for completion in completions {
                scene.on_model_loaded(server, completion);
            }
        }
    }

    fn ready_scene() -> (TableScene, AssetServer) {
        let mut server = server();
        let mut scene = TableScene::new(params(), &mut server, 1920, 1080);
        pump_all(&mut scene, &mut server);
        (scene, server)
    }

    #[test]
    fn test_construction_shows_placeholder_and_queues_loads() {
        let mut server = server();
        let scene = TableScene::new(params(), &mut server, 1920, 1080);

        assert_eq!(scene.phase(), ScenePhase::Initializing);
        assert_eq!(server.pending_count(), 3);
        let material = scene.graph.material(scene.tabletop_material).unwrap();
        assert_eq!(material.base_color, PLACEHOLDER_COLOR);
        let bounds = &scene.graph.geometry(scene.tabletop_geometry).unwrap().bounds;
        assert_relative_eq!(bounds.width(), 1.2);
        assert_relative_eq!(bounds.depth(), 0.6);
        assert_eq!(scene.graph.lights().len(), 5);
    }

    #[test]
    fn test_loads_land_and_scene_becomes_ready() {
        let (scene, server) = ready_scene();

        assert_eq!(scene.phase(), ScenePhase::Ready);
        assert!(server.is_idle());

        let legs = scene.legs.as_ref().unwrap();
        let left = scene.graph.node(legs.instances[0].root).unwrap();
        assert_relative_eq!(
            left.transform.position.x,
            1200.0 / 2000.0 - LEG_MARGIN,
            epsilon = 1e-6
        );

        // Supports were repositioned from the leg layout: depth 600 over
        // the 300 reference doubles the 0.12 cap half-width
        let supports = scene.supports.as_ref().unwrap();
        let root = scene.graph.node(supports.roots()[0]).unwrap();
        assert_relative_eq!(root.transform.position.y, SUPPORT_BASE_Y, epsilon = 1e-6);
        assert_relative_eq!(root.transform.position.z.abs(), 0.24, epsilon = 1e-6);

        // First material replaced the placeholder
        let material = scene.graph.material(scene.tabletop_material).unwrap();
        assert_eq!(material.channel_count(), 4);
    }

    #[test]
    fn test_updates_piled_up_before_loads_resolve_to_final_values() {
        let mut server = server();
        let mut scene = TableScene::new(params(), &mut server, 1920, 1080);

        for (width, depth, leg) in [(1600.0, 700.0, 800.0), (2000.0, 800.0, 1000.0), (2400.0, 900.0, 1200.0)] {
            let mut next = scene.parameters().clone();
            next.dimensions = TableDimensions::new(width, depth);
            next.leg_length = leg;
            scene.apply(&mut server, next).unwrap();
        }
        pump_all(&mut scene, &mut server);

        let bounds = &scene.graph.geometry(scene.tabletop_geometry).unwrap().bounds;
        assert_relative_eq!(bounds.width(), 2.4);
        assert_relative_eq!(bounds.depth(), 0.9);

        let legs = scene.legs.as_ref().unwrap();
        let left_column = scene
            .graph
            .node(legs.instances[0].part_node(LegPart::Left).unwrap())
            .unwrap();
        assert_relative_eq!(left_column.transform.scale.y, 1200.0 / 500.0);
    }

    #[test]
    fn test_stale_support_load_is_discarded() {
        let (mut scene, mut server) = ready_scene();
        let nodes_before = scene.graph.node_count();

        let mut next = scene.parameters().clone();
        next.supports_path = "/models/prop_02.glb".to_string();
        scene.apply(&mut server, next).unwrap();

        let mut next = scene.parameters().clone();
        next.supports_path = "/models/prop_01.glb".to_string();
        scene.apply(&mut server, next).unwrap();

        pump_all(&mut scene, &mut server);

        // Exactly one support assembly alive despite two in-flight loads
        assert_eq!(scene.graph.node_count(), nodes_before);
        assert!(scene.supports.is_some());
    }

    #[test]
    fn test_material_swap_disposes_placeholder_but_keeps_cache() {
        let (mut scene, mut server) = ready_scene();
        let ashwood = scene.material_cache.loaded_key(ASHWOOD).unwrap();
        assert_eq!(scene.tabletop_material, ashwood);

        let mut next = scene.parameters().clone();
        next.material_path = WALNUT.to_string();
        scene.apply(&mut server, next).unwrap();
        pump_all(&mut scene, &mut server);

        let walnut = scene.material_cache.loaded_key(WALNUT).unwrap();
        assert_eq!(scene.tabletop_material, walnut);
        // Ashwood stays cached for a later swap back
        assert!(scene.graph.material(ashwood).is_some());
    }

    #[test]
    fn test_cached_material_applies_without_a_new_request() {
        let (mut scene, mut server) = ready_scene();

        let mut next = scene.parameters().clone();
        next.material_path = WALNUT.to_string();
        scene.apply(&mut server, next).unwrap();
        pump_all(&mut scene, &mut server);

        let mut next = scene.parameters().clone();
        next.material_path = ASHWOOD.to_string();
        scene.apply(&mut server, next).unwrap();

        assert_eq!(server.pending_count(), 0);
        assert_eq!(
            scene.tabletop_material,
            scene.material_cache.loaded_key(ASHWOOD).unwrap()
        );
    }

    #[test]
    fn test_superseded_material_is_cached_but_not_applied() {
        let (mut scene, mut server) = ready_scene();

        let mut next = scene.parameters().clone();
        next.material_path = WALNUT.to_string();
        scene.apply(&mut server, next).unwrap();

        // Swap back before the walnut load lands
        let mut next = scene.parameters().clone();
        next.material_path = ASHWOOD.to_string();
        scene.apply(&mut server, next).unwrap();
        pump_all(&mut scene, &mut server);

        assert!(scene.material_cache.loaded_key(WALNUT).is_some());
        assert_eq!(
            scene.tabletop_material,
            scene.material_cache.loaded_key(ASHWOOD).unwrap()
        );
    }

    #[test]
    fn test_material_reselected_while_in_flight_still_applies() {
        let mut server = server();
        let mut scene = TableScene::new(params(), &mut server, 1920, 1080);

        // The initial finish is still in flight; switch away and back
        // before anything lands
        let mut next = scene.parameters().clone();
        next.material_path = WALNUT.to_string();
        scene.apply(&mut server, next).unwrap();

        let mut next = scene.parameters().clone();
        next.material_path = ASHWOOD.to_string();
        scene.apply(&mut server, next).unwrap();

        pump_all(&mut scene, &mut server);

        assert_eq!(scene.parameters().material_path, ASHWOOD);
        assert_eq!(
            scene.tabletop_material,
            scene.material_cache.loaded_key(ASHWOOD).unwrap()
        );
    }

    #[test]
    fn test_duplicate_material_selection_fetches_once() {
        let (mut server, fetches) = server_with_counter();
        let mut scene = TableScene::new(params(), &mut server, 1920, 1080);
        pump_all(&mut scene, &mut server);
        let baseline = fetches.get();

        let mut next = scene.parameters().clone();
        next.material_path = WALNUT.to_string();
        scene.apply(&mut server, next).unwrap();

        // Re-select walnut while its first load is still in flight
        let mut next = scene.parameters().clone();
        next.material_path = ASHWOOD.to_string();
        scene.apply(&mut server, next).unwrap();
        let mut next = scene.parameters().clone();
        next.material_path = WALNUT.to_string();
        scene.apply(&mut server, next).unwrap();

        pump_all(&mut scene, &mut server);
        assert_eq!(fetches.get(), baseline + 1);
        assert_eq!(
            scene.tabletop_material,
            scene.material_cache.loaded_key(WALNUT).unwrap()
        );

        // Selecting it again after completion resolves from the cache
        let mut next = scene.parameters().clone();
        next.material_path = ASHWOOD.to_string();
        scene.apply(&mut server, next).unwrap();
        let mut next = scene.parameters().clone();
        next.material_path = WALNUT.to_string();
        scene.apply(&mut server, next).unwrap();
        assert_eq!(fetches.get(), baseline + 1);
    }

    #[test]
    fn test_failed_material_load_keeps_previous_state() {
        let (mut scene, mut server) = ready_scene();
        let applied = scene.tabletop_material;

        let mut next = scene.parameters().clone();
        next.material_path = "/materials/top_missing_mat.glb".to_string();
        scene.apply(&mut server, next).unwrap();
        pump_all(&mut scene, &mut server);

        assert_eq!(scene.tabletop_material, applied);
        // The failed path can be retried later
        assert!(scene.material_cache.get("/materials/top_missing_mat.glb").is_none());
    }

    #[test]
    fn test_size_update_disposes_previous_geometry() {
        let (mut scene, mut server) = ready_scene();
        let old_geometry = scene.tabletop_geometry;
        let count_before = scene.graph.geometry_count();

        let mut next = scene.parameters().clone();
        next.dimensions = TableDimensions::new(1800.0, 700.0);
        scene.apply(&mut server, next).unwrap();

        assert!(scene.graph.geometry(old_geometry).is_none());
        assert_eq!(scene.graph.geometry_count(), count_before);
    }

    #[test]
    fn test_reapplying_identical_parameters_is_a_no_op() {
        let (mut scene, mut server) = ready_scene();
        let geometry = scene.tabletop_geometry;
        let material = scene.tabletop_material;

        let same = scene.parameters().clone();
        scene.apply(&mut server, same).unwrap();

        assert_eq!(scene.tabletop_geometry, geometry);
        assert_eq!(scene.tabletop_material, material);
        assert_eq!(server.pending_count(), 0);
    }

    #[test]
    fn test_size_update_retiles_the_applied_material() {
        let (mut scene, mut server) = ready_scene();

        let mut next = scene.parameters().clone();
        next.dimensions = TableDimensions::new(2400.0, 900.0);
        scene.apply(&mut server, next).unwrap();

        let material = scene.graph.material(scene.tabletop_material).unwrap();
        let repeat = material.color_map.unwrap().repeat;
        assert_relative_eq!(repeat.x, 2.4 * 1.5, epsilon = 1e-6);
        assert_relative_eq!(repeat.y, 0.9 * 1.5, epsilon = 1e-6);
    }

    #[test]
    fn test_dispose_is_idempotent_and_rejects_updates() {
        let (mut scene, mut server) = ready_scene();

        scene.dispose();
        assert_eq!(scene.phase(), ScenePhase::Disposed);
        assert_eq!(scene.graph.node_count(), 0);
        assert_eq!(scene.graph.geometry_count(), 0);
        assert_eq!(scene.graph.material_count(), 0);

        scene.dispose();
        assert!(matches!(
            scene.apply(&mut server, params()),
            Err(SceneError::Disposed)
        ));
    }

    #[test]
    fn test_viewport_change_moves_scene_offset() {
        let (mut scene, _server) = ready_scene();
        assert_relative_eq!(scene.graph.root_offset_y, -0.1);

        scene.on_viewport_change(600, 900);
        assert_relative_eq!(scene.graph.root_offset_y, -0.25);
    }
}
