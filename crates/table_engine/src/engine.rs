//! Engine facade
//!
//! Ties the asset server, the table scene, the frame pacer, and a
//! render backend into one frame loop. Parameter setters are
//! fire-and-forget: they queue whatever loads the change needs and the
//! scene catches up as [`TableEngine::tick`] pumps completions.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::assets::progress::ProgressListener;
use crate::assets::{AssetServer, AssetSource, ProgressTracker};
use crate::render::{Frame, FramePacer, RenderBackend, RenderError};
use crate::scene::camera::{CameraRig, VIEWPORT_BREAKPOINT};
use crate::scene::parameters::SceneParameters;
use crate::scene::table_scene::{SceneError, ScenePhase, TableScene};

/// Load budget per frame, keeps a burst of requests from stalling a tick
const MAX_LOADS_PER_TICK: usize = 4;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// The scene rejected an update
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The backend failed to draw
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// The configurator engine
pub struct TableEngine<B: RenderBackend> {
    backend: B,
    server: AssetServer,
    scene: TableScene,
    pacer: FramePacer,
    progress: Rc<RefCell<ProgressTracker>>,
    viewport: (u32, u32),
    finalized: bool,
}

impl<B: RenderBackend> TableEngine<B> {
    /// Build the engine and queue the initial asset loads
    pub fn new(backend: B, source: Box<dyn AssetSource>, params: SceneParameters) -> Self {
        let progress = Rc::new(RefCell::new(ProgressTracker::new()));
        let sink = Rc::clone(&progress);

        let mut server = AssetServer::new(source);
        server.set_progress_callback(Box::new(move |loaded, requested| {
            sink.borrow_mut().report_model_loads(loaded, requested);
        }));

        let viewport = backend.viewport();
        let scene = TableScene::new(params, &mut server, viewport.0, viewport.1);

        Self {
            backend,
            server,
            scene,
            pacer: FramePacer::new(),
            progress,
            viewport,
            finalized: false,
        }
    }

    /// Register the listener for aggregated load progress
    pub fn set_progress_listener(&mut self, listener: ProgressListener) {
        self.progress.borrow_mut().set_listener(listener);
    }

    /// Update the tabletop dimensions in millimeters
    pub fn set_table_size(&mut self, width_mm: f32, depth_mm: f32) -> Result<(), EngineError> {
        let mut next = self.scene.parameters().clone();
        next.dimensions.width = width_mm;
        next.dimensions.depth = depth_mm;
        self.scene.apply(&mut self.server, next)?;
        Ok(())
    }

    /// Update the leg length in millimeters
    pub fn set_leg_length(&mut self, leg_length_mm: f32) -> Result<(), EngineError> {
        let mut next = self.scene.parameters().clone();
        next.leg_length = leg_length_mm;
        self.scene.apply(&mut self.server, next)?;
        Ok(())
    }

    /// Swap the tabletop material
    pub fn set_material(&mut self, path: &str) -> Result<(), EngineError> {
        let mut next = self.scene.parameters().clone();
        next.material_path = path.to_string();
        self.scene.apply(&mut self.server, next)?;
        Ok(())
    }

    /// Swap the support variant
    pub fn set_supports(&mut self, path: &str) -> Result<(), EngineError> {
        let mut next = self.scene.parameters().clone();
        next.supports_path = path.to_string();
        self.scene.apply(&mut self.server, next)?;
        Ok(())
    }

    /// Camera rig for orbit/pan/zoom input
    pub fn camera_mut(&mut self) -> &mut CameraRig {
        self.scene.camera_mut()
    }

    /// The scene controller
    pub fn scene(&self) -> &TableScene {
        &self.scene
    }

    /// Whether every queued load has completed
    pub fn is_idle(&self) -> bool {
        self.server.is_idle()
    }

    /// Run one frame: pump loads, animate, and draw if due
    pub fn tick(&mut self) -> Result<(), EngineError> {
        for completion in self.server.pump(MAX_LOADS_PER_TICK) {
            self.scene.on_model_loaded(&self.server, completion);
        }

        if !self.finalized && self.scene.phase() == ScenePhase::Ready && self.server.is_idle() {
            self.progress.borrow_mut().finalize();
            self.finalized = true;
        }

        let viewport = self.backend.viewport();
        if viewport != self.viewport {
            self.viewport = viewport;
            self.scene.on_viewport_change(viewport.0, viewport.1);
        }

        let wide = viewport.0 > VIEWPORT_BREAKPOINT;
        let (delta, draw) = self.pacer.tick(wide);
        if !draw {
            // Skipped frames drop their scene update along with the draw
            return Ok(());
        }
        self.scene.animate(delta);

        if self.scene.phase() != ScenePhase::Disposed {
            let items = self.scene.graph().draw_list();
            let frame = Frame {
                view: self.scene.camera().view_matrix(),
                projection: self.scene.camera().projection_matrix(),
                items: &items,
                lights: self.scene.graph().lights(),
            };
            self.backend.draw(&frame)?;
        }
        Ok(())
    }

    /// Release the scene; later ticks become no-ops and setters fail
    pub fn dispose(&mut self) {
        self.scene.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::assets::test_support::{leg_bundle, material_bundle, support_bundle, FakeSource};
    use crate::assets::ChannelPresence;
    use crate::scene::parameters::TableDimensions;
    use crate::scene::table_scene::LEG_MODEL_PATH;

    struct RecordingBackend {
        viewport: (u32, u32),
        frames: Rc<RefCell<Vec<usize>>>,
    }

    impl RenderBackend for RecordingBackend {
        fn viewport(&self) -> (u32, u32) {
            self.viewport
        }

        fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
            self.frames.borrow_mut().push(frame.items.len());
            Ok(())
        }
    }

    fn source() -> Box<FakeSource> {
        let mut source = FakeSource::new();
        source.insert(LEG_MODEL_PATH, leg_bundle(0.24, 0.4));
        source.insert("/models/prop_01.glb", support_bundle());
        source.insert("/models/prop_02.glb", support_bundle());
        source.insert(
            "/materials/top_ashwood_mat.glb",
            material_bundle(ChannelPresence {
                color: true,
                metalness: false,
                roughness: false,
                normal: true,
            }),
        );
        Box::new(source)
    }

    fn params() -> SceneParameters {
        SceneParameters {
            dimensions: TableDimensions::new(1800.0, 600.0),
            leg_length: 700.0,
            material_path: "/materials/top_ashwood_mat.glb".to_string(),
            supports_path: "/models/prop_01.glb".to_string(),
        }
    }

    fn engine() -> (TableEngine<RecordingBackend>, Rc<RefCell<Vec<usize>>>) {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let backend = RecordingBackend {
            viewport: (1920, 1080),
            frames: Rc::clone(&frames),
        };
        (TableEngine::new(backend, source(), params()), frames)
    }

    #[test]
    fn test_ticks_drive_scene_to_ready_and_progress_to_100() {
        let (mut engine, frames) = engine();
        let reported: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reported);
        engine.set_progress_listener(Box::new(move |pct| sink.borrow_mut().push(pct)));

        for _ in 0..4 {
            engine.tick().unwrap();
        }

        assert_eq!(engine.scene().phase(), ScenePhase::Ready);
        assert!(engine.is_idle());
        assert_eq!(*reported.borrow().last().unwrap(), 100);

        // Tabletop + 16 leg parts + 4 supports
        assert_eq!(*frames.borrow().last().unwrap(), 21);
    }

    #[test]
    fn test_setters_queue_loads_processed_by_later_ticks() {
        let (mut engine, _frames) = engine();
        for _ in 0..4 {
            engine.tick().unwrap();
        }

        engine.set_supports("/models/prop_02.glb").unwrap();
        assert!(!engine.is_idle());
        engine.tick().unwrap();
        assert!(engine.is_idle());
        assert_eq!(engine.scene().parameters().supports_path, "/models/prop_02.glb");
    }

    #[test]
    fn test_size_setter_clamps_and_applies() {
        let (mut engine, _frames) = engine();
        engine.set_table_size(9999.0, 100.0).unwrap();
        let dims = engine.scene().parameters().dimensions;
        assert_eq!(dims.width, 2400.0);
        assert_eq!(dims.depth, 300.0);
    }

    #[test]
    fn test_disposed_engine_rejects_setters_but_ticks() {
        let (mut engine, frames) = engine();
        engine.tick().unwrap();
        engine.dispose();

        assert!(matches!(
            engine.set_leg_length(800.0),
            Err(EngineError::Scene(SceneError::Disposed))
        ));

        let drawn = frames.borrow().len();
        engine.tick().unwrap();
        assert_eq!(frames.borrow().len(), drawn);
    }
}
