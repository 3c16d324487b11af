//! # Table Engine
//!
//! A parametric scene engine for an interactive table configurator.
//!
//! ## Features
//!
//! - **Parametric Geometry**: Tabletop, legs, and supports derived from
//!   millimeter dimensions
//! - **Streaming Assets**: Cooperative glTF loading with stale-load
//!   supersession
//! - **Material Catalog**: Cached tabletop finishes with
//!   density-preserving texture tiling
//! - **Orbit Camera**: Damped orbit/pan/zoom with responsive breakpoints
//! - **Backend Seam**: Renderer-agnostic frame output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use table_engine::prelude::*;
//!
//! struct NullBackend;
//!
//! impl RenderBackend for NullBackend {
//!     fn viewport(&self) -> (u32, u32) {
//!         (1920, 1080)
//!     }
//!
//!     fn draw(&mut self, _frame: &Frame<'_>) -> Result<(), RenderError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let params = SceneParameters {
//!         dimensions: TableDimensions::new(1800.0, 600.0),
//!         leg_length: 700.0,
//!         material_path: "/materials/top_ashwood_mat.glb".to_string(),
//!         supports_path: "/models/prop_01.glb".to_string(),
//!     };
//!     let source = Box::new(GltfSource::new("assets"));
//!     let mut engine = TableEngine::new(NullBackend, source, params);
//!     engine.tick()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod foundation;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{EngineError, TableEngine};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, AssetServer, AssetSource, GltfSource, ProgressTracker},
        foundation::{
            math::{Mat4, Transform, Vec2, Vec3},
            time::Timer,
        },
        render::{Frame, FramePacer, RenderBackend, RenderError},
        scene::{
            CameraRig, SceneError, SceneGraph, SceneParameters, ScenePhase, TableDimensions,
            TableScene,
        },
        EngineError, TableEngine,
    };
}
