//! Table configurator demo application
//!
//! Drives the engine through a scripted configuration session against a
//! console backend, exercising the full catalog of finishes, supports,
//! and dimensions defined in `configurator.toml`.

use std::path::Path;

use table_engine::assets::GltfSource;
use table_engine::render::{Frame, RenderBackend, RenderError};
use table_engine::{EngineError, TableEngine};
use thiserror::Error;

mod config;

use config::{AppConfig, ConfigError};

/// Frame budget for draining one batch of asset loads
const SETTLE_TICKS: usize = 120;

/// Top-level application errors
#[derive(Error, Debug)]
enum AppError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The engine rejected an update or failed to draw
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Backend that reports draw statistics instead of rendering
struct ConsoleBackend {
    viewport: (u32, u32),
    frames_drawn: u64,
}

impl ConsoleBackend {
    fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: (width, height),
            frames_drawn: 0,
        }
    }
}

impl RenderBackend for ConsoleBackend {
    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        self.frames_drawn += 1;
        if self.frames_drawn % 60 == 1 {
            log::debug!(
                "frame {}: {} draw items, {} lights",
                self.frames_drawn,
                frame.items.len(),
                frame.lights.len()
            );
        }
        Ok(())
    }
}

fn main() {
    table_engine::foundation::logging::init();
    if let Err(err) = run() {
        log::error!("configurator session failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::load(Path::new("configurator.toml"))?;
    log::info!(
        "starting configurator: {} materials, {} support variants",
        config.catalog.materials.len(),
        config.catalog.supports.len()
    );

    let backend = ConsoleBackend::new(config.viewport.width, config.viewport.height);
    let source = Box::new(GltfSource::new(config.assets.root.clone()));
    let mut engine = TableEngine::new(backend, source, config.initial_parameters());
    engine.set_progress_listener(Box::new(|pct| log::info!("load progress {pct}%")));

    settle(&mut engine)?;
    log::info!("initial scene settled, phase {:?}", engine.scene().phase());

    // Walk the finish catalog; failed bundles log and keep the previous
    // finish, so a partial asset set still completes the session
    for material in &config.catalog.materials {
        log::info!("selecting material {material}");
        engine.set_material(material)?;
        settle(&mut engine)?;
    }

    for supports in &config.catalog.supports {
        log::info!("selecting supports {supports}");
        engine.set_supports(supports)?;
        settle(&mut engine)?;
    }

    log::info!("sweeping dimensions");
    for (width, depth) in [(1200.0, 300.0), (1800.0, 600.0), (2400.0, 900.0)] {
        engine.set_table_size(width, depth)?;
        settle(&mut engine)?;
    }
    engine.set_leg_length(1200.0)?;
    settle(&mut engine)?;

    log::info!("orbiting the camera");
    engine.camera_mut().rotate(1.2, 0.2);
    engine.camera_mut().zoom(-0.4);
    engine.camera_mut().pan(0.3, -0.3);
    settle(&mut engine)?;

    engine.dispose();
    engine.tick()?;
    log::info!("session complete");
    Ok(())
}

/// Tick until every queued load has landed
fn settle(engine: &mut TableEngine<ConsoleBackend>) -> Result<(), AppError> {
    for _ in 0..SETTLE_TICKS {
        engine.tick()?;
        if engine.is_idle() {
            return Ok(());
        }
    }
    log::warn!("loads still pending after {SETTLE_TICKS} ticks");
    Ok(())
}
