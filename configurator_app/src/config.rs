//! Application configuration
//!
//! Loaded from `configurator.toml`. A missing file falls back to the
//! built-in defaults so the demo runs out of the box.

use std::path::Path;

use serde::Deserialize;
use table_engine::scene::{SceneParameters, TableDimensions};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file existed but could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file path
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config file path
        path: String,
        /// Parser diagnostic
        #[source]
        source: toml::de::Error,
    },
}

/// Viewport the demo pretends to run in
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Initial table parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InitialConfig {
    /// Tabletop width in millimeters
    pub width_mm: f32,
    /// Tabletop depth in millimeters
    pub depth_mm: f32,
    /// Leg length in millimeters
    pub leg_length_mm: f32,
    /// Initial tabletop material bundle path
    pub material: String,
    /// Initial support variant bundle path
    pub supports: String,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            width_mm: 1800.0,
            depth_mm: 600.0,
            leg_length_mm: 700.0,
            material: "/materials/top_ashwood_mat.glb".to_string(),
            supports: "/models/prop_01.glb".to_string(),
        }
    }
}

/// The selectable finish and support catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Tabletop material bundle paths
    pub materials: Vec<String>,
    /// Support variant bundle paths
    pub supports: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            materials: vec![
                "/materials/top_ashwood_mat.glb".to_string(),
                "/materials/top_cedar_mat.glb".to_string(),
                "/materials/top_plastic_black_mat.glb".to_string(),
                "/materials/top_plastic_white_mat.glb".to_string(),
                "/materials/top_walnut_mat.glb".to_string(),
            ],
            supports: vec![
                "/models/prop_01.glb".to_string(),
                "/models/prop_02.glb".to_string(),
            ],
        }
    }
}

/// Asset source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory the bundle paths resolve against
    pub root: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Demo viewport
    pub viewport: ViewportConfig,
    /// Initial table parameters
    pub initial: InitialConfig,
    /// Selectable catalog
    pub catalog: CatalogConfig,
    /// Asset source settings
    pub assets: AssetConfig,
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Initial scene parameters derived from the config
    pub fn initial_parameters(&self) -> SceneParameters {
        SceneParameters {
            dimensions: TableDimensions::new(self.initial.width_mm, self.initial.depth_mm),
            leg_length: self.initial.leg_length_mm,
            material_path: self.initial.material.clone(),
            supports_path: self.initial.supports.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [viewport]
            width = 800
            height = 600

            [initial]
            width_mm = 2400.0
            depth_mm = 900.0
            leg_length_mm = 1200.0
            material = "/materials/top_walnut_mat.glb"
            supports = "/models/prop_02.glb"

            [catalog]
            materials = ["/materials/top_walnut_mat.glb"]
            supports = ["/models/prop_02.glb"]

            [assets]
            root = "bundles"
            "#,
        )
        .unwrap();

        assert_eq!(config.viewport.width, 800);
        assert_eq!(config.initial.width_mm, 2400.0);
        assert_eq!(config.catalog.materials.len(), 1);
        assert_eq!(config.assets.root, "bundles");

        let params = config.initial_parameters();
        assert_eq!(params.material_path, "/materials/top_walnut_mat.glb");
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str("[viewport]\nwidth = 640\n").unwrap();
        assert_eq!(config.viewport.width, 640);
        assert_eq!(config.viewport.height, 1080);
        assert_eq!(config.catalog.materials.len(), 5);
        assert_eq!(config.initial.leg_length_mm, 700.0);
    }
}
