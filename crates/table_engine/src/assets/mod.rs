//! Asset loading and caching
//!
//! Model and material bundles arrive as glTF binaries. Loading is
//! cooperative: callers enqueue requests on the [`AssetServer`] and the
//! frame loop pumps completions back out. Every request carries a
//! monotonic token per resource class so a slow load that lands after a
//! newer request has superseded it can be recognized and discarded.

pub mod gltf_source;
pub mod material_cache;
pub mod progress;

pub use gltf_source::GltfSource;
pub use material_cache::{MaterialCache, MaterialSlot};
pub use progress::ProgressTracker;

use std::collections::VecDeque;
use std::path::PathBuf;

use thiserror::Error;

use crate::foundation::math::{Aabb, Vec3};

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// File could not be read
    #[error("failed to read asset {path}: {source}")]
    Io {
        /// Requested asset path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// File was read but could not be parsed as a model bundle
    #[error("failed to parse asset {path}: {reason}")]
    Parse {
        /// Requested asset path
        path: PathBuf,
        /// Parser diagnostic
        reason: String,
    },

    /// Bundle parsed but a structurally required sub-part is absent
    #[error("asset {path} is missing required part \"{part}\"")]
    MissingPart {
        /// Requested asset path
        path: PathBuf,
        /// Name of the missing sub-part
        part: String,
    },

    /// Bundle was expected to carry a material and does not
    #[error("asset {path} carries no material")]
    MissingMaterial {
        /// Requested asset path
        path: PathBuf,
    },
}

/// Raw vertex data for one sub-part mesh
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates
    pub tex_coords: Vec<[f32; 2]>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

/// One named sub-part of a model bundle
#[derive(Debug, Clone)]
pub struct BundlePart {
    /// Node name as authored in the bundle
    pub name: String,
    /// Translation of the part within the bundle
    pub translation: Vec3,
    /// Bounding box of the part mesh in its local space
    pub bounds: Aabb,
    /// Mesh data
    pub mesh: MeshData,
}

/// Which of the four texture channels a material carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelPresence {
    /// Base color map present
    pub color: bool,
    /// Metalness map present
    pub metalness: bool,
    /// Roughness map present
    pub roughness: bool,
    /// Normal map present
    pub normal: bool,
}

/// Material description extracted from a bundle
#[derive(Debug, Clone)]
pub struct MaterialData {
    /// Base color factor (RGBA)
    pub base_color: [f32; 4],
    /// Metallic factor
    pub metallic: f32,
    /// Roughness factor
    pub roughness: f32,
    /// Texture channels present on the material
    pub channels: ChannelPresence,
}

/// A parsed model bundle: named parts plus an optional material
#[derive(Debug, Clone, Default)]
pub struct ModelBundle {
    /// Sub-parts in bundle order
    pub parts: Vec<BundlePart>,
    /// Material carried by the bundle, if any
    pub material: Option<MaterialData>,
}

/// Source of model bundles (filesystem, test double, ...)
pub trait AssetSource {
    /// Load and parse the bundle at `path`
    fn load_model(&mut self, path: &str) -> Result<ModelBundle, AssetError>;
}

/// Resource classes tracked with independent request tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// The leg-assembly template model
    Legs,
    /// A support variant model
    Supports,
    /// A tabletop material bundle
    Material,
}

/// Monotonic token identifying one load request within its class
///
/// A completion whose token is no longer the latest issued for its
/// class is stale and must not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    class: ResourceClass,
    serial: u64,
}

impl RequestToken {
    /// Resource class this token belongs to
    pub fn class(&self) -> ResourceClass {
        self.class
    }
}

/// A finished load, ready to be handed to the scene
pub struct LoadCompletion {
    /// Token the load was issued under
    pub token: RequestToken,
    /// Path the load was issued for
    pub path: String,
    /// Parsed bundle or the failure that prevented it
    pub result: Result<ModelBundle, AssetError>,
}

/// Callback receiving cumulative (items loaded, items requested)
pub type ProgressFn = Box<dyn FnMut(usize, usize)>;

/// Cooperative asset loader with per-class request tokens
///
/// Requests are queued and performed when the frame loop calls
/// [`AssetServer::pump`], so tests and the engine alike control exactly
/// when a load lands relative to parameter updates.
pub struct AssetServer {
    source: Box<dyn AssetSource>,
    queue: VecDeque<(RequestToken, String)>,
    latest_legs: u64,
    latest_supports: u64,
    latest_material: u64,
    next_serial: u64,
    items_requested: usize,
    items_loaded: usize,
    on_progress: Option<ProgressFn>,
}

impl AssetServer {
    /// Create a server over the given source
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self {
            source,
            queue: VecDeque::new(),
            latest_legs: 0,
            latest_supports: 0,
            latest_material: 0,
            next_serial: 0,
            items_requested: 0,
            items_loaded: 0,
            on_progress: None,
        }
    }

    /// Register the progress callback
    ///
    /// Invoked once per completed load with cumulative counts, never on
    /// cache hits (cache hits never reach the server).
    pub fn set_progress_callback(&mut self, callback: ProgressFn) {
        self.on_progress = Some(callback);
    }

    /// Queue a load and return its token
    ///
    /// The returned token becomes the latest for its class, superseding
    /// any still-in-flight request of the same class.
    pub fn request(&mut self, class: ResourceClass, path: &str) -> RequestToken {
        self.next_serial += 1;
        let token = RequestToken {
            class,
            serial: self.next_serial,
        };
        match class {
            ResourceClass::Legs => self.latest_legs = token.serial,
            ResourceClass::Supports => self.latest_supports = token.serial,
            ResourceClass::Material => self.latest_material = token.serial,
        }
        self.items_requested += 1;
        log::debug!("queued {class:?} load for {path}");
        self.queue.push_back((token, path.to_string()));
        token
    }

    /// Whether `token` is still the latest issued for its class
    pub fn is_current(&self, token: RequestToken) -> bool {
        let latest = match token.class {
            ResourceClass::Legs => self.latest_legs,
            ResourceClass::Supports => self.latest_supports,
            ResourceClass::Material => self.latest_material,
        };
        token.serial == latest
    }

    /// Perform up to `max` queued loads and return their completions
    pub fn pump(&mut self, max: usize) -> Vec<LoadCompletion> {
        let mut completions = Vec::new();
        for _ in 0..max {
            let Some((token, path)) = self.queue.pop_front() else {
                break;
            };
            let result = self.source.load_model(&path);
            self.items_loaded += 1;
            if let Some(callback) = self.on_progress.as_mut() {
                callback(self.items_loaded, self.items_requested);
            }
            completions.push(LoadCompletion { token, path, result });
        }
        completions
    }

    /// Number of queued, not yet performed loads
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Whether every requested load has completed
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
pub mod test_support {
    //! In-memory asset source for scripting load outcomes in tests

    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::{
        AssetError, AssetSource, BundlePart, ChannelPresence, MaterialData, MeshData, ModelBundle,
    };
    use crate::foundation::math::{Aabb, Vec3};

    /// Asset source serving pre-registered bundles from memory
    #[derive(Default)]
    pub struct FakeSource {
        bundles: HashMap<String, ModelBundle>,
        fetches: Rc<Cell<usize>>,
    }

    impl FakeSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, path: &str, bundle: ModelBundle) {
            self.bundles.insert(path.to_string(), bundle);
        }

        /// Counter of performed fetches, shared so it stays readable
        /// after the source moves into a server
        pub fn fetch_counter(&self) -> Rc<Cell<usize>> {
            Rc::clone(&self.fetches)
        }
    }

    impl AssetSource for FakeSource {
        fn load_model(&mut self, path: &str) -> Result<ModelBundle, AssetError> {
            self.fetches.set(self.fetches.get() + 1);
            self.bundles.get(path).cloned().ok_or_else(|| AssetError::Io {
                path: path.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such bundle"),
            })
        }
    }

    /// A part whose mesh is a unit box centered at `translation`
    pub fn box_part(name: &str, translation: Vec3, width: f32, height: f32, depth: f32) -> BundlePart {
        BundlePart {
            name: name.to_string(),
            translation,
            bounds: Aabb::from_extents(width, height, depth),
            mesh: MeshData::default(),
        }
    }

    /// Leg template bundle with the structural parts plus end caps
    pub fn leg_bundle(cap_width: f32, column_height: f32) -> ModelBundle {
        ModelBundle {
            parts: vec![
                box_part("top", Vec3::new(0.0, 0.0, 0.12), cap_width, 0.02, 0.02),
                box_part("bottom", Vec3::new(0.0, 0.0, -0.12), cap_width, 0.02, 0.02),
                box_part("left", Vec3::new(-0.1, -0.2, 0.0), 0.02, column_height, 0.02),
                box_part("right", Vec3::new(0.1, -0.2, 0.0), 0.02, column_height, 0.02),
                box_part("leftTop", Vec3::new(-0.12, 0.0, 0.12), 0.01, 0.02, 0.02),
                box_part("leftBottom", Vec3::new(-0.12, 0.0, -0.12), 0.01, 0.02, 0.02),
                box_part("rightTop", Vec3::new(0.12, 0.0, 0.12), 0.01, 0.02, 0.02),
                box_part("rightBottom", Vec3::new(0.12, 0.0, -0.12), 0.01, 0.02, 0.02),
            ],
            material: None,
        }
    }

    /// Support variant bundle with a single mesh part
    pub fn support_bundle() -> ModelBundle {
        ModelBundle {
            parts: vec![box_part("prop", Vec3::zeros(), 0.04, 0.04, 0.04)],
            material: None,
        }
    }

    /// Material bundle exposing the four texture channels
    pub fn material_bundle(channels: ChannelPresence) -> ModelBundle {
        ModelBundle {
            parts: vec![box_part("plane", Vec3::zeros(), 1.0, 0.01, 1.0)],
            material: Some(MaterialData {
                base_color: [0.8, 0.7, 0.6, 1.0],
                metallic: 0.1,
                roughness: 0.9,
                channels,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{support_bundle, FakeSource};
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn server_with(paths: &[&str]) -> AssetServer {
        let mut source = FakeSource::new();
        for p in paths {
            source.insert(p, support_bundle());
        }
        AssetServer::new(Box::new(source))
    }

    #[test]
    fn test_pump_completes_requests_in_order() {
        let mut server = server_with(&["/models/prop_01.glb", "/models/prop_02.glb"]);
        let first = server.request(ResourceClass::Supports, "/models/prop_01.glb");
        let second = server.request(ResourceClass::Supports, "/models/prop_02.glb");

        let completions = server.pump(1);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].token, first);
        assert!(!server.is_current(first));
        assert!(server.is_current(second));

        let completions = server.pump(8);
        assert_eq!(completions.len(), 1);
        assert!(completions[0].result.is_ok());
        assert!(server.is_idle());
    }

    #[test]
    fn test_newer_request_supersedes_older_token() {
        let mut server = server_with(&["/models/prop_01.glb", "/models/prop_02.glb"]);
        let stale = server.request(ResourceClass::Supports, "/models/prop_01.glb");
        let current = server.request(ResourceClass::Supports, "/models/prop_02.glb");

        assert!(!server.is_current(stale));
        assert!(server.is_current(current));
    }

    #[test]
    fn test_tokens_are_independent_per_class() {
        let mut server = server_with(&["/models/legCustom.glb", "/models/prop_01.glb"]);
        let legs = server.request(ResourceClass::Legs, "/models/legCustom.glb");
        let supports = server.request(ResourceClass::Supports, "/models/prop_01.glb");

        assert!(server.is_current(legs));
        assert!(server.is_current(supports));
    }

    #[test]
    fn test_missing_bundle_reports_io_error() {
        let mut server = server_with(&[]);
        server.request(ResourceClass::Material, "/materials/top_cedar_mat.glb");

        let completions = server.pump(1);
        assert!(matches!(
            completions[0].result,
            Err(AssetError::Io { .. })
        ));
    }

    #[test]
    fn test_progress_callback_reports_cumulative_counts() {
        let seen: Rc<RefCell<Vec<(usize, usize)>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut server = server_with(&["/models/prop_01.glb", "/models/prop_02.glb"]);
        server.set_progress_callback(Box::new(move |loaded, requested| {
            sink.borrow_mut().push((loaded, requested));
        }));
        server.request(ResourceClass::Supports, "/models/prop_01.glb");
        server.request(ResourceClass::Supports, "/models/prop_02.glb");
        server.pump(usize::MAX);

        assert_eq!(*seen.borrow(), vec![(1, 2), (2, 2)]);
    }
}
