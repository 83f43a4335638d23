//! Build and cache parameters.
//!
//! Defaults mirror the constants in [`crate::float_types`]. The cache directory can
//! be overridden at runtime with the `CLIPMESH_CACHE_DIR` environment variable
//! through [`MeshConfig::from_env`].

use crate::float_types::{
    MAX_AREA_DEPTH, MAX_FACET_PLANES, MAX_TRIANGLES, TREE_THRESHOLD,
};

/// Environment variable consulted by [`MeshConfig::from_env`].
pub const CACHE_DIR_ENV: &str = "CLIPMESH_CACHE_DIR";

/// Parameters of a mesh build and of the `.clip` cache location.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    /// Meshes with this many triangles or more are rejected.
    pub max_triangles: usize,
    /// Upper bound of planes per facet; a triangle reaching it is dropped.
    pub max_facet_planes: usize,
    /// Triangle count from which an area tree is built.
    pub tree_threshold: usize,
    /// Depth of the area tree.
    pub area_depth: usize,
    /// Directory the `.clip` files live in.
    pub cache_dir: String,
    /// Prefix stripped from model names before deriving the cache path.
    pub model_prefix: String,
    /// Body group selection, decoded per body part as `body / base % models`.
    pub body: usize,
    /// Skin family used to remap mesh skin references.
    pub skin: usize,
    /// Read and write `.clip` files at all.
    pub use_cache: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            max_triangles: MAX_TRIANGLES,
            max_facet_planes: MAX_FACET_PLANES,
            tree_threshold: TREE_THRESHOLD,
            area_depth: MAX_AREA_DEPTH,
            cache_dir: "cache".to_string(),
            model_prefix: "models/".to_string(),
            body: 0,
            skin: 0,
            use_cache: true,
        }
    }
}

impl MeshConfig {
    /// Default configuration with the cache directory taken from
    /// `CLIPMESH_CACHE_DIR` when it is set and not empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
            let dir = dir.trim().trim_end_matches('/');
            if !dir.is_empty() {
                config.cache_dir = dir.to_string();
            }
        }
        config
    }

    /// Meshes this large print a progress pacifier while building.
    pub const fn pacifier_threshold(&self) -> usize {
        self.max_triangles >> 3
    }

    /// Meshes this large get a size warning.
    pub const fn warning_threshold(&self) -> usize {
        self.max_triangles >> 1
    }
}
