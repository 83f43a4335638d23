//! Lazily built collision meshes, one per model.

use crate::config::MeshConfig;
use crate::io::FileStore;
use crate::mesh::CollisionMesh;
use crate::mesh::assembler::{build_from_studio, construct_mesh, store_cache};
use crate::studio::StudioModel;
use hashbrown::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared cache of collision meshes keyed by model name.
///
/// Meshes are built (or loaded from their `.clip` file) on first request and
/// handed out as `Arc`s, so a reader keeps its mesh alive across an unload or a
/// rebuild.
#[derive(Debug, Default)]
pub struct MeshRegistry {
    config: MeshConfig,
    meshes: RwLock<HashMap<String, Arc<CollisionMesh>>>,
}

impl MeshRegistry {
    pub fn new(config: MeshConfig) -> Self {
        Self {
            config,
            meshes: RwLock::new(HashMap::new()),
        }
    }

    pub const fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Mesh of `model`, building it on first use.
    ///
    /// Returns `None` when the model has no usable collision geometry; failures
    /// are not remembered, the next request tries again.
    pub fn get_or_build<S: FileStore + ?Sized>(
        &self,
        model: &StudioModel,
        store: &S,
    ) -> Option<Arc<CollisionMesh>> {
        if let Some(mesh) = self.get(&model.name) {
            return Some(mesh);
        }

        let mesh = self.build(model, store)?;
        let mut meshes = self.meshes.write().unwrap_or_else(PoisonError::into_inner);
        // a concurrent build may have won the race; keep the first one
        Some(Arc::clone(meshes.entry(model.name.clone()).or_insert(mesh)))
    }

    /// Build the mesh of `model` from the model itself, ignoring any `.clip`
    /// file, then rewrite the cache and replace the shared mesh.
    pub fn rebuild<S: FileStore + ?Sized>(
        &self,
        model: &StudioModel,
        store: &S,
    ) -> Option<Arc<CollisionMesh>> {
        let mesh = match build_from_studio(model, &self.config, None) {
            Ok(mesh) => mesh,
            Err(err) => {
                log::warn!("{}: no collision mesh: {err}", model.name);
                return None;
            },
        };
        store_cache(&mesh, model, store, &self.config);
        let mesh = Arc::new(mesh);
        self.meshes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(model.name.clone(), Arc::clone(&mesh));
        Some(mesh)
    }

    fn build<S: FileStore + ?Sized>(&self, model: &StudioModel, store: &S) -> Option<Arc<CollisionMesh>> {
        match construct_mesh(model, store, &self.config) {
            Ok(mesh) => Some(Arc::new(mesh)),
            Err(err) => {
                log::warn!("{}: no collision mesh: {err}", model.name);
                None
            },
        }
    }

    /// Cached mesh of the model called `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<CollisionMesh>> {
        self.meshes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Forget the mesh of `name`, returning it if it was cached.
    pub fn unload(&self, name: &str) -> Option<Arc<CollisionMesh>> {
        self.meshes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn clear(&self) {
        self.meshes.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn len(&self) -> usize {
        self.meshes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
