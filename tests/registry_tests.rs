mod support;

use clipmesh::{MemoryStore, MeshConfig, MeshRegistry, studio::StudioModel};
use std::sync::Arc;

const MODEL: &str = "models/props/grid.mdl";

fn store() -> MemoryStore {
    support::init_logger();
    let store = MemoryStore::new();
    store.insert(MODEL, b"studio model".to_vec());
    store
}

#[test]
fn meshes_are_built_lazily_and_shared() {
    let store = store();
    let registry = MeshRegistry::new(MeshConfig::default());
    let model = support::grid_model(MODEL, 3, 12);

    assert!(registry.is_empty());
    assert!(registry.get(MODEL).is_none());

    let first = registry.get_or_build(&model, &store).unwrap();
    let second = registry.get_or_build(&model, &store).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
    assert_eq!(first.facets().len(), 12);
    assert!(store.contains("cache/props/grid.clip"));
}

#[test]
fn failed_builds_are_not_cached() {
    let store = store();
    let registry = MeshRegistry::new(MeshConfig::default());
    let model = StudioModel {
        bones: Vec::new(),
        ..support::grid_model(MODEL, 3, 12)
    };

    assert!(registry.get_or_build(&model, &store).is_none());
    assert!(registry.is_empty());
}

#[test]
fn unload_drops_the_cached_mesh() {
    let store = store();
    let registry = MeshRegistry::new(MeshConfig::default());
    let model = support::grid_model(MODEL, 3, 12);

    let mesh = registry.get_or_build(&model, &store).unwrap();
    let unloaded = registry.unload(MODEL).unwrap();
    assert!(Arc::ptr_eq(&mesh, &unloaded));
    assert!(registry.get(MODEL).is_none());
    assert!(registry.unload(MODEL).is_none());

    // readers keep their mesh after the unload
    assert_eq!(mesh.facets().len(), 12);

    // the next request loads it back from the cache file
    let reloaded = registry.get_or_build(&model, &store).unwrap();
    assert!(!Arc::ptr_eq(&mesh, &reloaded));
    assert_eq!(reloaded.facets(), mesh.facets());
}

#[test]
fn rebuild_replaces_the_shared_mesh() {
    let store = store();
    let registry = MeshRegistry::new(MeshConfig::default());
    let model = support::grid_model(MODEL, 3, 12);

    let old = registry.get_or_build(&model, &store).unwrap();
    let new = registry.rebuild(&model, &store).unwrap();
    assert!(!Arc::ptr_eq(&old, &new));
    assert!(Arc::ptr_eq(&new, &registry.get(MODEL).unwrap()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn clear_forgets_everything() {
    let store = store();
    let registry = MeshRegistry::new(MeshConfig::default());
    registry.get_or_build(&support::grid_model(MODEL, 3, 12), &store).unwrap();
    registry.get_or_build(&support::grid_model("models/other.mdl", 4, 6), &store).unwrap();
    assert_eq!(registry.len(), 2);

    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn registry_is_shareable_across_threads() {
    let store = Arc::new(store());
    let registry = Arc::new(MeshRegistry::new(MeshConfig::default()));
    let model = Arc::new(support::grid_model(MODEL, 3, 12));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let (store, registry, model) = (store.clone(), registry.clone(), model.clone());
            std::thread::spawn(move || registry.get_or_build(&model, &*store).unwrap())
        })
        .collect();

    let meshes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(registry.len(), 1);
    let shared = registry.get(MODEL).unwrap();
    assert!(meshes.iter().all(|m| Arc::ptr_eq(m, &shared)));
}

#[test]
fn rebuild_ignores_the_cache_file() {
    let store = store();
    let registry = MeshRegistry::new(MeshConfig::default());
    let original = support::grid_model(MODEL, 3, 12);
    registry.get_or_build(&original, &store).unwrap();

    // same name and checksum, different geometry: only a real build notices
    let edited = support::grid_model(MODEL, 3, 6);
    registry.unload(MODEL);
    assert_eq!(registry.get_or_build(&edited, &store).unwrap().facets().len(), 12);

    let rebuilt = registry.rebuild(&edited, &store).unwrap();
    assert_eq!(rebuilt.facets().len(), 6);

    // the cache file was rewritten from the rebuilt mesh
    registry.unload(MODEL);
    assert_eq!(registry.get_or_build(&edited, &store).unwrap().facets().len(), 6);
}
