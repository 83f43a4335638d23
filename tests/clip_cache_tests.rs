mod support;

use clipmesh::{
    CacheError, FileStore, MemoryStore, MeshConfig, build_from_studio, construct_mesh,
    io::clip::{self, CLIP_IDENT, CLIP_VERSION, ClipHeader, HEADER_SIZE, Lump},
    mesh::CollisionMesh,
    studio::StudioModel,
};

const MODEL: &str = "models/props/grid.mdl";
const CACHE: &str = "cache/props/grid.clip";

/// Store holding the model file and a fresh cache for it.
fn cached_store(model: &StudioModel) -> (MemoryStore, CollisionMesh) {
    support::init_logger();
    let store = MemoryStore::new();
    store.insert(MODEL, b"studio model".to_vec());
    let mesh = construct_mesh(model, &store, &MeshConfig::default()).unwrap();
    assert!(store.contains(CACHE));
    (store, mesh)
}

fn patch_u32(store: &MemoryStore, offset: usize, value: u32) {
    let mut data = store.load_file(CACHE).unwrap();
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    store.insert(CACHE, data);
}

#[test]
fn round_trip_preserves_the_mesh() {
    let model = support::grid_model(MODEL, 0xfeed, 300);
    let (store, mesh) = cached_store(&model);
    let config = MeshConfig::default();

    let parts = clip::load(&model, &store, &config).unwrap();
    assert_eq!(parts.name, MODEL);
    assert_eq!(parts.num_tris, mesh.facets().len());
    assert_eq!(parts.plane_indices, mesh.plane_indices());
    assert_eq!(parts.facets, mesh.facets());
    assert_eq!(parts.planes.len(), mesh.planes().len());
    for (loaded, built) in parts.planes.iter().zip(mesh.planes()) {
        assert_eq!(loaded.normal, built.normal);
        assert_eq!(loaded.dist, built.dist);
    }

    let loaded = CollisionMesh::assemble(parts, &config).unwrap();
    assert_eq!(loaded.bounds(), mesh.bounds());
    assert!(loaded.has_tree());
    assert_eq!(loaded.tree(), mesh.tree());
}

#[test]
fn file_layout() {
    let model = support::grid_model(MODEL, 0xfeed, 10);
    let mesh = build_from_studio(&model, &MeshConfig::default(), None).unwrap();
    let data = clip::to_bytes(&mesh, 0xfeed);

    assert_eq!(&data[0..4], b"CLIP");
    let header = ClipHeader::parse(&data).unwrap();
    assert_eq!(header.ident, CLIP_IDENT);
    assert_eq!(header.version, CLIP_VERSION);
    assert_eq!(header.checksum, 0xfeed);

    let mut expected_ofs = HEADER_SIZE as u32;
    let counts = [mesh.plane_indices().len(), mesh.planes().len(), mesh.facets().len()];
    for lump in Lump::ALL {
        let (ofs, len) = header.lumps[lump as usize];
        assert_eq!(ofs, expected_ofs);
        assert_eq!(len as usize, counts[lump as usize] * lump.record_size());
        assert_eq!(ofs % 4, 0);
        expected_ofs = ofs + len;
    }
    assert_eq!(data.len(), expected_ofs as usize);
}

#[test]
fn missing_cache() {
    let model = support::grid_model(MODEL, 1, 10);
    let store = MemoryStore::new();
    store.insert(MODEL, b"studio model".to_vec());
    assert!(matches!(
        clip::load(&model, &store, &MeshConfig::default()),
        Err(CacheError::Missing(path)) if path == CACHE
    ));
}

#[test]
fn cache_older_than_model_is_stale() {
    let model = support::grid_model(MODEL, 1, 10);
    let (store, _) = cached_store(&model);
    assert!(store.touch(MODEL));
    assert!(matches!(
        clip::load(&model, &store, &MeshConfig::default()),
        Err(CacheError::Stale(_))
    ));
}

#[test]
fn cache_without_model_file_is_stale() {
    let model = support::grid_model(MODEL, 1, 10);
    let (store, _) = cached_store(&model);
    store.remove(MODEL);
    assert!(matches!(
        clip::load(&model, &store, &MeshConfig::default()),
        Err(CacheError::Stale(_))
    ));
}

#[test]
fn changed_checksum_invalidates_cache() {
    let model = support::grid_model(MODEL, 1, 10);
    let (store, _) = cached_store(&model);

    let changed = StudioModel { checksum: 2, ..model };
    assert!(matches!(
        clip::load(&changed, &store, &MeshConfig::default()),
        Err(CacheError::ChecksumMismatch { found: 1, expected: 2 })
    ));
}

#[test]
fn scenario_c_bad_version_rebuilds() {
    let model = support::grid_model(MODEL, 1, 10);
    let (store, mesh) = cached_store(&model);
    patch_u32(&store, 4, (CLIP_VERSION + 1) as u32);

    let config = MeshConfig::default();
    assert!(matches!(
        clip::load(&model, &store, &config),
        Err(CacheError::BadVersion { found: 2, expected: 1 })
    ));

    // the rebuild path takes over and writes a good cache again
    let rebuilt = construct_mesh(&model, &store, &config).unwrap();
    assert_eq!(rebuilt.facets(), mesh.facets());
    assert!(clip::load(&model, &store, &config).is_ok());
}

#[test]
fn scenario_c_funny_lump_size() {
    let model = support::grid_model(MODEL, 1, 10);
    let (store, _) = cached_store(&model);

    let header = ClipHeader::parse(&store.load_file(CACHE).unwrap()).unwrap();
    let (_, len) = header.lumps[Lump::Planes as usize];
    // planes lump length lives after ident, version, checksum and one descriptor
    patch_u32(&store, 12 + 8 + 4, len - 4);

    assert!(matches!(
        clip::load(&model, &store, &MeshConfig::default()),
        Err(CacheError::BadLump { lump: "planes", .. })
    ));
    assert!(construct_mesh(&model, &store, &MeshConfig::default()).is_ok());
}

#[test]
fn bad_ident() {
    let model = support::grid_model(MODEL, 1, 10);
    let (store, _) = cached_store(&model);
    patch_u32(&store, 0, u32::from_le_bytes(*b"IDST"));
    assert!(matches!(
        clip::load(&model, &store, &MeshConfig::default()),
        Err(CacheError::BadIdent { expected: CLIP_IDENT, .. })
    ));
}

#[test]
fn truncated_file() {
    let model = support::grid_model(MODEL, 1, 10);
    let (store, _) = cached_store(&model);

    let mut data = store.load_file(CACHE).unwrap();
    data.truncate(data.len() / 2);
    store.insert(CACHE, data.clone());
    assert!(matches!(
        clip::load(&model, &store, &MeshConfig::default()),
        Err(CacheError::Truncated)
    ));

    store.insert(CACHE, data[..10].to_vec());
    assert!(matches!(
        clip::load(&model, &store, &MeshConfig::default()),
        Err(CacheError::Truncated)
    ));
}

#[test]
fn plane_index_out_of_range() {
    let model = support::grid_model(MODEL, 1, 10);
    let (store, _) = cached_store(&model);
    // first plane reference of facet 0
    patch_u32(&store, HEADER_SIZE, 0xffff);
    assert!(matches!(
        clip::load(&model, &store, &MeshConfig::default()),
        Err(CacheError::BadFacet { facet: 0 })
    ));
}

#[test]
fn cache_path_honors_config() {
    let config = MeshConfig {
        cache_dir: "/var/cache/clip".to_string(),
        ..MeshConfig::default()
    };
    assert_eq!(
        clip::cache_path("models/props/crate.mdl", &config),
        "/var/cache/clip/props/crate.clip"
    );
    assert_eq!(clip::cache_path("sprites/fire.spr", &config), "/var/cache/clip/sprites/fire.clip");
}

#[test]
fn disabled_cache_writes_nothing() {
    let model = support::grid_model(MODEL, 1, 10);
    let store = MemoryStore::new();
    store.insert(MODEL, b"studio model".to_vec());
    let config = MeshConfig {
        use_cache: false,
        ..MeshConfig::default()
    };
    construct_mesh(&model, &store, &config).unwrap();
    assert!(!store.contains(CACHE));
    assert_eq!(store.len(), 1);
}

#[test]
fn disk_store_round_trip() {
    let dir = std::env::temp_dir().join(format!("clipmesh-test-{}", std::process::id()));
    let store = clipmesh::DiskStore::new(&dir);
    store.save_file(MODEL, b"studio model").unwrap();

    let model = support::grid_model(MODEL, 7, 10);
    let config = MeshConfig::default();
    let built = construct_mesh(&model, &store, &config).unwrap();
    assert!(dir.join(CACHE).exists());

    let parts = clip::load(&model, &store, &config).unwrap();
    assert_eq!(parts.facets, built.facets());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn disk_store_with_absolute_cache_dir() {
    let base = std::env::temp_dir().join(format!("clipmesh-abs-{}", std::process::id()));
    let cache_dir = base.join("clip-cache");
    let store = clipmesh::DiskStore::new(base.join("game"));
    store.save_file(MODEL, b"studio model").unwrap();

    let config = MeshConfig {
        cache_dir: cache_dir.to_string_lossy().into_owned(),
        ..MeshConfig::default()
    };
    let model = support::grid_model(MODEL, 9, 10);
    let built = construct_mesh(&model, &store, &config).unwrap();

    let path = clip::cache_path(MODEL, &config);
    assert!(std::path::Path::new(&path).is_absolute());
    assert!(cache_dir.join("props/grid.clip").exists());

    let parts = clip::load(&model, &store, &config).unwrap();
    assert_eq!(parts.facets, built.facets());

    let _ = std::fs::remove_dir_all(&base);
}

/// Store whose writes always fail.
struct ReadOnlyStore(MemoryStore);

impl FileStore for ReadOnlyStore {
    fn load_file(&self, path: &str) -> Result<Vec<u8>, clipmesh::IoError> {
        self.0.load_file(path)
    }

    fn save_file(&self, _path: &str, _data: &[u8]) -> Result<(), clipmesh::IoError> {
        Err(std::io::Error::other("read-only file system").into())
    }

    fn compare_file_time(&self, a: &str, b: &str) -> Option<std::cmp::Ordering> {
        self.0.compare_file_time(a, b)
    }
}

#[test]
fn unwritable_cache_still_builds() {
    support::init_logger();
    let inner = MemoryStore::new();
    inner.insert(MODEL, b"studio model".to_vec());
    let store = ReadOnlyStore(inner);

    let model = support::grid_model(MODEL, 1, 300);
    let mesh = construct_mesh(&model, &store, &MeshConfig::default()).unwrap();
    assert_eq!(mesh.facets().len(), 300);
    assert!(mesh.has_tree());

    assert!(matches!(
        clip::save(&mesh, &model, &store, &MeshConfig::default()),
        Err(CacheError::Io(_))
    ));
    assert!(!store.0.contains(CACHE));
    assert_eq!(store.0.len(), 1);
}
