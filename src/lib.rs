//! Collision meshes for skeletal **studio models**, with an on-disk `.clip` cache.
//!
//! A model is posed in its default frame, its triangles are expanded from strip and
//! fan commands and every triangle becomes a *facet*: the triangle plus the set of
//! planes bounding it (face plane, axial planes and edge bevels). Planes are shared
//! across facets through a hashed [plane pool](mesh::plane_pool), large meshes get
//! an [area tree](mesh::area) and the packed result is cached in a `.clip` file
//! keyed by the model checksum.
//!
//! # Features
//! #### Optional
//! - **parallel**: use rayon to skin sub-model vertices
//!
//! # Example
//! ```no_run
//! use clipmesh::{DiskStore, MeshConfig, MeshRegistry, StudioModel};
//!
//! let registry = MeshRegistry::new(MeshConfig::from_env());
//! let store = DiskStore::new("gamedir");
//! let model = StudioModel::default(); // filled by the host's model loader
//! if let Some(mesh) = registry.get_or_build(&model, &store) {
//!     println!("{} facets", mesh.facets().len());
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod aabb;
pub mod config;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod mesh;
pub mod registry;
pub mod studio;

pub use aabb::Aabb;
pub use config::MeshConfig;
pub use errors::{BuildError, CacheError};
pub use io::{DiskStore, FileStore, IoError, MemoryStore};
pub use mesh::assembler::{build_from_studio, construct_mesh};
pub use mesh::builder::MeshBuilder;
pub use mesh::{CollisionMesh, MeshParts};
pub use registry::MeshRegistry;
pub use studio::StudioModel;
