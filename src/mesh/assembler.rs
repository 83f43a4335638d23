//! Studio model to collision mesh.
//!
//! Poses the skeleton in the first frame of the default sequence, skins the
//! selected sub-models, expands their triangle commands and streams the resulting
//! world space triangles through a [`MeshBuilder`]. [`construct_mesh`] wraps this
//! with the `.clip` cache.

use crate::config::MeshConfig;
use crate::errors::{BuildError, CacheError};
use crate::float_types::Real;
use crate::io::{FileStore, clip};
use crate::mesh::CollisionMesh;
use crate::mesh::builder::MeshBuilder;
use crate::mesh::pacifier::Pacifier;
use crate::studio::tricmds::{TriangleSoup, decode_mesh};
use crate::studio::{StudioModel, SubModel, anim::bone_transforms};
use nalgebra::{Isometry3, Point3};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Transform the vertices of `submodel` by their bones.
#[cfg(not(feature = "parallel"))]
pub fn skin_vertices(
    submodel: &SubModel,
    bones: &[Isometry3<Real>],
) -> Result<Vec<Point3<Real>>, BuildError> {
    submodel
        .vertices
        .iter()
        .enumerate()
        .map(|(i, v)| skin_vertex(submodel, bones, i, v))
        .collect()
}

/// Transform the vertices of `submodel` by their bones, in parallel.
#[cfg(feature = "parallel")]
pub fn skin_vertices(
    submodel: &SubModel,
    bones: &[Isometry3<Real>],
) -> Result<Vec<Point3<Real>>, BuildError> {
    submodel
        .vertices
        .par_iter()
        .enumerate()
        .map(|(i, v)| skin_vertex(submodel, bones, i, v))
        .collect()
}

fn skin_vertex(
    submodel: &SubModel,
    bones: &[Isometry3<Real>],
    i: usize,
    v: &Point3<Real>,
) -> Result<Point3<Real>, BuildError> {
    submodel
        .vertex_bones
        .get(i)
        .and_then(|b| bones.get(usize::from(*b)))
        .map(|bone| bone * v)
        .ok_or_else(|| {
            BuildError::MalformedModel(format!(
                "{}: vertex {i} has no valid bone",
                submodel.name
            ))
        })
}

/// Expand every selected sub-model of `model` into one triangle soup.
pub fn expand_triangles(
    model: &StudioModel,
    bones: &[Isometry3<Real>],
    config: &MeshConfig,
) -> Result<TriangleSoup, BuildError> {
    let submodels: Vec<&SubModel> = model
        .body_parts
        .iter()
        .filter_map(|part| StudioModel::select_submodel(part, config.body))
        .collect();

    let total_verts: usize = submodels.iter().map(|m| m.vertices.len()).sum();
    let mut soup = TriangleSoup::with_capacity(total_verts * 8);

    let skin_table = model.skin_table(config.skin);
    let remap = config.skin != 0 && config.skin < model.skin_families.len();

    for submodel in submodels {
        let vertices = skin_vertices(submodel, bones)?;

        for mesh in &submodel.meshes {
            let texture = model.texture_for(skin_table, mesh.skin_ref).ok_or_else(|| {
                BuildError::MalformedModel(format!(
                    "{}: skin reference {} has no texture",
                    submodel.name, mesh.skin_ref
                ))
            })?;

            let material = if remap {
                usize::try_from(mesh.skin_ref)
                    .ok()
                    .and_then(|slot| skin_table.get(slot))
                    .map_or(i32::from(mesh.skin_ref), |t| i32::from(*t))
            } else {
                i32::from(mesh.skin_ref)
            };

            decode_mesh(&mut soup, &mesh.tri_cmds, &vertices, texture, material)?;
        }
    }

    if soup.expected_tris != soup.num_triangles() as isize {
        log::error!(
            "{}: mismatch triangle count ({} should be {})",
            model.name,
            soup.num_triangles(),
            soup.expected_tris
        );
    }

    Ok(soup)
}

/// Build the collision mesh of `model` from scratch.
///
/// Triangles the builder rejects are dropped and counted; the build only fails when
/// the model itself is unusable or nothing survives.
pub fn build_from_studio(
    model: &StudioModel,
    config: &MeshConfig,
    progress: Option<&mut dyn FnMut(Real)>,
) -> Result<CollisionMesh, BuildError> {
    if model.bones.is_empty() {
        return Err(BuildError::NoBones);
    }

    let bones = bone_transforms(model, 0)?;
    let soup = expand_triangles(model, &bones, config)?;
    let num_tris = soup.num_triangles();

    let mut builder = MeshBuilder::new(&model.name, num_tris, config)?;
    let mut pacifier = Pacifier::start(&model.name, builder.shows_pacifier(), progress);
    let mut rejected = 0usize;

    for (i, (triangle, skin_ref)) in soup.triangles().enumerate() {
        if let Err(err) = builder.add_triangle(&triangle, skin_ref) {
            log::debug!("{}: triangle {i} rejected: {err}", model.name);
            rejected += 1;
        }
        pacifier.update((i + 1) as Real / num_tris as Real);
    }
    pacifier.finish();

    if rejected > 0 {
        log::warn!("{}: {rejected} of {num_tris} triangles rejected", model.name);
    }

    builder.finish()
}

/// Load the collision mesh of `model` from its `.clip` cache, or build it and
/// store a fresh cache.
///
/// Cache problems only cause a rebuild; a failed save is reported and the built
/// mesh is still returned.
pub fn construct_mesh<S: FileStore + ?Sized>(
    model: &StudioModel,
    store: &S,
    config: &MeshConfig,
) -> Result<CollisionMesh, BuildError> {
    let started = Instant::now();

    if config.use_cache {
        match clip::load(model, store, config) {
            Ok(parts) => match CollisionMesh::assemble(parts, config) {
                Ok(mesh) => {
                    log::debug!(
                        "{}: load time {:.3} secs",
                        model.name,
                        started.elapsed().as_secs_f32()
                    );
                    mesh.log_info();
                    return Ok(mesh);
                },
                Err(err) => log::warn!("{}: cached mesh unusable: {err}", model.name),
            },
            Err(CacheError::Missing(_)) => {},
            Err(err) => log::info!("{}: rebuilding collision mesh: {err}", model.name),
        }
    }

    let mesh = build_from_studio(model, config, None)?;
    store_cache(&mesh, model, store, config);

    log::info!(
        "{}: CLIP build time {:.3} secs",
        model.name,
        started.elapsed().as_secs_f32()
    );
    mesh.log_info();
    Ok(mesh)
}

/// Write the `.clip` cache of a freshly built mesh when caching is enabled.
///
/// Returns `false` when the cache could not be written; the failure is logged.
pub fn store_cache<S: FileStore + ?Sized>(
    mesh: &CollisionMesh,
    model: &StudioModel,
    store: &S,
    config: &MeshConfig,
) -> bool {
    if !config.use_cache {
        return true;
    }
    match clip::save(mesh, model, store, config) {
        Ok(()) => true,
        Err(err) => {
            log::error!("{}: couldn't store collision cache: {err}", model.name);
            false
        },
    }
}
