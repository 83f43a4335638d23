//! Facet construction and the scoped build context.
//!
//! A [`MeshBuilder`] owns every scratch buffer of one build (plane hash table and
//! pool, facet list, plane index list). [`MeshBuilder::finish`] consumes it, so the
//! scratch is released on success and failure alike.

use crate::aabb::Aabb;
use crate::config::MeshConfig;
use crate::errors::BuildError;
use crate::float_types::{BEVEL_EPSILON, Real};
use crate::mesh::facet::{Facet, TriVertex};
use crate::mesh::plane::Plane;
use crate::mesh::plane_pool::PlanePool;
use crate::mesh::{CollisionMesh, MeshParts};
use nalgebra::Vector3;

/// Derive the bounding plane set of a triangle.
///
/// `face` is the (already interned) face plane, `bounds` the raw triangle bounds.
/// The returned list starts with `face`, followed by the axial planes the face
/// plane does not already provide and by the edge bevels that bound the outer hull.
///
/// Fails with [`BuildError::TooManyFacetPlanes`] when the set reaches `limit`.
pub fn facet_planes(
    triangle: &[TriVertex; 3],
    face: &Plane,
    bounds: &Aabb,
    limit: usize,
) -> Result<Vec<Plane>, BuildError> {
    let too_many = BuildError::TooManyFacetPlanes { limit };
    let mut planes = Vec::with_capacity(limit);
    planes.push(Plane::new(face.normal, face.dist));

    // axial planes
    for axis in 0..3 {
        for dir in [-1.0 as Real, 1.0] {
            if !planes.iter().any(|p| p.normal[axis] == dir) {
                let mut normal = Vector3::zeros();
                normal[axis] = dir;
                let dist = if dir > 0.0 { bounds.maxs[axis] } else { -bounds.mins[axis] };
                planes.push(Plane::new(normal, dist));
            }

            if planes.len() >= limit {
                return Err(too_many);
            }
        }
    }

    // edge bevels
    for i in 0..3 {
        let j = (i + 1) % 3;
        let edge = triangle[i].point - triangle[j].point;
        if edge.norm() < 0.5 {
            continue;
        }

        let edge = edge.normalize();
        if edge.iter().any(|c| *c == 1.0 || *c == -1.0) {
            continue; // axial edges are covered by the axial planes
        }

        for axis in 0..3 {
            for dir in [-1.0 as Real, 1.0] {
                let mut along = Vector3::zeros();
                along[axis] = dir;
                let normal = edge.cross(&along);
                if normal.norm() < 0.5 {
                    continue;
                }

                let normal = normal.normalize();
                let dist = triangle[i].point.coords.dot(&normal);

                if planes.iter().any(|p| p.equals(&normal, dist)) {
                    continue;
                }

                // a proper bevel has every other corner behind it
                let outer = (0..3)
                    .filter(|k| *k != i)
                    .all(|k| triangle[k].point.coords.dot(&normal) - dist <= BEVEL_EPSILON);
                if !outer {
                    continue;
                }

                planes.push(Plane::new(normal, dist));
                if planes.len() >= limit {
                    return Err(too_many);
                }
            }
        }
    }

    Ok(planes)
}

/// Build context for one collision mesh.
#[derive(Debug)]
pub struct MeshBuilder {
    name: String,
    config: MeshConfig,
    num_tris: usize,
    pool: PlanePool,
    facets: Vec<Facet>,
    plane_indices: Vec<u32>,
    bounds: Aabb,
}

impl MeshBuilder {
    /// Prepare a build for `num_triangles` triangles.
    ///
    /// Buffers are sized for the worst case of `max_facet_planes` planes per triangle.
    pub fn new(name: &str, num_triangles: usize, config: &MeshConfig) -> Result<Self, BuildError> {
        if num_triangles == 0 {
            return Err(BuildError::NoTriangles);
        }
        if num_triangles >= config.max_triangles {
            log::error!("{name} has too many triangles ({num_triangles}), mesh cannot be built");
            return Err(BuildError::TooManyTriangles {
                count: num_triangles,
                max: config.max_triangles,
            });
        }
        if num_triangles >= config.warning_threshold() {
            log::warn!("{name} has too many triangles ({num_triangles})");
        }

        let max_planes = num_triangles.saturating_mul(config.max_facet_planes);
        Ok(Self {
            name: name.to_string(),
            config: config.clone(),
            num_tris: num_triangles,
            pool: PlanePool::with_capacity(max_planes),
            facets: Vec::with_capacity(num_triangles),
            plane_indices: Vec::with_capacity(max_planes),
            bounds: Aabb::cleared(),
        })
    }

    /// Add one triangle as a facet.
    ///
    /// On failure nothing but possibly the face plane is recorded; the caller may
    /// carry on with the next triangle.
    pub fn add_triangle(&mut self, triangle: &[TriVertex; 3], skin_ref: i32) -> Result<(), BuildError> {
        if self.facets.len() >= self.num_tris {
            return Err(BuildError::FacetOverflow { expected: self.num_tris });
        }

        let [p0, p1, p2] = triangle.map(|v| v.point);
        let face = self.pool.plane_from_points(&p0, &p1, &p2)?;
        let face = self.pool[face];

        let raw_bounds = Aabb::from_points([&p0, &p1, &p2]);
        let planes = facet_planes(triangle, &face, &raw_bounds, self.config.max_facet_planes)?;

        let indices = planes
            .iter()
            .map(|p| self.pool.find_or_insert(&p.normal, p.dist))
            .collect::<Result<Vec<_>, _>>()?;

        for p in [&p0, &p1, &p2] {
            self.bounds.add_point(p);
        }

        let mut bounds = raw_bounds;
        bounds.inflate(1.0);

        self.facets.push(Facet {
            triangle: *triangle,
            edge1: p1 - p0,
            edge2: p2 - p0,
            bounds,
            skin_ref,
            first_index: self.plane_indices.len(),
            num_planes: indices.len(),
        });
        self.plane_indices.extend(indices);
        Ok(())
    }

    /// Pack the facets and unique planes into the final mesh.
    pub fn finish(self) -> Result<CollisionMesh, BuildError> {
        if self.facets.is_empty() {
            log::info!("{}: failed to build triangle mesh", self.name);
            return Err(BuildError::NoFacets);
        }

        let parts = MeshParts {
            name: self.name,
            planes: self.pool.into_planes(),
            facets: self.facets,
            plane_indices: self.plane_indices,
            bounds: self.bounds,
            num_tris: self.num_tris,
        };
        CollisionMesh::assemble(parts, &self.config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of triangles the builder was sized for.
    pub const fn num_triangles(&self) -> usize {
        self.num_tris
    }

    pub fn num_facets(&self) -> usize {
        self.facets.len()
    }

    pub const fn pool(&self) -> &PlanePool {
        &self.pool
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn plane_indices(&self) -> &[u32] {
        &self.plane_indices
    }

    /// Bounds of every accepted vertex, without spread.
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// `true` when the build is large enough to report progress.
    pub const fn shows_pacifier(&self) -> bool {
        self.num_tris >= self.config.pacifier_threshold()
    }
}
