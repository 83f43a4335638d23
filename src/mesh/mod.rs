//! `CollisionMesh` and the stages that produce it.

use crate::aabb::Aabb;
use crate::config::MeshConfig;
use crate::errors::BuildError;
use crate::mesh::{area::AreaTree, facet::Facet, plane::Plane};

pub mod area;
pub mod assembler;
pub mod builder;
pub mod facet;
pub mod pacifier;
pub mod plane;
pub mod plane_pool;

/// Unpacked mesh data, produced either by a build or by a cache load.
#[derive(Debug, Clone, Default)]
pub struct MeshParts {
    pub name: String,
    pub planes: Vec<Plane>,
    pub facets: Vec<Facet>,
    pub plane_indices: Vec<u32>,
    /// Bounds of every facet vertex, without spread
    pub bounds: Aabb,
    /// Triangle count the tree decision is based on
    pub num_tris: usize,
}

/// Collision representation of one model.
///
/// Immutable once assembled; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    name: String,
    bounds: Aabb,
    planes: Box<[Plane]>,
    facets: Box<[Facet]>,
    plane_indices: Box<[u32]>,
    tree: Option<AreaTree>,
}

impl CollisionMesh {
    /// Pack `parts` into the final layout and build the area tree when the
    /// triangle count reaches `config.tree_threshold`.
    pub fn assemble(parts: MeshParts, config: &MeshConfig) -> Result<Self, BuildError> {
        let MeshParts {
            name,
            planes,
            facets,
            plane_indices,
            mut bounds,
            num_tris,
        } = parts;

        if facets.is_empty() {
            return Err(BuildError::NoFacets);
        }

        // spread the bounds by a unit
        bounds.inflate(1.0);

        let mut cursor = 0;
        for facet in &facets {
            if facet.first_index != cursor {
                log::error!(
                    "{name}: facet plane range starts at {} instead of {cursor}",
                    facet.first_index
                );
            }
            cursor = facet.first_index + facet.num_planes;
        }
        if cursor != plane_indices.len() {
            log::error!(
                "{name}: memory representation error, {cursor} != {} plane indices",
                plane_indices.len()
            );
        }

        let tree = (num_tris >= config.tree_threshold).then(|| {
            let mut tree = AreaTree::build(config.area_depth, &bounds);
            for (i, facet) in facets.iter().enumerate() {
                tree.insert(i as u32, &facet.bounds);
            }
            tree
        });

        Ok(Self {
            name,
            bounds,
            planes: planes.into_boxed_slice(),
            facets: facets.into_boxed_slice(),
            plane_indices: plane_indices.into_boxed_slice(),
            tree,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bounds of all facets, spread by one unit.
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Unique planes.
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Plane references of all facets, concatenated in facet order.
    pub fn plane_indices(&self) -> &[u32] {
        &self.plane_indices
    }

    /// Plane indices of one facet.
    pub fn facet_plane_indices(&self, facet: &Facet) -> &[u32] {
        self.plane_indices.get(facet.index_range()).unwrap_or(&[])
    }

    /// Planes bounding one facet, face plane first.
    pub fn facet_planes<'a>(&'a self, facet: &Facet) -> impl Iterator<Item = &'a Plane> + 'a {
        self.facet_plane_indices(facet)
            .iter()
            .filter_map(|i| self.planes.get(*i as usize))
    }

    pub const fn tree(&self) -> Option<&AreaTree> {
        self.tree.as_ref()
    }

    pub const fn has_tree(&self) -> bool {
        self.tree.is_some()
    }

    /// Bytes held by the packed arrays.
    pub fn memory_size(&self) -> usize {
        size_of::<Self>()
            + size_of_val(&*self.planes)
            + size_of_val(&*self.facets)
            + size_of_val(&*self.plane_indices)
    }

    /// Log plane and facet statistics.
    pub fn log_info(&self) {
        log::info!(
            "{}: {} facets, planes reduced from {} to {}, {} bytes",
            self.name,
            self.facets.len(),
            self.plane_indices.len(),
            self.planes.len(),
            self.memory_size()
        );
    }
}
