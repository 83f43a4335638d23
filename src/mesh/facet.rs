//! Triangles with their bounding plane sets.

use crate::aabb::Aabb;
use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// A source triangle corner: position plus texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriVertex {
    pub point: Point3<Real>,
    pub st: [Real; 2],
}

impl TriVertex {
    pub const fn new(point: Point3<Real>, st: [Real; 2]) -> Self {
        TriVertex { point, st }
    }
}

impl Default for TriVertex {
    fn default() -> Self {
        TriVertex::new(Point3::origin(), [0.0; 2])
    }
}

/// One triangle and the sub-range of the mesh plane index array bounding it.
///
/// The first referenced plane is always the triangle's own face plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub triangle: [TriVertex; 3],
    /// `v1 - v0`
    pub edge1: Vector3<Real>,
    /// `v2 - v0`
    pub edge2: Vector3<Real>,
    /// Triangle bounds spread by one unit on every side
    pub bounds: Aabb,
    /// Material reference of the source mesh
    pub skin_ref: i32,
    /// First entry in the shared plane index array
    pub first_index: usize,
    /// Number of entries in the shared plane index array
    pub num_planes: usize,
}

impl Facet {
    /// Range of this facet in the mesh plane index array.
    #[inline]
    pub const fn index_range(&self) -> std::ops::Range<usize> {
        self.first_index..self.first_index + self.num_planes
    }

    /// Bounds of the three vertices, without the one unit spread.
    pub fn triangle_bounds(&self) -> Aabb {
        Aabb::from_points(self.triangle.iter().map(|v| &v.point))
    }
}
