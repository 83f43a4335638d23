use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box used for facets, meshes and area tree slabs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::cleared()
    }
}

impl Aabb {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// An inverted box that any added point replaces.
    #[inline]
    pub fn cleared() -> Self {
        Self {
            mins: Point3::new(Real::MAX, Real::MAX, Real::MAX),
            maxs: Point3::new(-Real::MAX, -Real::MAX, -Real::MAX),
        }
    }

    /// Smallest box holding all `points`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<Real>>) -> Self {
        let mut aabb = Self::cleared();
        for p in points {
            aabb.add_point(p);
        }
        aabb
    }

    #[inline]
    pub fn add_point(&mut self, p: &Point3<Real>) {
        for i in 0..3 {
            if p[i] < self.mins[i] {
                self.mins[i] = p[i];
            }
            if p[i] > self.maxs[i] {
                self.maxs[i] = p[i];
            }
        }
    }

    /// Grow the box by `amount` on every side.
    #[inline]
    pub fn inflate(&mut self, amount: Real) {
        let spread = Vector3::repeat(amount);
        self.mins -= spread;
        self.maxs += spread;
    }

    #[inline]
    pub fn size(&self) -> Vector3<Real> {
        self.maxs - self.mins
    }

    #[inline]
    pub fn contains_point(&self, p: &Point3<Real>) -> bool {
        (0..3).all(|i| p[i] >= self.mins[i] && p[i] <= self.maxs[i])
    }

    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.maxs.x >= other.mins.x
            && self.mins.x <= other.maxs.x
            && self.maxs.y >= other.mins.y
            && self.mins.y <= other.maxs.y
            && self.maxs.z >= other.mins.z
            && self.mins.z <= other.maxs.z
    }
}
