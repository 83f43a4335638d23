//! Deduplicated, index-addressed store of clip planes.
//!
//! Planes are hashed by `floor(|dist|)`. Lookups also probe the two neighbouring
//! buckets so that distances jittering across an integer boundary still match.

use crate::errors::BuildError;
use crate::float_types::{MIN_NORMAL_LENGTH, PLANE_HASHES, Real};
use crate::mesh::plane::{Plane, snap_dist, snap_normal};
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone)]
struct PoolEntry {
    plane: Plane,
    next: Option<u32>,
}

/// Pre-sized pool of unique planes with index-linked hash chains.
#[derive(Debug, Clone)]
pub struct PlanePool {
    entries: Vec<PoolEntry>,
    buckets: Vec<Option<u32>>,
    capacity: usize,
}

impl PlanePool {
    /// Create a pool holding at most `capacity` planes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            buckets: vec![None; PLANE_HASHES],
            capacity,
        }
    }

    #[inline]
    fn hash(dist: Real) -> usize {
        (dist.abs() as usize) & (PLANE_HASHES - 1)
    }

    /// Return the index of a plane equal to `(normal, dist)`, inserting a snapped
    /// copy when there is none yet.
    pub fn find_or_insert(&mut self, normal: &Vector3<Real>, dist: Real) -> Result<u32, BuildError> {
        let hash = Self::hash(dist);

        for offset in 0..3 {
            let bucket = (hash + PLANE_HASHES - 1 + offset) & (PLANE_HASHES - 1);
            let mut link = self.buckets[bucket];
            while let Some(index) = link {
                let entry = &self.entries[index as usize];
                if entry.plane.equals(normal, dist) {
                    return Ok(index);
                }
                link = entry.next;
            }
        }

        self.insert(normal, dist, hash)
    }

    fn insert(&mut self, normal: &Vector3<Real>, dist: Real, hash: usize) -> Result<u32, BuildError> {
        if normal.norm() < 0.5 {
            return Err(BuildError::DegenerateNormal);
        }
        if self.entries.len() >= self.capacity {
            return Err(BuildError::PlanePoolExhausted { capacity: self.capacity });
        }

        let mut normal = *normal;
        let kind = snap_normal(&mut normal);
        let dist = snap_dist(&normal, dist);

        let index = self.entries.len() as u32;
        self.entries.push(PoolEntry {
            plane: Plane { kind, ..Plane::new(normal, dist) },
            next: self.buckets[hash],
        });
        self.buckets[hash] = Some(index);
        Ok(index)
    }

    /// Intern the plane through three points.
    ///
    /// The normal is `normalize((p1 - p0) × (p2 - p1))`.
    pub fn plane_from_points(
        &mut self,
        p0: &Point3<Real>,
        p1: &Point3<Real>,
        p2: &Point3<Real>,
    ) -> Result<u32, BuildError> {
        let normal = (p1 - p0).cross(&(p2 - p1));
        let length = normal.norm();
        if !(length >= MIN_NORMAL_LENGTH) {
            return Err(BuildError::DegenerateTriangle);
        }
        let normal = normal / length;
        self.find_or_insert(&normal, normal.dot(&p0.coords))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&Plane> {
        self.entries.get(index as usize).map(|e| &e.plane)
    }

    pub fn planes(&self) -> impl Iterator<Item = &Plane> + '_ {
        self.entries.iter().map(|e| &e.plane)
    }

    /// Drop the hash chains and keep the planes in index order.
    pub fn into_planes(self) -> Vec<Plane> {
        self.entries.into_iter().map(|e| e.plane).collect()
    }
}

impl std::ops::Index<u32> for PlanePool {
    type Output = Plane;

    fn index(&self, index: u32) -> &Plane {
        &self.entries[index as usize].plane
    }
}
