//! Clip planes: classification, snapping and epsilon equality.

use crate::float_types::{
    DIAGONAL_COMPONENT, PLANE_DIR_EPSILON, PLANE_DIST_EPSILON, Real,
};
use nalgebra::{Point3, Vector3};

/// Axial classification of a plane normal.
///
/// The discriminants are the values stored in `.clip` files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PlaneType {
    X = 0,
    Y = 1,
    Z = 2,
    NonAxial = 3,
}

impl PlaneType {
    /// Axis index of an axial plane.
    pub const fn axis(self) -> Option<usize> {
        match self {
            PlaneType::X => Some(0),
            PlaneType::Y => Some(1),
            PlaneType::Z => Some(2),
            PlaneType::NonAxial => None,
        }
    }

    pub const fn from_axis(axis: usize) -> Self {
        match axis {
            0 => PlaneType::X,
            1 => PlaneType::Y,
            2 => PlaneType::Z,
            _ => PlaneType::NonAxial,
        }
    }

    /// Decode a stored type, mapping unknown values to [`PlaneType::NonAxial`].
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0 => PlaneType::X,
            1 => PlaneType::Y,
            2 => PlaneType::Z,
            _ => PlaneType::NonAxial,
        }
    }

    /// Classify a normal, tolerating [`PLANE_DIR_EPSILON`] of noise.
    pub fn for_normal(normal: &Vector3<Real>) -> Self {
        let a = normal.map(Real::abs);
        for axis in 0..3 {
            let (o1, o2) = ((axis + 1) % 3, (axis + 2) % 3);
            if a[axis] > 1.0 - PLANE_DIR_EPSILON
                && a[o1] < PLANE_DIR_EPSILON
                && a[o2] < PLANE_DIR_EPSILON
            {
                return Self::from_axis(axis);
            }
        }
        PlaneType::NonAxial
    }
}

/// A clip plane `normal · p = dist`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vector3<Real>,
    /// Signed distance from the origin along `normal`
    pub dist: Real,
    /// Axial classification
    pub kind: PlaneType,
    /// Bit `i` is set when `normal[i]` is negative
    pub signbits: u8,
}

impl Plane {
    /// Build a plane and classify it.
    pub fn new(normal: Vector3<Real>, dist: Real) -> Self {
        let mut plane = Plane {
            normal,
            dist,
            kind: PlaneType::for_normal(&normal),
            signbits: 0,
        };
        plane.signbits = signbits_for(&normal);
        plane
    }

    /// Epsilon comparison: distance first, then every normal component.
    pub fn equals(&self, normal: &Vector3<Real>, dist: Real) -> bool {
        (self.dist - dist).abs() < PLANE_DIST_EPSILON
            && (0..3).all(|i| (self.normal[i] - normal[i]).abs() < PLANE_DIR_EPSILON)
    }

    /// Recompute the exact type and sign bits from the stored normal.
    ///
    /// Only normals with a component of exactly `1.0` count as axial here; loaded
    /// planes were snapped before they were written.
    pub fn categorize(&mut self) {
        self.kind = PlaneType::NonAxial;
        for i in 0..3 {
            if self.normal[i] == 1.0 {
                self.kind = PlaneType::from_axis(i);
            }
        }
        self.signbits = signbits_for(&self.normal);
    }

    /// Signed distance of `point`; positive in front.
    #[inline]
    pub fn distance_to(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.dist
    }

    /// `true` for the X, Y and Z types.
    #[inline]
    pub const fn is_axial(&self) -> bool {
        !matches!(self.kind, PlaneType::NonAxial)
    }
}

fn signbits_for(normal: &Vector3<Real>) -> u8 {
    (0..3).fold(0u8, |bits, i| if normal[i] < 0.0 { bits | (1 << i) } else { bits })
}

/// Snap a nearly axial normal to the exact axis, or nearly diagonal components to
/// `±0.707106`, re-normalizing whenever something was snapped.
///
/// Returns the classification of the normal before snapping.
pub fn snap_normal(normal: &mut Vector3<Real>) -> PlaneType {
    let kind = PlaneType::for_normal(normal);
    let mut renormalize = false;

    if let Some(axis) = kind.axis() {
        for i in 0..3 {
            normal[i] = if i == axis {
                if normal[i] > 0.0 { 1.0 } else { -1.0 }
            } else {
                0.0
            };
        }
        renormalize = true;
    } else {
        for i in 0..3 {
            if (normal[i].abs() - DIAGONAL_COMPONENT).abs() < PLANE_DIR_EPSILON {
                normal[i] = if normal[i] > 0.0 {
                    DIAGONAL_COMPONENT
                } else {
                    -DIAGONAL_COMPONENT
                };
                renormalize = true;
            }
        }
    }

    if renormalize {
        *normal = normal.normalize();
    }
    kind
}

/// `true` when at most one component is non-zero.
pub fn is_on_axis(v: &Vector3<Real>) -> bool {
    v.iter().filter(|c| **c == 0.0).count() >= 2
}

/// Round an on-axis plane distance to the nearest integer when it is within
/// [`PLANE_DIST_EPSILON`] of it. `-0.0` becomes `0.0`.
pub fn snap_dist(normal: &Vector3<Real>, dist: Real) -> Real {
    if !is_on_axis(normal) {
        return dist;
    }
    let rounded = dist.round();
    if (dist - rounded).abs() < PLANE_DIST_EPSILON {
        rounded + 0.0
    } else {
        dist
    }
}
