//! Scalar type and the tuned constants shared by the whole crate.
//!
//! The `.clip` format stores single precision floats, so `Real` is fixed to `f32`.
//! The epsilons below were tuned against real content; change them only together
//! with a calibration run over existing caches.

/// Our Real scalar type:
pub type Real = f32;

/// Two plane distances closer than this are considered equal.
pub const PLANE_DIST_EPSILON: Real = 0.0005;

/// Two normal components closer than this are considered equal.
///
/// Also used to detect near-axial and near-diagonal normals for snapping.
pub const PLANE_DIR_EPSILON: Real = 0.001;

/// A vertex further than this in front of a bevel candidate rejects the candidate.
pub const BEVEL_EPSILON: Real = 0.1;

/// `sin(45°)` as stored in snapped diagonal normals.
pub const DIAGONAL_COMPONENT: Real = 0.707106;

/// Shortest cross product accepted when deriving a face plane.
pub const MIN_NORMAL_LENGTH: Real = 1e-6;

/// Number of plane hash buckets. Must be a power of two.
pub const PLANE_HASHES: usize = 1024;

/// Upper bound of planes a single facet may reference.
pub const MAX_FACET_PLANES: usize = 32;

/// Meshes with this many triangles or more are never built.
pub const MAX_TRIANGLES: usize = 524_288;

/// Meshes with at least this many triangles get an area tree.
pub const TREE_THRESHOLD: usize = 256;

/// Depth of the area tree; the root is depth 0.
pub const MAX_AREA_DEPTH: usize = 4;

/// Number of skin families a studio model may carry.
pub const MAX_STUDIO_SKINS: usize = 32;
