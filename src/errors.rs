//! Build and cache errors

use crate::io::IoError;

/// Everything that can stop a triangle, or a whole mesh, from being built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// The model produced no triangles at all
    #[error("model has no triangles")]
    NoTriangles,
    /// The model exceeds the hard triangle ceiling
    #[error("too many triangles ({count}), the limit is {max}")]
    TooManyTriangles { count: usize, max: usize },
    /// The model has no skeleton to pose
    #[error("model has no bones")]
    NoBones,
    /// A bone references a parent that is not evaluated before it
    #[error("bone {bone} has invalid parent {parent}")]
    BadBoneHierarchy { bone: usize, parent: usize },
    /// Source model data is inconsistent (out of range indices and the like)
    #[error("malformed model: {0}")]
    MalformedModel(String),
    /// The three points of a triangle do not span a plane
    #[error("triangle is degenerate")]
    DegenerateTriangle,
    /// A plane normal is too short to be normalized
    #[error("plane normal is degenerate")]
    DegenerateNormal,
    /// Every slot of the plane pool is taken
    #[error("plane pool is exhausted ({capacity} planes)")]
    PlanePoolExhausted { capacity: usize },
    /// The triangle needs more bounding planes than a facet may hold
    #[error("facet exceeds {limit} planes")]
    TooManyFacetPlanes { limit: usize },
    /// More triangles were fed to the builder than it was sized for
    #[error("more facets than the {expected} announced triangles")]
    FacetOverflow { expected: usize },
    /// Every triangle was rejected
    #[error("no facets were built")]
    NoFacets,
}

/// Reasons a `.clip` cache is not used, or could not be written.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// There is no cache file for the model
    #[error("cache file {0} does not exist")]
    Missing(String),
    /// The source model was modified after the cache was written
    #[error("cache file {0} is older than its model")]
    Stale(String),
    /// The file does not start with the clip identifier
    #[error("wrong id ({found:#010x} should be {expected:#010x})")]
    BadIdent { found: u32, expected: u32 },
    /// The file was written by another format revision
    #[error("wrong version ({found} should be {expected})")]
    BadVersion { found: i32, expected: i32 },
    /// The model was changed since the cache was written
    #[error("model checksum changed ({found:#010x} should be {expected:#010x})")]
    ChecksumMismatch { found: u32, expected: u32 },
    /// The file ends before the header or a lump does
    #[error("file is truncated")]
    Truncated,
    /// A lump length is empty or not a multiple of its record size
    #[error("funny size of {lump} lump ({length} bytes)")]
    BadLump { lump: &'static str, length: usize },
    /// A facet references a plane or index range outside the stored arrays
    #[error("facet {facet} references data outside the stored arrays")]
    BadFacet { facet: usize },
    /// The mesh holds nothing worth storing
    #[error("mesh is empty")]
    EmptyMesh,
    /// Reading or writing through the file store failed
    #[error(transparent)]
    Io(#[from] IoError),
}
