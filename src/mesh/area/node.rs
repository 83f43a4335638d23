//! Area tree node data structure

use crate::float_types::Real;

/// A node of the area tree.
///
/// Facets are linked at the deepest node whose split they do not straddle.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaNode {
    /// Split axis (0 = x, 1 = y) *or* **None** for a leaf.
    pub axis: Option<usize>,

    /// Split position along `axis`.
    pub dist: Real,

    /// Child 0 covers the part above `dist`, child 1 the part below it.
    pub children: Option<[u32; 2]>,

    /// Indices of the facets linked at this node.
    pub facets: Vec<u32>,
}

impl Default for AreaNode {
    fn default() -> Self {
        Self::leaf()
    }
}

impl AreaNode {
    /// Create an empty leaf
    pub const fn leaf() -> Self {
        Self {
            axis: None,
            dist: 0.0,
            children: None,
            facets: Vec::new(),
        }
    }

    #[inline]
    pub const fn is_leaf(&self) -> bool {
        self.axis.is_none()
    }
}
