//! Fixed depth, axis bisecting area tree over facet bounds.
//!
//! Every interior node splits its slab along the longer horizontal axis. A facet
//! descends while its box lies entirely on one side of the split and is linked at
//! the first node it straddles (or at the leaf it reaches).

pub mod node;

pub use node::AreaNode;

use crate::aabb::Aabb;

/// Index-based area tree. Node 0 is the root; nodes are allocated in pre-order.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaTree {
    nodes: Vec<AreaNode>,
    depth: usize,
}

impl AreaTree {
    /// Number of nodes a full tree of `depth` levels below the root holds.
    pub const fn node_count(depth: usize) -> usize {
        (1 << (depth + 1)) - 1
    }

    /// Build the empty tree covering `bounds`.
    pub fn build(depth: usize, bounds: &Aabb) -> Self {
        let mut tree = AreaTree {
            nodes: Vec::with_capacity(Self::node_count(depth)),
            depth,
        };
        tree.create_node(0, *bounds);
        tree
    }

    fn create_node(&mut self, depth: usize, bounds: Aabb) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(AreaNode::leaf());

        if depth == self.depth {
            return index;
        }

        let size = bounds.size();
        let axis = if size.x > size.y { 0 } else { 1 };
        let dist = 0.5 * (bounds.maxs[axis] + bounds.mins[axis]);

        let mut upper = bounds;
        let mut lower = bounds;
        upper.mins[axis] = dist;
        lower.maxs[axis] = dist;

        let above = self.create_node(depth + 1, upper);
        let below = self.create_node(depth + 1, lower);

        let node = &mut self.nodes[index as usize];
        node.axis = Some(axis);
        node.dist = dist;
        node.children = Some([above, below]);
        index
    }

    /// Index of the node a box with `bounds` settles in.
    pub fn locate(&self, bounds: &Aabb) -> u32 {
        let mut index = 0u32;
        loop {
            let node = &self.nodes[index as usize];
            let (Some(axis), Some([above, below])) = (node.axis, node.children) else {
                return index;
            };
            if bounds.mins[axis] > node.dist {
                index = above;
            } else if bounds.maxs[axis] < node.dist {
                index = below;
            } else {
                return index;
            }
        }
    }

    /// Link `facet` at the node its `bounds` settle in and return that node.
    pub fn insert(&mut self, facet: u32, bounds: &Aabb) -> u32 {
        let index = self.locate(bounds);
        self.nodes[index as usize].facets.push(facet);
        index
    }

    /// Call `f` for every facet linked at a node whose slab can overlap `region`.
    ///
    /// Facets are reported once; their own boxes are not tested.
    pub fn visit_region<F: FnMut(u32)>(&self, region: &Aabb, mut f: F) {
        let mut stack = vec![0u32];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            node.facets.iter().copied().for_each(&mut f);

            if let (Some(axis), Some([above, below])) = (node.axis, node.children) {
                if region.maxs[axis] > node.dist {
                    stack.push(above);
                }
                if region.mins[axis] < node.dist {
                    stack.push(below);
                }
            }
        }
    }

    #[inline]
    pub fn root(&self) -> &AreaNode {
        &self.nodes[0]
    }

    #[inline]
    pub fn node(&self, index: u32) -> Option<&AreaNode> {
        self.nodes.get(index as usize)
    }

    #[inline]
    pub fn nodes(&self) -> &[AreaNode] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Total number of links over all nodes.
    pub fn linked_facets(&self) -> usize {
        self.nodes.iter().map(|n| n.facets.len()).sum()
    }
}
