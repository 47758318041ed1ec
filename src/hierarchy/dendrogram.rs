//! Dendrogram for hierarchical clustering.
//!
//! A dendrogram represents the nested structure of clusters produced
//! by agglomerative (bottom-up) clustering.
//!
//! Node ids follow the SciPy/MATLAB convention: leaves are `0..n`, and the
//! i-th merge creates internal node `n + i`. Children always have smaller ids
//! than their parent, so the tree is acyclic by construction.

use crate::cluster::ClusterAssignment;
use crate::error::{Error, Result};

/// A node of the merge tree.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum DendrogramNode {
    /// One original row.
    Leaf {
        /// Row index in the feature matrix.
        row: usize,
    },
    /// Merge of two earlier nodes.
    Internal {
        /// First child id.
        left: usize,
        /// Second child id.
        right: usize,
        /// Linkage distance at which the children merged.
        distance: f64,
        /// Leaves under this node.
        size: usize,
    },
}

impl DendrogramNode {
    /// Leaves under this node.
    pub fn size(&self) -> usize {
        match self {
            DendrogramNode::Leaf { .. } => 1,
            DendrogramNode::Internal { size, .. } => *size,
        }
    }

    /// Whether this is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, DendrogramNode::Leaf { .. })
    }
}

/// A binary merge tree over `n` leaves.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dendrogram {
    nodes: Vec<DendrogramNode>,
    #[cfg_attr(feature = "serde", serde(skip))]
    parent: Vec<Option<usize>>,
    n_leaves: usize,
}

impl Dendrogram {
    /// Create a dendrogram with `n_leaves` leaves and no merges yet.
    pub fn new(n_leaves: usize) -> Self {
        let mut nodes = Vec::with_capacity(2 * n_leaves);
        nodes.extend((0..n_leaves).map(|row| DendrogramNode::Leaf { row }));
        Self {
            nodes,
            parent: vec![None; n_leaves],
            n_leaves,
        }
    }

    /// Record a merge of two current roots; returns the new node id.
    pub fn add_merge(&mut self, left: usize, right: usize, distance: f64) -> Result<usize> {
        let id = self.nodes.len();
        for child in [left, right] {
            if child >= id {
                return Err(Error::DimensionMismatch {
                    expected: id,
                    found: child,
                });
            }
            if self.parent[child].is_some() || left == right {
                return Err(Error::InvalidParameter {
                    algorithm: "dendrogram",
                    name: "merge",
                    message: "node already merged",
                });
            }
        }

        let size = self.nodes[left].size() + self.nodes[right].size();
        self.nodes.push(DendrogramNode::Internal {
            left,
            right,
            distance,
            size,
        });
        self.parent[left] = Some(id);
        self.parent[right] = Some(id);
        self.parent.push(None);
        Ok(id)
    }

    /// Number of original items.
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Number of merges recorded.
    pub fn n_internal(&self) -> usize {
        self.nodes.len() - self.n_leaves
    }

    /// Whether every leaf has been merged into a single root.
    pub fn is_complete(&self) -> bool {
        self.n_leaves > 0 && self.n_internal() == self.n_leaves - 1
    }

    /// All nodes, leaves first, then merges in order.
    pub fn nodes(&self) -> &[DendrogramNode] {
        &self.nodes
    }

    /// Node by id.
    pub fn node(&self, id: usize) -> Option<&DendrogramNode> {
        self.nodes.get(id)
    }

    /// Parent of a node, if merged.
    pub fn parent(&self, id: usize) -> Option<usize> {
        self.parent.get(id).copied().flatten()
    }

    /// Root id of a complete dendrogram.
    pub fn root(&self) -> Option<usize> {
        self.is_complete().then(|| self.nodes.len() - 1)
    }

    /// Iterate over merges as `(node id, node)`.
    pub fn merges(&self) -> impl Iterator<Item = (usize, &DendrogramNode)> {
        self.nodes.iter().enumerate().skip(self.n_leaves)
    }

    /// Merge distances in merge order (for plotting).
    pub fn distances(&self) -> Vec<f64> {
        self.merges()
            .filter_map(|(_, node)| match node {
                DendrogramNode::Internal { distance, .. } => Some(*distance),
                DendrogramNode::Leaf { .. } => None,
            })
            .collect()
    }

    /// Rows under a node, ascending.
    pub fn leaves(&self, id: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.nodes.get(current) {
                Some(DendrogramNode::Leaf { row }) => out.push(*row),
                Some(DendrogramNode::Internal { left, right, .. }) => {
                    stack.push(*left);
                    stack.push(*right);
                }
                None => {}
            }
        }
        out.sort_unstable();
        out
    }

    /// Flat clustering with exactly `k` clusters: apply the first `n - k` merges.
    ///
    /// Labels are numbered by the lowest row in each cluster, so row 0 is
    /// always in cluster 0.
    pub fn cut_to_k(&self, k: usize) -> Result<ClusterAssignment> {
        if k == 0 || k > self.n_leaves {
            return Err(Error::InvalidClusterCount {
                algorithm: "hierarchical",
                requested: k,
                n_items: self.n_leaves,
            });
        }
        let needed = self.n_leaves - k;
        if needed > self.n_internal() {
            return Err(Error::InsufficientData {
                algorithm: "hierarchical",
                required: needed,
                found: self.n_internal(),
            });
        }
        Ok(self.apply_merges(self.merges().take(needed)))
    }

    /// Flat clustering applying every merge at or below `threshold`.
    ///
    /// Meaningful for monotone dendrograms such as single linkage.
    pub fn cut_at_distance(&self, threshold: f64) -> ClusterAssignment {
        self.apply_merges(self.merges().filter(|(_, node)| match node {
            DendrogramNode::Internal { distance, .. } => *distance <= threshold,
            DendrogramNode::Leaf { .. } => false,
        }))
    }

    fn apply_merges<'a>(&self, merges: impl Iterator<Item = (usize, &'a DendrogramNode)>) -> ClusterAssignment {
        // Any leaf under a node stands in for it in the union-find.
        let mut representative = Vec::with_capacity(self.nodes.len());
        for (id, node) in self.nodes.iter().enumerate() {
            let rep = match node {
                DendrogramNode::Leaf { .. } => id,
                DendrogramNode::Internal { left, .. } => representative[*left],
            };
            representative.push(rep);
        }

        let mut sets = UnionFind::new(self.n_leaves);
        for (_, node) in merges {
            if let DendrogramNode::Internal { left, right, .. } = node {
                sets.union(representative[*left], representative[*right]);
            }
        }

        let mut label_of_root = vec![None; self.n_leaves];
        let mut next = 0usize;
        let labels = (0..self.n_leaves)
            .map(|row| {
                let root = sets.find(row);
                *label_of_root[root].get_or_insert_with(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();
        ClusterAssignment::from_indices(labels)
    }
}

/// Disjoint sets with path halving and union by size.
#[derive(Debug)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Join the sets holding `a` and `b`, returning the surviving root.
    pub(crate) fn union(&mut self, a: usize, b: usize) -> usize {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return ra;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        ra
    }
}
