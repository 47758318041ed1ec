//! Hierarchical (agglomerative) clustering with single linkage.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters, where the distance between two clusters is
//! the **minimum** distance between any of their members:
//!
//! ```text
//! d(A, B) = min { ||a - b|| : a ∈ A, b ∈ B }
//! ```
//!
//! Single linkage chains: two groups joined by a trail of close points end
//! up in one cluster, which suits elongated shapes and is sensitive to noise
//! bridges.
//!
//! # SLINK
//!
//! The naive algorithm (find the closest pair, merge, repeat) is O(n³).
//! Sibson's SLINK (1973) computes the same hierarchy in O(n²) time and O(n)
//! memory through the *pointer representation*: for every point `i`,
//! `λ(i)` is the height at which `i` stops being the last point of its
//! cluster and `π(i)` is the point it merges into. Sorting the pairs
//! `(i, π(i))` by `λ(i)` yields the merges in order. Equal heights are
//! ordered by point index, so the tree is deterministic.
//!
//! Memory stays linear, so inputs of tens of thousands of rows are fine;
//! time is quadratic in the row count.

use super::assignment::ClusterAssignment;
use super::traits::Clustering;
use super::validate_k;
use crate::distance::euclidean;
use crate::error::Result;
use crate::hierarchy::{Dendrogram, UnionFind};
use crate::matrix::FeatureMatrix;

const NAME: &str = "hierarchical";

/// Single-linkage hierarchical clustering cut to `k` flat clusters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HierarchicalClustering {
    /// Number of clusters to produce.
    k: usize,
}

/// Result of a hierarchical fit.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HierarchicalFit {
    /// Flat labels after cutting to `k` clusters.
    pub assignment: ClusterAssignment,
    /// Full merge tree.
    pub dendrogram: Dendrogram,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer.
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    /// Set the number of clusters.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Configured k.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Build the dendrogram and cut it to `k` clusters.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<HierarchicalFit> {
        validate_k(NAME, self.k, data.n_rows())?;

        let dendrogram = self.fit_dendrogram(data)?;
        let assignment = dendrogram.cut_to_k(self.k)?;
        tracing::debug!(
            k = self.k,
            merges = dendrogram.n_internal(),
            "hierarchical finished"
        );

        Ok(HierarchicalFit {
            assignment,
            dendrogram,
        })
    }

    /// Fit and return the full dendrogram.
    pub fn fit_dendrogram(&self, data: &FeatureMatrix) -> Result<Dendrogram> {
        let n = data.n_rows();
        let (pi, lambda) = slink(data);

        // Every point but the last merges once.
        let mut order: Vec<usize> = (0..n.saturating_sub(1)).collect();
        order.sort_by(|&a, &b| lambda[a].total_cmp(&lambda[b]).then(a.cmp(&b)));

        let mut dendro = Dendrogram::new(n);
        let mut sets = UnionFind::new(n);
        // Current dendrogram node of the set rooted at `i`.
        let mut node_of: Vec<usize> = (0..n).collect();

        for i in order {
            let (a, b) = (sets.find(i), sets.find(pi[i]));
            let (left, right) = (node_of[a].min(node_of[b]), node_of[a].max(node_of[b]));
            let id = dendro.add_merge(left, right, lambda[i])?;
            node_of[sets.union(a, b)] = id;
        }

        Ok(dendro)
    }
}

/// Sibson's SLINK: pointer representation `(π, λ)` of the single-linkage tree.
fn slink(data: &FeatureMatrix) -> (Vec<usize>, Vec<f64>) {
    let n = data.n_rows();
    let mut pi = vec![0usize; n];
    let mut lambda = vec![f64::INFINITY; n];
    let mut m = vec![0.0f64; n];

    for i in 0..n {
        pi[i] = i;
        lambda[i] = f64::INFINITY;

        for j in 0..i {
            m[j] = euclidean(data.row(j), data.row(i));
        }

        for j in 0..i {
            let p = pi[j];
            if lambda[j] >= m[j] {
                m[p] = m[p].min(lambda[j]);
                lambda[j] = m[j];
                pi[j] = i;
            } else {
                m[p] = m[p].min(m[j]);
            }
        }

        for j in 0..i {
            if lambda[j] >= lambda[pi[j]] {
                pi[j] = i;
            }
        }
    }

    (pi, lambda)
}

impl Default for HierarchicalClustering {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<ClusterAssignment> {
        self.fit(data).map(|fit| fit.assignment)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::condensed_distances;
    use crate::error::Error;
    use crate::hierarchy::DendrogramNode;
    use proptest::prelude::*;

    fn matrix(rows: &[Vec<f64>]) -> FeatureMatrix {
        FeatureMatrix::from_rows(rows).unwrap()
    }

    /// Closest-pair merging, straight from the definition.
    fn naive_single_linkage(data: &FeatureMatrix, k: usize) -> Vec<isize> {
        let n = data.n_rows();
        let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        while clusters.len() > k {
            let mut best = (f64::INFINITY, 0, 0);
            for a in 0..clusters.len() {
                for b in (a + 1)..clusters.len() {
                    for &i in &clusters[a] {
                        for &j in &clusters[b] {
                            let d = euclidean(data.row(i), data.row(j));
                            if d < best.0 {
                                best = (d, a, b);
                            }
                        }
                    }
                }
            }
            let merged = clusters.remove(best.2);
            clusters[best.1].extend(merged);
        }
        let mut labels = vec![0isize; n];
        for c in &mut clusters {
            c.sort_unstable();
        }
        clusters.sort_by_key(|c| c[0]);
        for (label, members) in clusters.iter().enumerate() {
            for &i in members {
                labels[i] = label as isize;
            }
        }
        labels
    }

    #[test]
    fn test_hierarchical_basic() {
        let data = matrix(&[
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ]);

        let labels = HierarchicalClustering::new(2).fit_predict(&data).unwrap();

        assert_eq!(labels.labels(), &[0, 0, 1, 1]);
    }

    #[test]
    fn test_dendrogram() {
        let data = matrix(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![10.0, 0.0]]);

        let dendro = HierarchicalClustering::new(2).fit_dendrogram(&data).unwrap();

        assert_eq!(dendro.n_leaves(), 3);
        assert_eq!(dendro.n_internal(), 2);
        assert_eq!(dendro.distances(), vec![1.0, 9.0]);
        assert_eq!(dendro.leaves(dendro.root().unwrap()), vec![0, 1, 2]);
    }

    #[test]
    fn test_merges_reference_current_clusters() {
        // Interleaved groups: a set's root is not its highest row.
        let data = matrix(&[vec![0.0], vec![10.0], vec![0.5], vec![10.2], vec![0.6]]);
        let dendro = HierarchicalClustering::new(1).fit_dendrogram(&data).unwrap();

        let merges: Vec<(usize, usize, usize)> = dendro
            .merges()
            .map(|(_, node)| match *node {
                DendrogramNode::Internal {
                    left, right, size, ..
                } => (left, right, size),
                DendrogramNode::Leaf { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(merges, vec![(2, 4, 2), (1, 3, 2), (0, 5, 3), (6, 7, 5)]);

        let expected = [0.1, 0.2, 0.5, 9.4];
        for (got, want) in dendro.distances().iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn test_single_linkage_chains() {
        // A chain of close points beats a compact but distant pair.
        let data = matrix(&[
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![3.0],
            vec![4.0],
            vec![5.5],
            vec![20.0],
            vec![20.5],
        ]);

        let labels = HierarchicalClustering::new(2).fit_predict(&data).unwrap();
        assert_eq!(labels.labels(), &[0, 0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_cut_extremes() {
        let rows: Vec<Vec<f64>> = (0..7).map(|i| vec![(i * i) as f64, (i % 3) as f64]).collect();
        let data = matrix(&rows);

        let all = HierarchicalClustering::new(7).fit(&data).unwrap();
        assert_eq!(all.assignment.n_clusters(), 7);
        assert_eq!(all.dendrogram.n_internal(), 6);

        let one = HierarchicalClustering::new(1).fit(&data).unwrap();
        assert!(one.assignment.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_single_row() {
        let fit = HierarchicalClustering::new(1).fit(&matrix(&[vec![3.0]])).unwrap();
        assert_eq!(fit.assignment.labels(), &[0]);
        assert_eq!(fit.dendrogram.n_internal(), 0);
        assert_eq!(fit.dendrogram.root(), Some(0));
    }

    #[test]
    fn test_duplicates_merge_at_zero() {
        let data = matrix(&[vec![1.0, 1.0], vec![1.0, 1.0], vec![4.0, 5.0]]);
        let dendro = HierarchicalClustering::new(1).fit_dendrogram(&data).unwrap();
        assert_eq!(dendro.distances(), vec![0.0, 5.0]);
    }

    #[test]
    fn test_invalid_k() {
        let data = matrix(&[vec![0.0], vec![1.0]]);
        assert_eq!(
            HierarchicalClustering::new(0).fit(&data).unwrap_err(),
            Error::InvalidClusterCount {
                algorithm: "hierarchical",
                requested: 0,
                n_items: 2
            }
        );
        assert!(HierarchicalClustering::new(3).fit(&data).is_err());
    }

    #[test]
    fn test_merge_heights_match_kodama() {
        let rows: Vec<Vec<f64>> = (0..25)
            .map(|i| {
                let t = i as f64;
                vec![(t * 1.7).sin() * 5.0, (t * 0.3).cos() * 3.0 + t * 0.1]
            })
            .collect();
        let data = matrix(&rows);

        let ours = HierarchicalClustering::new(1).fit_dendrogram(&data).unwrap();

        let mut condensed = condensed_distances(&data);
        let theirs = kodama::linkage(&mut condensed, rows.len(), kodama::Method::Single);
        let expected: Vec<f64> = theirs.steps().iter().map(|s| s.dissimilarity).collect();

        let got = ours.distances();
        assert_eq!(got.len(), expected.len());
        for (a, b) in got.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    proptest! {
        #[test]
        fn prop_matches_naive_and_shape(
            rows in proptest::collection::vec(proptest::collection::vec(-10.0f64..10.0, 2), 1..25),
            k in 1usize..8,
        ) {
            let data = matrix(&rows);
            let n = rows.len();
            let k = k.min(n);

            let fit = HierarchicalClustering::new(k).fit(&data).unwrap();
            prop_assert_eq!(fit.dendrogram.n_internal(), n - 1);
            prop_assert_eq!(fit.assignment.n_clusters(), k);

            let distances = fit.dendrogram.distances();
            prop_assert!(distances.windows(2).all(|w| w[0] <= w[1]));

            let naive = naive_single_linkage(&data, k);
            prop_assert_eq!(fit.assignment.labels(), naive.as_slice());
        }
    }
}
