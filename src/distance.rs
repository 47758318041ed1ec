//! Euclidean distance primitives shared by the clustering algorithms.

use crate::matrix::FeatureMatrix;
use ndarray::{Array2, ArrayView1};

#[cfg(feature = "parallel")]
use ndarray::Axis;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Squared Euclidean distance.
#[inline]
pub fn squared_euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Euclidean distance.
#[inline]
pub fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Full `n × n` distance matrix: symmetric with an exact zero diagonal.
///
/// Memory is O(n²); prefer per-pair [`euclidean`] calls for large inputs.
pub fn pairwise_distances(data: &FeatureMatrix) -> Array2<f64> {
    let n = data.n_rows();
    let mut out = Array2::zeros((n, n));

    #[cfg(feature = "parallel")]
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut row)| {
            for j in 0..n {
                if i != j {
                    row[j] = euclidean(data.row(i), data.row(j));
                }
            }
        });

    #[cfg(not(feature = "parallel"))]
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(data.row(i), data.row(j));
            out[[i, j]] = d;
            out[[j, i]] = d;
        }
    }

    out
}

/// Upper triangle of the distance matrix, row-major, length `n(n-1)/2`.
pub fn condensed_distances(data: &FeatureMatrix) -> Vec<f64> {
    let n = data.n_rows();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n.saturating_sub(1) {
        for j in (i + 1)..n {
            out.push(euclidean(data.row(i), data.row(j)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_known_distance() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_eq!(squared_euclidean(a.view(), b.view()), 25.0);
        assert_eq!(euclidean(a.view(), b.view()), 5.0);
    }

    #[test]
    fn test_pairwise_symmetric_zero_diagonal() {
        let m = FeatureMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![0.0, 2.0],
        ])
        .unwrap();
        let d = pairwise_distances(&m);

        assert_eq!(d.dim(), (4, 4));
        for i in 0..4 {
            assert_eq!(d[[i, i]], 0.0);
            for j in 0..4 {
                assert_eq!(d[[i, j]], d[[j, i]]);
            }
        }
        assert_eq!(d[[0, 2]], 2.0);
        // duplicates are at distance zero
        assert_eq!(d[[2, 3]], 0.0);
    }

    #[test]
    fn test_condensed_matches_pairwise() {
        let m = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0], vec![3.0]]).unwrap();
        assert_eq!(condensed_distances(&m), vec![1.0, 3.0, 2.0]);

        let single = FeatureMatrix::from_rows(&[vec![0.0]]).unwrap();
        assert!(condensed_distances(&single).is_empty());
    }
}
