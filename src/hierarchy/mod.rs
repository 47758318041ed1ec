//! Merge trees produced by agglomerative clustering.
//!
//! A [`Dendrogram`] records every merge of a bottom-up clustering run: which
//! two clusters joined and at what linkage distance. Cutting it yields flat
//! clusterings at any granularity, either by target cluster count
//! ([`Dendrogram::cut_to_k`]) or by distance threshold
//! ([`Dendrogram::cut_at_distance`]).
//!
//! ```text
//!  distance
//!     9.0 ┤      ┌──────┴──────┐
//!         │      │             │
//!     1.0 ┤   ┌──┴──┐          │
//!         │   │     │          │
//!         └── 0 ─── 1 ──────── 2
//! ```

mod dendrogram;

pub use dendrogram::{Dendrogram, DendrogramNode};
pub(crate) use dendrogram::UnionFind;
