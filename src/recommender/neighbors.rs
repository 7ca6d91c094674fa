//! Brute-force Euclidean nearest-neighbor index.

use ndarray::{Array1, Array2, ArrayView1};

use crate::dataset::PropertyId;

/// One fitted row and the listing it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedRow {
    pub id: PropertyId,
    pub features: Array1<f64>,
}

/// A query hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub id: PropertyId,
    pub distance: f64,
}

/// Rows are stored together with their ids, so a hit always maps back to
/// the listing it was fitted from.
#[derive(Clone, Debug)]
pub struct NeighborIndex {
    rows: Vec<IndexedRow>,
    n_neighbors: usize,
}

impl NeighborIndex {
    /// Build an index over `features`, pairing row `i` with `ids[i]`.
    ///
    /// Returns `None` when the lengths differ.
    pub fn fit(ids: &[PropertyId], features: &Array2<f64>, n_neighbors: usize) -> Option<Self> {
        if ids.len() != features.nrows() {
            return None;
        }
        let rows = ids
            .iter()
            .zip(features.rows())
            .map(|(&id, row)| IndexedRow {
                id,
                features: row.to_owned(),
            })
            .collect();
        Some(Self { rows, n_neighbors })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn rows(&self) -> &[IndexedRow] {
        &self.rows
    }

    /// The `n_neighbors` closest rows to `query`, nearest first. Equal
    /// distances keep fitted row order.
    pub fn kneighbors(&self, query: ArrayView1<f64>) -> Vec<Neighbor> {
        let mut hits: Vec<(usize, Neighbor)> = self
            .rows
            .iter()
            .enumerate()
            .map(|(pos, row)| {
                let distance = (&row.features - &query)
                    .mapv(|d| d * d)
                    .sum()
                    .sqrt();
                (pos, Neighbor { id: row.id, distance })
            })
            .collect();

        hits.sort_by(|(pa, a), (pb, b)| a.distance.total_cmp(&b.distance).then(pa.cmp(pb)));
        hits.truncate(self.n_neighbors);
        hits.into_iter().map(|(_, n)| n).collect()
    }
}
