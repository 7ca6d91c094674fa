//! CART regression tree.
//!
//! Splits minimise the summed squared error of the two children. Candidate
//! thresholds are midpoints between consecutive distinct feature values and
//! rows with `x[feature] <= threshold` go left. When two splits reduce the
//! error equally, the one met first (lower feature index, then lower
//! threshold) wins, so fitting is deterministic.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::model::error::ModelError;
use crate::model::{check_features, check_training_data, FittedRegressor, Regressor};

/// Nodes with fewer samples than this become leaves.
const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Clone, Debug)]
pub struct DecisionTreeRegressor {
    max_depth: Option<usize>,
    min_samples_leaf: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_leaf: 1,
        }
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n.max(1);
        self
    }

    /// Fit on the rows named by `indices`. Repeated indices weigh a row
    /// several times, which is how bootstrap samples are fed in.
    pub fn fit_indices(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Result<FittedTree, ModelError> {
        check_training_data(x, y)?;
        if indices.is_empty() {
            return Err(ModelError::EmptyData(
                "Cannot grow a tree from zero samples".to_string(),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= x.nrows()) {
            return Err(ModelError::InvalidParameter(format!(
                "sample index {} out of range for {} rows",
                bad,
                x.nrows()
            )));
        }

        let mut builder = TreeBuilder {
            params: self,
            x,
            y,
            nodes: Vec::new(),
        };
        builder.grow(indices.to_vec(), 0);

        Ok(FittedTree {
            nodes: builder.nodes,
            n_features: x.ncols(),
        })
    }
}

impl Regressor for DecisionTreeRegressor {
    type Fitted = FittedTree;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedTree, ModelError> {
        let all: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, &all)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted tree stored as a flat node arena; node 0 is the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl FittedTree {
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

impl FittedRegressor for FittedTree {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_features(self.n_features, x)?;
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// `sum_l² / n_l + sum_r² / n_r`; larger means lower child SSE.
    score: f64,
}

struct TreeBuilder<'a> {
    params: &'a DecisionTreeRegressor,
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let n = indices.len() as f64;
        let sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let mean = sum / n;

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || indices.len() < MIN_SAMPLES_SPLIT {
            return id;
        }
        let sse: f64 = indices.iter().map(|&i| (self.y[i] - mean).powi(2)).sum();
        if sse <= 0.0 {
            return id;
        }

        let Some(split) = self.best_split(&indices, sum * sum / n) else {
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[[i, split.feature]] <= split.threshold);

        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(&self, indices: &[usize], parent_score: f64) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf;
        let total: f64 = indices.iter().map(|&i| self.y[i]).sum();
        // Gains below this are rounding noise.
        let min_gain = 1e-12 * parent_score.abs().max(1.0);

        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature in 0..self.x.ncols() {
            order.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += self.y[order[k - 1]];
                let lo = self.x[[order[k - 1], feature]];
                let hi = self.x[[order[k], feature]];

                if k < min_leaf || n - k < min_leaf || lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;
                if score <= parent_score + min_gain {
                    continue;
                }
                if best.as_ref().map_or(true, |b| score > b.score) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        score,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_tree_fits_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 50.0, 50.0, 50.0];

        let tree = DecisionTreeRegressor::new().fit(&x, &y).unwrap();

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        let pred = tree.predict(&array![[0.0], [6.0], [7.0], [100.0]]).unwrap();
        assert_eq!(pred.to_vec(), vec![5.0, 5.0, 50.0, 50.0]);
    }

    #[test]
    fn test_tree_picks_informative_feature() {
        // Feature 0 is noise, feature 1 decides the target.
        let x = array![[3.0, 0.0], [1.0, 0.0], [2.0, 1.0], [4.0, 1.0]];
        let y = array![0.0, 0.0, 10.0, 10.0];

        let tree = DecisionTreeRegressor::new().fit(&x, &y).unwrap();
        let pred = tree.predict(&x).unwrap();
        assert_eq!(pred, y);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_tree_respects_max_depth() {
        let x = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(32, |i| (i * i) as f64);

        let tree = DecisionTreeRegressor::new()
            .with_max_depth(3)
            .fit(&x, &y)
            .unwrap();
        assert!(tree.depth() <= 3);
        assert!(tree.n_leaves() <= 8);
    }

    #[test]
    fn test_tree_constant_target_is_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![7.0, 7.0, 7.0];

        let tree = DecisionTreeRegressor::new().fit(&x, &y).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&array![[42.0]]).unwrap()[0], 7.0);
    }

    #[test]
    fn test_tree_identical_rows_do_not_split() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = array![1.0, 2.0, 3.0];

        let tree = DecisionTreeRegressor::new().fit(&x, &y).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert!((tree.predict(&x).unwrap()[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_indices_with_repeats() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 9.0];

        // Row 1 three times, row 0 once: a stump can still separate them.
        let tree = DecisionTreeRegressor::new()
            .fit_indices(&x, &y, &[1, 1, 0, 1])
            .unwrap();
        assert_eq!(tree.predict(&x).unwrap().to_vec(), vec![0.0, 9.0]);
    }

    #[test]
    fn test_fit_indices_out_of_range() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        assert!(matches!(
            DecisionTreeRegressor::new().fit_indices(&x, &y, &[0, 5]),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![100.0, 0.0, 0.0, 0.0];

        let tree = DecisionTreeRegressor::new()
            .with_min_samples_leaf(2)
            .fit(&x, &y)
            .unwrap();
        // The outlier cannot be isolated into a leaf of one.
        let pred = tree.predict(&array![[1.0]]).unwrap();
        assert!((pred[0] - 50.0).abs() < 1e-12);
    }
}
