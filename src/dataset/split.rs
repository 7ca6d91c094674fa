//! Seeded train/held-out partitioning.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a train/held-out partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_samples` with a seeded generator and cut off the held-out part.
///
/// The held-out size is `ceil(n_samples * test_ratio)`, capped so that at
/// least one row stays in the training part. The same `(n_samples,
/// test_ratio, seed)` always yields the same partition.
pub fn train_test_split(n_samples: usize, test_ratio: f64, seed: u64) -> TrainTestSplit {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_samples as f64) * test_ratio).ceil() as usize;
    let n_test = n_test.min(n_samples.saturating_sub(1));

    let test = indices.split_off(n_samples - n_test);
    TrainTestSplit {
        train: indices,
        test,
    }
}
