//! Dataset container plus the train/test and cross-validation splitters.
use std::collections::BTreeMap;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::math::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f32>,
    pub y: Array1<i32>,
    pub feature_names: Vec<String>,
}

/// Held-out partition of a dataset.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

/// Row indices for one cross-validation round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Dataset {
    pub fn new(x: Array2<f32>, y: Array1<i32>, feature_names: Vec<String>) -> Result<Self> {
        if x.nrows() != y.len() {
            bail!(
                "Feature matrix has {} rows but {} labels were given",
                x.nrows(),
                y.len()
            );
        }
        if x.ncols() != feature_names.len() {
            bail!(
                "Feature matrix has {} columns but {} feature names were given",
                x.ncols(),
                feature_names.len()
            );
        }
        Ok(Dataset {
            x,
            y,
            feature_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Number of samples per label, ordered by label.
    pub fn class_counts(&self) -> BTreeMap<i32, usize> {
        let mut counts = BTreeMap::new();
        for &label in self.y.iter() {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select_rows(indices),
            y: self.y.select(indices),
            feature_names: self.feature_names.clone(),
        }
    }

    pub fn log_summary(&self) {
        log::info!("----- Input Data Summary -----");
        log::info!(
            "{} samples, {} feature columns",
            self.n_samples(),
            self.n_features()
        );
        for (label, count) in self.class_counts() {
            log::info!("class {}: {} samples", label, count);
        }
        log::info!("------------------------------");
    }
}

/// Shuffle the rows with a seeded generator and hold out `ceil(test_size * n)` of them.
pub fn train_test_split(dataset: &Dataset, test_size: f64, random_state: u64) -> Result<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        bail!("test_size must be in the open interval (0, 1), got {}", test_size);
    }
    let n = dataset.n_samples();
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        bail!(
            "test_size={} with {} samples leaves an empty train or test set",
            test_size,
            n
        );
    }

    let mut rng = StdRng::seed_from_u64(random_state);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    Ok(Split {
        train: dataset.select(train_idx),
        test: dataset.select(test_idx),
    })
}

/// Stratified k-fold without shuffling.
///
/// The rows of every class, in their original order, are cut into `k`
/// contiguous chunks whose sizes differ by at most one. Fold `i` tests on the
/// `i`-th chunk of each class.
pub fn stratified_kfold(y: &Array1<i32>, k: usize) -> Result<Vec<Fold>> {
    let n = y.len();
    if k < 2 {
        bail!("Cross-validation needs at least 2 folds, got {}", k);
    }
    if k > n {
        bail!("Cannot split {} samples into {} folds", n, k);
    }

    let mut by_class: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in y.iter().enumerate() {
        by_class.entry(label).or_default().push(idx);
    }

    let largest = by_class.values().map(Vec::len).max().unwrap_or(0);
    if largest < k {
        bail!(
            "n_splits={} cannot be greater than the number of members in each class",
            k
        );
    }

    if let Some(smallest) = by_class.values().map(|v| v.len()).min() {
        if smallest < k {
            log::warn!(
                "The least populated class has only {} members, which is less than {} folds",
                smallest,
                k
            );
        }
    }

    let mut fold_of = vec![0usize; n];
    for members in by_class.values() {
        let base = members.len() / k;
        let extra = members.len() % k;
        let mut start = 0;
        for fold in 0..k {
            let size = base + usize::from(fold < extra);
            for &idx in &members[start..start + size] {
                fold_of[idx] = fold;
            }
            start += size;
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) = (0..n).partition(|&i| fold_of[i] == fold);
            Fold { train, test }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy(n: usize) -> Dataset {
        let x = Array2::from_shape_vec((n, 1), (0..n).map(|v| v as f32).collect()).unwrap();
        let y = Array1::from_vec((0..n).map(|v| (v % 2) as i32).collect());
        Dataset::new(x, y, vec!["value".to_string()]).unwrap()
    }

    #[test]
    fn split_sizes_round_test_up() {
        let data = toy(11);
        let split = train_test_split(&data, 0.2, 42).unwrap();
        assert_eq!(split.test.n_samples(), 3);
        assert_eq!(split.train.n_samples(), 8);

        let mut seen: Vec<f32> = split
            .train
            .x
            .as_slice()
            .iter()
            .chain(split.test.x.as_slice())
            .copied()
            .collect();
        seen.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(seen, (0..11).map(|v| v as f32).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_reproducible() {
        let data = toy(20);
        let a = train_test_split(&data, 0.25, 7).unwrap();
        let b = train_test_split(&data, 0.25, 7).unwrap();
        assert_eq!(a.test.x, b.test.x);
    }

    #[test]
    fn split_rejects_degenerate_sizes() {
        let data = toy(4);
        assert!(train_test_split(&data, 0.0, 1).is_err());
        assert!(train_test_split(&data, 1.0, 1).is_err());
        assert!(train_test_split(&toy(1), 0.5, 1).is_err());
    }

    #[test]
    fn kfold_keeps_class_balance() {
        let y = Array1::from_vec(vec![0, 0, 0, 0, 0, 0, 1, 1, 1]);
        let folds = stratified_kfold(&y, 3).unwrap();
        assert_eq!(folds.len(), 3);
        for fold in &folds {
            let zeros = fold.test.iter().filter(|&&i| y[i] == 0).count();
            let ones = fold.test.iter().filter(|&&i| y[i] == 1).count();
            assert_eq!((zeros, ones), (2, 1));
            assert_eq!(fold.train.len() + fold.test.len(), 9);
        }
        assert_eq!(folds[0].test, vec![0, 1, 6]);
    }

    #[test]
    fn kfold_covers_every_row_once() {
        let y = Array1::from_vec(vec![1, 0, 1, 1, 0, 1, 0]);
        let folds = stratified_kfold(&y, 2).unwrap();
        let mut tested: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        tested.sort_unstable();
        assert_eq!(tested, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn kfold_validates_k() {
        let y = Array1::from_vec(vec![0, 1]);
        assert!(stratified_kfold(&y, 1).is_err());
        assert!(stratified_kfold(&y, 3).is_err());
    }

    #[test]
    fn kfold_rejects_classes_smaller_than_k() {
        let y = Array1::from_vec(vec![0, 0, 1, 1, 2, 2]);
        let err = stratified_kfold(&y, 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "n_splits=3 cannot be greater than the number of members in each class"
        );

        // One large enough class is sufficient; the others only trigger a warning.
        let y = Array1::from_vec(vec![0, 0, 0, 1, 1, 2]);
        let folds = stratified_kfold(&y, 3).unwrap();
        assert!(folds.iter().all(|f| !f.test.is_empty()));
    }
}
