//! Stratified k-fold cross-validation

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One fold's index partition
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter preserving the class ratio per fold
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Partition sample indices into folds, shuffled within each class.
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CVSplit>> {
        if self.n_splits < 2 {
            return Err(ChurnError::ValidationError(
                "cross-validation requires at least 2 splits".to_string(),
            ));
        }

        let mut pos: Vec<usize> = Vec::new();
        let mut neg: Vec<usize> = Vec::new();
        for (i, &v) in y.iter().enumerate() {
            if v >= 0.5 {
                pos.push(i);
            } else {
                neg.push(i);
            }
        }
        if pos.len() < self.n_splits || neg.len() < self.n_splits {
            return Err(ChurnError::ValidationError(format!(
                "each class needs at least {} samples for {}-fold stratification",
                self.n_splits, self.n_splits
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        pos.shuffle(&mut rng);
        neg.shuffle(&mut rng);

        // round-robin assignment keeps fold sizes within one sample per class
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for (i, &idx) in neg.iter().chain(pos.iter()).enumerate() {
            folds[i % self.n_splits].push(idx);
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let test_indices = folds[fold_idx].clone();
                let train_indices = folds
                    .iter()
                    .enumerate()
                    .filter(|(f, _)| *f != fold_idx)
                    .flat_map(|(_, fold)| fold.iter().copied())
                    .collect();
                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn labels(n_neg: usize, n_pos: usize) -> Array1<f64> {
        let mut v = vec![0.0; n_neg];
        v.extend(vec![1.0; n_pos]);
        Array1::from_vec(v)
    }

    #[test]
    fn test_folds_partition_all_samples() {
        let y = labels(30, 20);
        let splits = StratifiedKFold::new(5, 42).split(&y).unwrap();
        assert_eq!(splits.len(), 5);

        let mut seen: HashSet<usize> = HashSet::new();
        for split in &splits {
            for &idx in &split.test_indices {
                assert!(seen.insert(idx), "index {} in two test folds", idx);
            }
        }
        assert_eq!(seen.len(), 50);
    }

    #[test]
    fn test_train_test_disjoint() {
        let y = labels(30, 20);
        for split in StratifiedKFold::new(5, 42).split(&y).unwrap() {
            let test: HashSet<usize> = split.test_indices.iter().copied().collect();
            assert!(split.train_indices.iter().all(|i| !test.contains(i)));
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 50);
        }
    }

    #[test]
    fn test_stratification_preserved() {
        let y = labels(40, 10);
        for split in StratifiedKFold::new(5, 42).split(&y).unwrap() {
            let pos_in_test = split.test_indices.iter().filter(|&&i| y[i] >= 0.5).count();
            assert_eq!(pos_in_test, 2);
        }
    }

    #[test]
    fn test_too_few_samples_is_error() {
        let y = labels(3, 10);
        assert!(StratifiedKFold::new(5, 42).split(&y).is_err());
    }

    #[test]
    fn test_deterministic_under_seed() {
        let y = labels(15, 15);
        let a = StratifiedKFold::new(5, 7).split(&y).unwrap();
        let b = StratifiedKFold::new(5, 7).split(&y).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }
}
