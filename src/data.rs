//! Contiguous dataset storage.
//!
//! The training loop operates on slices to avoid per-step allocations.
//! `Dataset` provides validated, row-major storage for feature/target
//! matrices; the normalization pass rewrites rows in place through the
//! `*_mut` accessors.

use rand::Rng;

use crate::{Error, Result};

/// A supervised dataset: inputs (X) and targets (Y).
///
/// Stored as contiguous buffers with row-major layout:
/// - `inputs.len() == len * input_dim`
/// - `targets.len() == len * target_dim`
///
/// Insertion order is preserved; it only matters for reporting and the
/// splitting utilities, never for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Vec<f32>,
    targets: Vec<f32>,
    len: usize,
    input_dim: usize,
    target_dim: usize,
}

impl Dataset {
    /// Build a dataset from flat buffers.
    ///
    /// `inputs` is `(len, input_dim)` and `targets` is `(len, target_dim)`.
    pub fn from_flat(
        inputs: Vec<f32>,
        targets: Vec<f32>,
        input_dim: usize,
        target_dim: usize,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if target_dim == 0 {
            return Err(Error::InvalidData("target_dim must be > 0".to_owned()));
        }
        if inputs.len() % input_dim != 0 {
            return Err(Error::InvalidData(format!(
                "inputs length {} is not divisible by input_dim {input_dim}",
                inputs.len()
            )));
        }

        let len = inputs.len() / input_dim;
        if targets.len() != len * target_dim {
            return Err(Error::InvalidData(format!(
                "targets length {} does not match len * target_dim ({len} * {target_dim})",
                targets.len()
            )));
        }

        Ok(Self {
            inputs,
            targets,
            len,
            input_dim,
            target_dim,
        })
    }

    /// Build a dataset from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(inputs: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }
        if inputs.len() != targets.len() {
            return Err(Error::InvalidData(format!(
                "inputs/targets length mismatch: {} vs {}",
                inputs.len(),
                targets.len()
            )));
        }

        let input_dim = inputs[0].len();
        let target_dim = targets[0].len();
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if target_dim == 0 {
            return Err(Error::InvalidData("target_dim must be > 0".to_owned()));
        }

        let mut inputs_flat = Vec::with_capacity(inputs.len() * input_dim);
        for (i, row) in inputs.iter().enumerate() {
            if row.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    row.len()
                )));
            }
            inputs_flat.extend_from_slice(row);
        }

        let mut targets_flat = Vec::with_capacity(targets.len() * target_dim);
        for (i, row) in targets.iter().enumerate() {
            if row.len() != target_dim {
                return Err(Error::InvalidData(format!(
                    "target row {i} has len {}, expected {target_dim}",
                    row.len()
                )));
            }
            targets_flat.extend_from_slice(row);
        }

        Self::from_flat(inputs_flat, targets_flat, input_dim, target_dim)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    /// Returns the per-sample input dimension.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    /// Returns the per-sample target dimension.
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    /// Returns the `idx`-th input row (shape: `(input_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f32] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th target row (shape: `(target_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn target(&self, idx: usize) -> &[f32] {
        let start = idx * self.target_dim;
        &self.targets[start..start + self.target_dim]
    }

    #[inline]
    /// Mutable view of the `idx`-th input row, for in-place rescaling.
    pub fn input_mut(&mut self, idx: usize) -> &mut [f32] {
        let start = idx * self.input_dim;
        &mut self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Mutable view of the `idx`-th target row, for in-place rescaling.
    pub fn target_mut(&mut self, idx: usize) -> &mut [f32] {
        let start = idx * self.target_dim;
        &mut self.targets[start..start + self.target_dim]
    }

    /// Split into (training, validation) by drawing a percentage lot per sample.
    ///
    /// Each sample lands in the training half with probability
    /// `training_percentage / 100`. Either half may come back empty; callers
    /// that feed a half to training or scoring must check `is_empty` first.
    pub fn split_randomly<R: Rng + ?Sized>(
        &self,
        training_percentage: f64,
        rng: &mut R,
    ) -> (Dataset, Dataset) {
        if training_percentage <= 0.0 {
            return (self.empty_like(), self.clone());
        }

        let mut training = self.empty_like();
        let mut validation = self.empty_like();

        for idx in 0..self.len {
            let half = if rng.gen_range(0.0..100.0) <= training_percentage {
                &mut training
            } else {
                &mut validation
            };
            half.push_row(self.input(idx), self.target(idx));
        }

        (training, validation)
    }

    /// Split by thresholding one input feature: rows with
    /// `input[feature] <= threshold` land in the first half.
    ///
    /// Panics if `feature >= input_dim`.
    pub fn split_with_threshold(&self, feature: usize, threshold: f32) -> (Dataset, Dataset) {
        assert!(
            feature < self.input_dim,
            "threshold feature {feature} out of range for input_dim {}",
            self.input_dim
        );

        let mut below_or_equal = self.empty_like();
        let mut above = self.empty_like();

        for idx in 0..self.len {
            let half = if self.input(idx)[feature] <= threshold {
                &mut below_or_equal
            } else {
                &mut above
            };
            half.push_row(self.input(idx), self.target(idx));
        }

        (below_or_equal, above)
    }

    fn empty_like(&self) -> Dataset {
        Dataset {
            inputs: Vec::new(),
            targets: Vec::new(),
            len: 0,
            input_dim: self.input_dim,
            target_dim: self.target_dim,
        }
    }

    fn push_row(&mut self, input: &[f32], target: &[f32]) {
        debug_assert_eq!(input.len(), self.input_dim);
        debug_assert_eq!(target.len(), self.target_dim);
        self.inputs.extend_from_slice(input);
        self.targets.extend_from_slice(target);
        self.len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn four_rows() -> Dataset {
        Dataset::from_rows(
            &[vec![1.0], vec![2.0], vec![3.0], vec![4.0]],
            &[vec![10.0], vec![20.0], vec![30.0], vec![40.0]],
        )
        .unwrap()
    }

    #[test]
    fn from_flat_validates_shapes() {
        let ok = Dataset::from_flat(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0], 2, 1);
        assert!(ok.is_ok());

        let err = Dataset::from_flat(vec![0.0, 1.0, 2.0], vec![0.0], 2, 1);
        assert!(err.is_err());
    }

    #[test]
    fn from_rows_rejects_empty_and_ragged_input() {
        assert!(Dataset::from_rows(&[], &[]).is_err());
        assert!(Dataset::from_rows(&[vec![1.0], vec![1.0, 2.0]], &[vec![0.0], vec![0.0]]).is_err());
    }

    #[test]
    fn mutable_rows_alias_storage() {
        let mut data = four_rows();
        data.input_mut(2)[0] = 9.0;
        data.target_mut(0)[0] = -1.0;
        assert_eq!(data.input(2), &[9.0]);
        assert_eq!(data.target(0), &[-1.0]);
    }

    #[test]
    fn random_split_partitions_all_samples() {
        let data = four_rows();
        let mut rng = StdRng::seed_from_u64(7);
        let (train, val) = data.split_randomly(50.0, &mut rng);
        assert_eq!(train.len() + val.len(), data.len());

        let (none, all) = data.split_randomly(0.0, &mut rng);
        assert!(none.is_empty());
        assert_eq!(all, data);
    }

    #[test]
    fn threshold_split_is_order_preserving() {
        let data = four_rows();
        let (low, high) = data.split_with_threshold(0, 2.0);
        assert_eq!(low.len(), 2);
        assert_eq!(high.len(), 2);
        assert_eq!(low.input(0), &[1.0]);
        assert_eq!(low.input(1), &[2.0]);
        assert_eq!(high.input(0), &[3.0]);
    }
}
