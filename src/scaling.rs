//! Min-max normalization with logarithmic target pre-scaling.
//!
//! Regression targets in this crate's domain tend to grow exponentially, so
//! the output space is linearized with `ln` before the min-max step; the
//! bounds captured afterwards therefore describe *log-space* targets, and the
//! full inverse of the output pipeline is `denormalize_vec` followed by
//! [`unscale_log`].
//!
//! The per-feature bounds ([`MinMax`]) are pure data: recomputed by every
//! [`normalize_dataset`] call, read repeatedly afterwards for denormalization
//! and interactive inference. They go stale if the dataset changes.

use crate::{Dataset, Error, Result};

/// Values `<= 0` are clamped to this before taking the natural logarithm, so
/// log-scaling stays defined for the occasional zero in otherwise
/// strictly-positive targets.
pub const LOG_EPSILON: f32 = 1e-11;

/// Per-feature `(min, max)` bounds observed over a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMax {
    bounds: Vec<(f32, f32)>,
}

impl MinMax {
    fn with_features(num_features: usize) -> Self {
        Self {
            bounds: vec![(f32::MAX, f32::MIN); num_features],
        }
    }

    fn observe(&mut self, row: &[f32]) {
        debug_assert_eq!(row.len(), self.bounds.len());
        for (bound, &value) in self.bounds.iter_mut().zip(row) {
            bound.0 = bound.0.min(value);
            bound.1 = bound.1.max(value);
        }
    }

    #[inline]
    pub fn num_features(&self) -> usize {
        self.bounds.len()
    }

    #[inline]
    /// Returns the `(min, max)` pair for feature `idx`.
    ///
    /// Panics if `idx >= num_features`.
    pub fn feature(&self, idx: usize) -> (f32, f32) {
        self.bounds[idx]
    }

    /// Build a tracker from explicit per-feature bounds.
    ///
    /// Mostly useful in tests and for reusing bounds captured elsewhere.
    pub fn from_bounds(bounds: Vec<(f32, f32)>) -> Result<Self> {
        for (i, &(min, max)) in bounds.iter().enumerate() {
            if min > max {
                return Err(Error::InvalidData(format!(
                    "feature {i} has min {min} > max {max}"
                )));
            }
        }
        Ok(Self { bounds })
    }
}

/// The input-space and output-space bounds captured by one normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBounds {
    pub inputs: MinMax,
    pub outputs: MinMax,
}

/// Normalize a whole dataset in place into `[new_min, new_max]`.
///
/// Every target vector is log-scaled first; per-feature bounds are then
/// computed over the full dataset for the input and output spaces separately,
/// and finally every row is min-max rescaled. Returns the captured bounds for
/// later denormalization.
///
/// A constant-valued feature (`max == min`) maps to `new_min`: the column
/// carries no information, so it is treated as an already-normalized constant
/// rather than a data-quality error.
pub fn normalize_dataset(data: &mut Dataset, new_min: f32, new_max: f32) -> DatasetBounds {
    let mut inputs = MinMax::with_features(data.input_dim());
    let mut outputs = MinMax::with_features(data.target_dim());

    for idx in 0..data.len() {
        scale_log(data.target_mut(idx));
        inputs.observe(data.input(idx));
        outputs.observe(data.target(idx));
    }

    for idx in 0..data.len() {
        normalize_vec(data.input_mut(idx), &inputs, new_min, new_max);
        normalize_vec(data.target_mut(idx), &outputs, new_min, new_max);
    }

    DatasetBounds { inputs, outputs }
}

/// Min-max rescale one vector into `[new_min, new_max]` given precomputed
/// bounds: `(x - min) / (max - min) * (new_max - new_min) + new_min`.
///
/// Shape contract: `values.len() == bounds.num_features()`.
pub fn normalize_vec(values: &mut [f32], bounds: &MinMax, new_min: f32, new_max: f32) {
    assert_eq!(
        values.len(),
        bounds.num_features(),
        "vector len {} does not match tracked feature count {}",
        values.len(),
        bounds.num_features()
    );

    let factor = new_max - new_min;
    for (value, &(min, max)) in values.iter_mut().zip(&bounds.bounds) {
        if max == min {
            *value = new_min;
        } else {
            *value = (*value - min) / (max - min) * factor + new_min;
        }
    }
}

/// Invert the min-max rescale: map values from `[old_min, old_max]` back into
/// the per-feature ranges recorded in `bounds`.
///
/// When `clamp` is set, values are clamped into `[old_min, old_max]` first,
/// guarding against predictions that fall outside the trained range.
///
/// A vector whose length does not match the tracked feature count is a
/// configuration bug; it surfaces as `Error::ShapeMismatch`.
pub fn denormalize_vec(
    values: &mut [f32],
    bounds: &MinMax,
    old_min: f32,
    old_max: f32,
    clamp: bool,
) -> Result<()> {
    if values.len() != bounds.num_features() {
        return Err(Error::ShapeMismatch(format!(
            "vector len {} does not match tracked feature count {}",
            values.len(),
            bounds.num_features()
        )));
    }

    let factor = old_max - old_min;
    for (value, &(min, max)) in values.iter_mut().zip(&bounds.bounds) {
        if clamp {
            *value = value.clamp(old_min, old_max);
        }
        *value = (*value - old_min) / factor * (max - min) + min;
    }

    Ok(())
}

/// Element-wise natural logarithm with the [`LOG_EPSILON`] clamp.
pub fn scale_log(values: &mut [f32]) {
    for value in values.iter_mut() {
        if *value <= 0.0 {
            *value = LOG_EPSILON;
        }
        *value = value.ln();
    }
}

/// Element-wise exponential; inverse of [`scale_log`] for positive inputs.
pub fn unscale_log(values: &mut [f32]) {
    for value in values.iter_mut() {
        *value = value.exp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_dataset() -> Dataset {
        Dataset::from_rows(
            &[vec![1.0], vec![2.0], vec![3.0], vec![4.0]],
            &[vec![10.0], vec![20.0], vec![30.0], vec![40.0]],
        )
        .unwrap()
    }

    #[test]
    fn normalize_maps_linear_dataset_into_unit_range() {
        let mut data = linear_dataset();
        let bounds = normalize_dataset(&mut data, 0.0, 1.0);

        assert_eq!(bounds.inputs.feature(0), (1.0, 4.0));
        // Outputs were log-scaled before the bounds were captured.
        let (out_min, out_max) = bounds.outputs.feature(0);
        assert!((out_min - 10.0_f32.ln()).abs() < 1e-6);
        assert!((out_max - 40.0_f32.ln()).abs() < 1e-6);

        assert!((data.input(0)[0] - 0.0).abs() < 1e-6);
        assert!((data.input(3)[0] - 1.0).abs() < 1e-6);

        // ln(20) sits at ln(2)/ln(4) of the way between ln(10) and ln(40).
        let expected = (20.0_f32.ln() - 10.0_f32.ln()) / (40.0_f32.ln() - 10.0_f32.ln());
        assert!((data.target(1)[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn normalized_values_stay_inside_target_range() {
        let mut data = Dataset::from_rows(
            &[
                vec![-5.0, 100.0],
                vec![3.0, 250.0],
                vec![7.5, 80.0],
                vec![0.0, 400.0],
            ],
            &[vec![1.0], vec![2.5], vec![9.0], vec![4.0]],
        )
        .unwrap();

        normalize_dataset(&mut data, -1.0, 1.0);

        for idx in 0..data.len() {
            for &v in data.input(idx).iter().chain(data.target(idx)) {
                assert!((-1.0..=1.0).contains(&v), "value {v} escaped [-1, 1]");
            }
        }
    }

    #[test]
    fn normalize_then_denormalize_roundtrips() {
        let bounds = MinMax::from_bounds(vec![(1.0, 4.0), (-2.0, 6.0)]).unwrap();
        let original = [2.5_f32, -1.0];

        let mut values = original;
        normalize_vec(&mut values, &bounds, 0.0, 1.0);
        denormalize_vec(&mut values, &bounds, 0.0, 1.0, false).unwrap();

        for (got, want) in values.iter().zip(&original) {
            assert!((got - want).abs() < 1e-5);
        }
    }

    #[test]
    fn constant_feature_maps_to_new_min() {
        let mut data = Dataset::from_rows(
            &[vec![5.0, 1.0], vec![5.0, 2.0]],
            &[vec![1.0], vec![2.0]],
        )
        .unwrap();

        normalize_dataset(&mut data, 0.25, 0.75);

        assert_eq!(data.input(0)[0], 0.25);
        assert_eq!(data.input(1)[0], 0.25);
    }

    #[test]
    fn denormalize_rejects_mismatched_vector() {
        let bounds = MinMax::from_bounds(vec![(0.0, 1.0), (0.0, 1.0)]).unwrap();
        let mut values = [0.5_f32];
        let err = denormalize_vec(&mut values, &bounds, 0.0, 1.0, false).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
        // The vector is untouched on failure.
        assert_eq!(values, [0.5]);
    }

    #[test]
    fn denormalize_clamps_out_of_range_predictions() {
        let bounds = MinMax::from_bounds(vec![(10.0, 20.0)]).unwrap();
        let mut values = [1.5_f32];
        denormalize_vec(&mut values, &bounds, 0.0, 1.0, true).unwrap();
        assert!((values[0] - 20.0).abs() < 1e-6);
    }

    #[test]
    fn log_scale_roundtrips_for_positive_values() {
        let original = [0.5_f32, 1.0, 123.0];
        let mut values = original;
        scale_log(&mut values);
        unscale_log(&mut values);
        for (got, want) in values.iter().zip(&original) {
            assert!((got - want).abs() / want < 1e-5);
        }
    }

    #[test]
    fn log_scale_clamps_non_positive_values() {
        let mut values = [0.0_f32, -3.0];
        scale_log(&mut values);
        unscale_log(&mut values);
        for &v in &values {
            assert!((v - LOG_EPSILON).abs() < 1e-13);
        }
    }

    #[test]
    fn from_bounds_rejects_inverted_range() {
        assert!(MinMax::from_bounds(vec![(2.0, 1.0)]).is_err());
    }
}
