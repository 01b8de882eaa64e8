//! Accuracy metrics.
//!
//! Metrics are evaluation helpers (they do not participate in backprop). Each
//! runs forward-only passes over a dataset and accumulates in `f64` to keep
//! long sums stable.
//!
//! Two R² definitions are kept side by side on purpose. They agree on a good
//! model but diverge on an arbitrarily bad one: the explained-variance ratio
//! is unbounded above, the conventional formula unbounded below. Neither is
//! treated as "the" R²; [`R2Variant`] names them and the caller picks.

use std::str::FromStr;

use crate::{Dataset, Error, Network, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which R² formula to treat as primary when reporting.
pub enum R2Variant {
    /// The explained-variance ratio `sum((pred - mean)^2) / sum((y - mean)^2)`.
    #[default]
    ExplainedVariance,
    /// The conventional `1 - sum((y - pred)^2) / sum((y - mean)^2)`.
    Conventional,
}

impl R2Variant {
    /// Compute this variant's per-output-feature scores.
    pub fn score(self, network: &Network, data: &Dataset) -> Result<Vec<f64>> {
        match self {
            R2Variant::ExplainedVariance => r2_score(network, data),
            R2Variant::Conventional => r2_score_alternate(network, data),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            R2Variant::ExplainedVariance => "explained variance",
            R2Variant::Conventional => "conventional",
        }
    }
}

impl FromStr for R2Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "explained-variance" => Ok(R2Variant::ExplainedVariance),
            "conventional" => Ok(R2Variant::Conventional),
            other => Err(format!(
                "unknown r2 variant {other:?}; expected \"explained-variance\" or \"conventional\""
            )),
        }
    }
}

fn check_pair(network: &Network, data: &Dataset) -> Result<()> {
    if data.is_empty() {
        return Err(Error::InvalidData("dataset must not be empty".to_owned()));
    }
    if data.input_dim() != network.input_dim() {
        return Err(Error::ShapeMismatch(format!(
            "dataset input_dim {} does not match network input_dim {}",
            data.input_dim(),
            network.input_dim()
        )));
    }
    if data.target_dim() != network.output_dim() {
        return Err(Error::ShapeMismatch(format!(
            "dataset target_dim {} does not match network output_dim {}",
            data.target_dim(),
            network.output_dim()
        )));
    }
    Ok(())
}

/// Mean over all samples of the per-sample MSE loss.
pub fn mean_squared_error(network: &Network, data: &Dataset) -> Result<f64> {
    check_pair(network, data)?;

    let mut scratch = network.scratch();
    let mut total = 0.0_f64;
    for idx in 0..data.len() {
        network.forward(data.input(idx), &mut scratch);
        total += f64::from(crate::loss::mse(scratch.output(), data.target(idx)));
    }
    Ok(total / data.len() as f64)
}

/// Explained-variance ratio per output feature:
/// `sum((pred_i - y_mean_i)^2) / sum((y_i - y_mean_i)^2)`.
///
/// Note this is *not* the conventional R²; see [`r2_score_alternate`].
pub fn r2_score(network: &Network, data: &Dataset) -> Result<Vec<f64>> {
    check_pair(network, data)?;

    let mut scratch = network.scratch();
    let mut scores = Vec::with_capacity(data.target_dim());

    for feature in 0..data.target_dim() {
        let y_cross = cross_sample_mean(data, feature);

        let mut sqe = 0.0_f64;
        let mut sqt = 0.0_f64;
        for idx in 0..data.len() {
            network.forward(data.input(idx), &mut scratch);
            let pred = f64::from(scratch.output()[feature]);
            let y = f64::from(data.target(idx)[feature]);

            sqe += (pred - y_cross).powi(2);
            sqt += (y - y_cross).powi(2);
        }

        scores.push(sqe / sqt);
    }

    Ok(scores)
}

/// Conventional R² per output feature:
/// `1 - sum((y_i - pred_i)^2) / sum((y_i - y_mean_i)^2)`.
pub fn r2_score_alternate(network: &Network, data: &Dataset) -> Result<Vec<f64>> {
    check_pair(network, data)?;

    let mut scratch = network.scratch();
    let mut scores = Vec::with_capacity(data.target_dim());

    for feature in 0..data.target_dim() {
        let y_cross = cross_sample_mean(data, feature);

        let mut sqr = 0.0_f64;
        let mut sqt = 0.0_f64;
        for idx in 0..data.len() {
            network.forward(data.input(idx), &mut scratch);
            let pred = f64::from(scratch.output()[feature]);
            let y = f64::from(data.target(idx)[feature]);

            sqr += (y - pred).powi(2);
            sqt += (y - y_cross).powi(2);
        }

        scores.push(1.0 - sqr / sqt);
    }

    Ok(scores)
}

fn cross_sample_mean(data: &Dataset, feature: usize) -> f64 {
    let mut sum = 0.0_f64;
    for idx in 0..data.len() {
        sum += f64::from(data.target(idx)[feature]);
    }
    sum / data.len() as f64
}

/// Element-wise `target - prediction`.
///
/// Shape contract: `target.len() == prediction.len()`.
pub fn diff(target: &[f32], prediction: &[f32]) -> Vec<f32> {
    assert_eq!(
        target.len(),
        prediction.len(),
        "target len {} does not match prediction len {}",
        target.len(),
        prediction.len()
    );
    target.iter().zip(prediction).map(|(t, p)| t - p).collect()
}

/// Element-wise `(target - prediction) / target`.
///
/// A zero target component produces an infinite or NaN entry; callers own
/// that case.
pub fn relative_diff(target: &[f32], prediction: &[f32]) -> Vec<f32> {
    let mut out = diff(target, prediction);
    for (d, &t) in out.iter_mut().zip(target) {
        *d /= t;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, Layer};

    /// A 1-in/1-out network that reproduces its input exactly.
    fn identity_network() -> Network {
        let layer = Layer::from_parts(1, 1, Activation::Identity, vec![1.0], vec![0.0]).unwrap();
        Network::from_layers(vec![layer])
    }

    /// Targets equal inputs, so the identity network predicts perfectly.
    fn perfectly_predictable() -> Dataset {
        Dataset::from_rows(
            &[vec![1.0], vec![2.0], vec![3.0]],
            &[vec![1.0], vec![2.0], vec![3.0]],
        )
        .unwrap()
    }

    #[test]
    fn mse_is_zero_for_perfect_predictions() {
        let net = identity_network();
        let data = perfectly_predictable();
        assert_eq!(mean_squared_error(&net, &data).unwrap(), 0.0);
    }

    #[test]
    fn both_r2_variants_are_one_for_perfect_predictions() {
        let net = identity_network();
        let data = perfectly_predictable();

        let explained = r2_score(&net, &data).unwrap();
        let conventional = r2_score_alternate(&net, &data).unwrap();

        assert_eq!(explained.len(), 1);
        assert!((explained[0] - 1.0).abs() < 1e-9);
        assert!((conventional[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn variants_diverge_for_a_bad_model() {
        // Predicts 10x the target: far worse than predicting the mean.
        let layer = Layer::from_parts(1, 1, Activation::Identity, vec![10.0], vec![0.0]).unwrap();
        let net = Network::from_layers(vec![layer]);
        let data = perfectly_predictable();

        let explained = r2_score(&net, &data).unwrap()[0];
        let conventional = r2_score_alternate(&net, &data).unwrap()[0];

        assert!(explained > 1.0);
        assert!(conventional < 0.0);
    }

    #[test]
    fn scoring_rejects_empty_or_mismatched_datasets() {
        let net = identity_network();

        let empty = Dataset::from_flat(vec![], vec![], 1, 1).unwrap();
        assert!(mean_squared_error(&net, &empty).is_err());

        let wide = Dataset::from_rows(&[vec![1.0, 2.0]], &[vec![1.0]]).unwrap();
        assert!(r2_score(&net, &wide).is_err());
    }

    #[test]
    fn diff_and_relative_diff() {
        let target = [10.0_f32, 20.0];
        let prediction = [8.0_f32, 25.0];

        assert_eq!(diff(&target, &prediction), vec![2.0, -5.0]);

        let rel = relative_diff(&target, &prediction);
        assert!((rel[0] - 0.2).abs() < 1e-6);
        assert!((rel[1] - (-0.25)).abs() < 1e-6);
    }

    #[test]
    fn variant_parsing_and_labels() {
        assert_eq!(
            "explained-variance".parse::<R2Variant>().unwrap(),
            R2Variant::ExplainedVariance
        );
        assert_eq!(
            "conventional".parse::<R2Variant>().unwrap(),
            R2Variant::Conventional
        );
        assert!("r2".parse::<R2Variant>().is_err());
        assert_eq!(R2Variant::default(), R2Variant::ExplainedVariance);
    }
}
