//! Dense layers.
//!
//! A `Layer` owns its parameters and applies `y = activation(W x + b)` for a
//! single sample. Weights are row-major with shape `(out_dim, in_dim)`.

use rand::Rng;

use crate::{Activation, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Weight initialization scheme.
pub enum Init {
    /// Xavier/Glorot uniform; suits `tanh` and `identity` layers.
    Xavier,
    /// He/Kaiming uniform; suits `relu` layers.
    He,
}

#[derive(Debug, Clone)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    activation: Activation,
    /// Row-major matrix with shape (out_dim, in_dim).
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    /// Create a layer with randomly initialized weights and zero biases.
    pub fn new_with_rng<R: Rng + ?Sized>(
        in_dim: usize,
        out_dim: usize,
        init: Init,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }

        let limit = match init {
            Init::Xavier => (6.0 / (in_dim + out_dim) as f32).sqrt(),
            Init::He => (6.0 / in_dim as f32).sqrt(),
        };

        let mut weights = Vec::with_capacity(in_dim * out_dim);
        for _ in 0..in_dim * out_dim {
            weights.push(rng.gen_range(-limit..limit));
        }
        let biases = vec![0.0; out_dim];

        Ok(Self {
            in_dim,
            out_dim,
            activation,
            weights,
            biases,
        })
    }

    /// Reassemble a layer from raw parts (used by deserialization).
    ///
    /// Validates shapes and that all parameters are finite.
    pub fn from_parts(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        if weights.len() != in_dim * out_dim {
            return Err(Error::ShapeMismatch(format!(
                "weights length {} does not match out_dim * in_dim ({out_dim} * {in_dim})",
                weights.len()
            )));
        }
        if biases.len() != out_dim {
            return Err(Error::ShapeMismatch(format!(
                "biases length {} does not match out_dim {out_dim}",
                biases.len()
            )));
        }
        if weights.iter().chain(biases.iter()).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "layer parameters must contain only finite values".to_owned(),
            ));
        }

        Ok(Self {
            in_dim,
            out_dim,
            activation,
            weights,
            biases,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }

    /// Forward pass for a single sample.
    ///
    /// Shape contract:
    /// - `inputs.len() == self.in_dim`
    /// - `outputs.len() == self.out_dim`
    #[inline]
    pub fn forward(&self, inputs: &[f32], outputs: &mut [f32]) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);

        for o in 0..self.out_dim {
            let mut sum = self.biases[o];
            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                sum = self.weights[row + i].mul_add(inputs[i], sum);
            }
            outputs[o] = self.activation.forward(sum);
        }
    }

    /// Backward pass for a single sample.
    ///
    /// This uses overwrite semantics:
    /// - `d_inputs` is overwritten (and internally zeroed before accumulation)
    /// - `d_weights` is overwritten
    /// - `d_biases` is overwritten
    ///
    /// Inputs:
    /// - `inputs`: the same inputs passed to `forward`
    /// - `outputs`: the outputs previously produced by `forward` (post-activation)
    /// - `d_outputs`: upstream gradient dL/d(outputs)
    #[inline]
    pub fn backward(
        &self,
        inputs: &[f32],
        outputs: &[f32],
        d_outputs: &[f32],
        d_inputs: &mut [f32],
        d_weights: &mut [f32],
        d_biases: &mut [f32],
    ) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);
        debug_assert_eq!(d_outputs.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        // d_inputs accumulates contributions from all outputs.
        d_inputs.fill(0.0);

        for o in 0..self.out_dim {
            let d_z = d_outputs[o] * self.activation.grad_from_output(outputs[o]);
            d_biases[o] = d_z;

            let row = o * self.in_dim;
            for i in 0..self.in_dim {
                let w = self.weights[row + i];
                d_weights[row + i] = d_z * inputs[i];
                d_inputs[i] = w.mul_add(d_z, d_inputs[i]);
            }
        }
    }

    /// Applies one SGD update: `param -= lr * d_param`.
    #[inline]
    pub fn sgd_step(&mut self, d_weights: &[f32], d_biases: &[f32], lr: f32) {
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.biases.len());

        for (w, &g) in self.weights.iter_mut().zip(d_weights) {
            *w -= lr * g;
        }
        for (b, &g) in self.biases.iter_mut().zip(d_biases) {
            *b -= lr * g;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_zero_dims() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Layer::new_with_rng(0, 1, Init::Xavier, Activation::Tanh, &mut rng).is_err());
        assert!(Layer::new_with_rng(1, 0, Init::Xavier, Activation::Tanh, &mut rng).is_err());
    }

    #[test]
    fn from_parts_validates_shapes_and_finiteness() {
        let ok = Layer::from_parts(2, 1, Activation::Identity, vec![1.0, 2.0], vec![0.0]);
        assert!(ok.is_ok());

        let bad_len = Layer::from_parts(2, 1, Activation::Identity, vec![1.0], vec![0.0]);
        assert!(bad_len.is_err());

        let bad_val = Layer::from_parts(2, 1, Activation::Identity, vec![1.0, f32::NAN], vec![0.0]);
        assert!(bad_val.is_err());
    }

    #[test]
    fn identity_layer_computes_affine_map() {
        let layer =
            Layer::from_parts(2, 1, Activation::Identity, vec![2.0, -1.0], vec![0.5]).unwrap();
        let mut out = [0.0_f32];
        layer.forward(&[3.0, 4.0], &mut out);
        assert!((out[0] - (2.0 * 3.0 - 4.0 + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn sgd_step_moves_against_gradient() {
        let mut layer =
            Layer::from_parts(1, 1, Activation::Identity, vec![1.0], vec![2.0]).unwrap();
        layer.sgd_step(&[3.0], &[4.0], 0.1);
        assert!((layer.weights()[0] - (1.0 - 0.3)).abs() < 1e-6);
        assert!((layer.biases()[0] - (2.0 - 0.4)).abs() < 1e-6);
    }
}
