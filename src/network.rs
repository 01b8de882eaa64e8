//! The feed-forward network.
//!
//! `Network` is the differentiable model the training pipeline drives: a stack
//! of dense layers with a per-sample forward/backward pass over reusable
//! buffers (`Scratch` / `Gradients`). Shape violations on this hot path are
//! programmer errors and panic via `assert!`; the shape-checked surface lives
//! in the higher-level APIs (`Network::fit`, the metrics functions).

use crate::{Layer, Result};

#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
}

/// Reusable buffers for `Network::forward`.
///
/// The output of the most recent forward pass lives inside `Scratch`.
#[derive(Debug, Clone)]
pub struct Scratch {
    layer_outputs: Vec<Vec<f32>>,
}

/// Parameter gradients for a `Network` (overwrite semantics).
///
/// Allocate once via `Network::gradients()` and reuse across training steps.
/// Overwrite semantics double as the "zero accumulated gradients" step of a
/// classic training loop: every backward pass replaces the previous one.
#[derive(Debug, Clone)]
pub struct Gradients {
    d_weights: Vec<Vec<f32>>,
    d_biases: Vec<Vec<f32>>,

    // Backprop intermediate: gradient w.r.t each layer output.
    // This includes the final layer output; `Network::backward` reads the
    // upstream gradient from this buffer so it can uniformly backprop
    // layer-by-layer.
    d_layer_outputs: Vec<Vec<f32>>,

    d_input: Vec<f32>,
}

impl Network {
    /// Assemble a network from prepared layers.
    ///
    /// Callers (the builder, deserialization) are responsible for ensuring the
    /// layer dims chain correctly.
    pub(crate) fn from_layers(layers: Vec<Layer>) -> Self {
        debug_assert!(!layers.is_empty());
        Self { layers }
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layers
            .first()
            .expect("network must have at least one layer")
            .in_dim()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.layers
            .last()
            .expect("network must have at least one layer")
            .out_dim()
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    pub fn scratch(&self) -> Scratch {
        Scratch::new(self)
    }

    pub fn gradients(&self) -> Gradients {
        Gradients::new(self)
    }

    /// Forward pass for a single sample.
    ///
    /// Writes intermediate activations into `scratch` and returns the final
    /// output slice.
    ///
    /// Shape contract:
    /// - `input.len() == self.input_dim()`
    /// - `scratch` must be built for this `Network`
    pub fn forward<'a>(&self, input: &[f32], scratch: &'a mut Scratch) -> &'a [f32] {
        assert_eq!(
            input.len(),
            self.input_dim(),
            "input len {} does not match network input_dim {}",
            input.len(),
            self.input_dim()
        );
        assert_eq!(
            scratch.layer_outputs.len(),
            self.layers.len(),
            "scratch has {} layer outputs, network has {} layers",
            scratch.layer_outputs.len(),
            self.layers.len()
        );

        for (idx, layer) in self.layers.iter().enumerate() {
            if idx == 0 {
                let out = &mut scratch.layer_outputs[0];
                assert_eq!(
                    out.len(),
                    layer.out_dim(),
                    "scratch layer 0 output len {} does not match layer out_dim {}",
                    out.len(),
                    layer.out_dim()
                );
                layer.forward(input, out);
            } else {
                // Borrow the previous output immutably and the current output mutably.
                let (left, right) = scratch.layer_outputs.split_at_mut(idx);
                let prev = &left[idx - 1];
                let out = &mut right[0];
                assert_eq!(
                    out.len(),
                    layer.out_dim(),
                    "scratch layer {idx} output len {} does not match layer out_dim {}",
                    out.len(),
                    layer.out_dim()
                );
                layer.forward(prev, out);
            }
        }

        scratch.output()
    }

    /// Shape-checked single-sample prediction into a caller buffer.
    pub fn predict_into(&self, input: &[f32], scratch: &mut Scratch, out: &mut [f32]) -> Result<()> {
        if input.len() != self.input_dim() {
            return Err(crate::Error::ShapeMismatch(format!(
                "input len {} does not match network input_dim {}",
                input.len(),
                self.input_dim()
            )));
        }
        if out.len() != self.output_dim() {
            return Err(crate::Error::ShapeMismatch(format!(
                "output len {} does not match network output_dim {}",
                out.len(),
                self.output_dim()
            )));
        }

        let y = self.forward(input, scratch);
        out.copy_from_slice(y);
        Ok(())
    }

    /// Backward pass for a single sample.
    ///
    /// You must call `forward` first using the same `input` and `scratch`.
    ///
    /// Before calling this, write the upstream gradient `dL/d(output)` into
    /// `grads.d_output_mut()`.
    ///
    /// Overwrite semantics: `grads` is overwritten with gradients for this
    /// sample. Returns dL/d(input).
    pub fn backward<'a>(
        &self,
        input: &[f32],
        scratch: &Scratch,
        grads: &'a mut Gradients,
    ) -> &'a [f32] {
        assert_eq!(
            input.len(),
            self.input_dim(),
            "input len {} does not match network input_dim {}",
            input.len(),
            self.input_dim()
        );
        assert_eq!(
            scratch.layer_outputs.len(),
            self.layers.len(),
            "scratch has {} layer outputs, network has {} layers",
            scratch.layer_outputs.len(),
            self.layers.len()
        );
        assert_eq!(
            grads.d_weights.len(),
            self.layers.len(),
            "grads has {} d_weights entries, network has {} layers",
            grads.d_weights.len(),
            self.layers.len()
        );
        assert_eq!(
            grads.d_input.len(),
            self.input_dim(),
            "grads d_input len {} does not match network input_dim {}",
            grads.d_input.len(),
            self.input_dim()
        );

        for idx in (0..self.layers.len()).rev() {
            let layer = &self.layers[idx];

            let layer_input: &[f32] = if idx == 0 {
                input
            } else {
                &scratch.layer_outputs[idx - 1]
            };

            let layer_output: &[f32] = &scratch.layer_outputs[idx];
            assert_eq!(
                layer_output.len(),
                layer.out_dim(),
                "scratch layer {idx} output len {} does not match layer out_dim {}",
                layer_output.len(),
                layer.out_dim()
            );

            if idx == 0 {
                let d_outputs = &grads.d_layer_outputs[0];
                layer.backward(
                    layer_input,
                    layer_output,
                    d_outputs,
                    &mut grads.d_input,
                    &mut grads.d_weights[0],
                    &mut grads.d_biases[0],
                );
            } else {
                // We need two different layer gradient buffers:
                // - `d_outputs` for the current layer (read-only)
                // - `d_inputs` for the current layer, which becomes `d_outputs` of the previous
                let (left, right) = grads.d_layer_outputs.split_at_mut(idx);
                let d_inputs_prev = &mut left[idx - 1];
                let d_outputs = &right[0];
                layer.backward(
                    layer_input,
                    layer_output,
                    d_outputs,
                    d_inputs_prev,
                    &mut grads.d_weights[idx],
                    &mut grads.d_biases[idx],
                );
            }
        }

        &grads.d_input
    }

    /// Applies an SGD update to all layers.
    #[inline]
    pub fn sgd_step(&mut self, grads: &Gradients, lr: f32) {
        assert!(
            lr.is_finite() && lr > 0.0,
            "learning rate must be finite and > 0"
        );
        assert_eq!(
            self.layers.len(),
            grads.d_weights.len(),
            "grads has {} d_weights entries, network has {} layers",
            grads.d_weights.len(),
            self.layers.len()
        );

        for i in 0..self.layers.len() {
            self.layers[i].sgd_step(&grads.d_weights[i], &grads.d_biases[i], lr);
        }
    }
}

impl Scratch {
    pub fn new(network: &Network) -> Self {
        let mut layer_outputs = Vec::with_capacity(network.layers.len());
        for layer in &network.layers {
            layer_outputs.push(vec![0.0; layer.out_dim()]);
        }
        Self { layer_outputs }
    }

    #[inline]
    pub fn output(&self) -> &[f32] {
        self.layer_outputs
            .last()
            .expect("scratch must have at least one layer output")
            .as_slice()
    }
}

impl Gradients {
    pub fn new(network: &Network) -> Self {
        let mut d_weights = Vec::with_capacity(network.layers.len());
        let mut d_biases = Vec::with_capacity(network.layers.len());
        let mut d_layer_outputs = Vec::with_capacity(network.layers.len());

        for layer in &network.layers {
            d_weights.push(vec![0.0; layer.in_dim() * layer.out_dim()]);
            d_biases.push(vec![0.0; layer.out_dim()]);
            d_layer_outputs.push(vec![0.0; layer.out_dim()]);
        }

        let d_input = vec![0.0; network.input_dim()];

        Self {
            d_weights,
            d_biases,
            d_layer_outputs,
            d_input,
        }
    }

    /// Mutable view of the upstream gradient buffer for the final model output.
    ///
    /// Typical training flow:
    /// - `network.forward(input, &mut scratch)`
    /// - loss writes `dL/d(output)` into `grads.d_output_mut()`
    /// - `network.backward(input, &scratch, &mut grads)`
    #[inline]
    pub fn d_output_mut(&mut self) -> &mut [f32] {
        self.d_layer_outputs
            .last_mut()
            .expect("network must have at least one layer")
            .as_mut_slice()
    }

    #[inline]
    pub fn d_input(&self) -> &[f32] {
        &self.d_input
    }

    #[inline]
    pub fn d_weights(&self, layer_idx: usize) -> &[f32] {
        &self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases(&self, layer_idx: usize) -> &[f32] {
        &self.d_biases[layer_idx]
    }

    #[inline]
    pub fn d_weights_mut(&mut self, layer_idx: usize) -> &mut [f32] {
        &mut self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases_mut(&mut self, layer_idx: usize) -> &mut [f32] {
        &mut self.d_biases[layer_idx]
    }
}
