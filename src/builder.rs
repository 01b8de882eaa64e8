//! Model builder.
//!
//! `NetworkBuilder` is the recommended way to define a model. It makes the
//! structure explicit (layer sizes + activations) and chooses a reasonable
//! default weight initializer for each activation:
//!
//! - `tanh` / `identity`: Xavier/Glorot
//! - `relu`: He/Kaiming

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Activation, Error, Init, Layer, Network, Result};

#[derive(Debug, Clone, Copy)]
struct LayerSpec {
    out_dim: usize,
    activation: Activation,
}

#[derive(Debug, Clone)]
/// Builder for a `Network`.
///
/// Example:
///
/// ```rust
/// use tabreg::{Activation, NetworkBuilder};
///
/// # fn main() -> tabreg::Result<()> {
/// let net = NetworkBuilder::new(2)?
///     .add_layer(8, Activation::Tanh)?
///     .add_layer(1, Activation::Identity)?
///     .build_with_seed(0)?;
/// # Ok(())
/// # }
/// ```
pub struct NetworkBuilder {
    input_dim: usize,
    layers: Vec<LayerSpec>,
}

impl NetworkBuilder {
    /// Start building a network that accepts inputs of length `input_dim`.
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
        }
        Ok(Self {
            input_dim,
            layers: Vec::new(),
        })
    }

    /// Convenience constructor for the common regression stack: tanh hidden
    /// layers followed by an identity output layer.
    pub fn regression(input_dim: usize, hidden: &[usize], output_dim: usize) -> Result<Self> {
        let mut b = Self::new(input_dim)?;
        for &h in hidden {
            b = b.add_layer(h, Activation::Tanh)?;
        }
        b.add_layer(output_dim, Activation::Identity)
    }

    /// Add a dense layer with `out_dim` outputs.
    pub fn add_layer(mut self, out_dim: usize, activation: Activation) -> Result<Self> {
        if out_dim == 0 {
            return Err(Error::InvalidConfig("layer out_dim must be > 0".to_owned()));
        }

        self.layers.push(LayerSpec {
            out_dim,
            activation,
        });
        Ok(self)
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Network> {
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig(
                "network must have at least one layer".to_owned(),
            ));
        }

        let mut layers = Vec::with_capacity(self.layers.len());
        let mut in_dim = self.input_dim;
        for spec in self.layers {
            let init = default_init_for_activation(spec.activation);
            let layer = Layer::new_with_rng(in_dim, spec.out_dim, init, spec.activation, rng)?;
            layers.push(layer);
            in_dim = spec.out_dim;
        }

        Ok(Network::from_layers(layers))
    }
}

#[inline]
fn default_init_for_activation(act: Activation) -> Init {
    match act {
        Activation::Tanh | Activation::Identity => Init::Xavier,
        Activation::ReLU => Init::He,
    }
}
