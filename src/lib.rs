//! Train a feed-forward regression network on tabular numeric data.
//!
//! `tabreg` reads a header-plus-rows data file, normalizes it (min-max per
//! feature, with logarithmic pre-scaling of the typically-exponential
//! regression targets), trains a dense network with per-sample SGD under an
//! adaptive stopping rule, reports accuracy metrics (MSE and two R²
//! variants), and optionally answers single-sample queries interactively.
//!
//! # Design goals
//!
//! - Predictable performance: the per-sample hot path reuses buffers
//!   (`Scratch` / `Gradients`) instead of allocating.
//! - Clear contracts: shapes are explicit; the high-level APIs validate and
//!   return [`Result`], the hot path treats mismatches as programmer error.
//! - A testable stopping policy: the epoch budget is a minimum, and the
//!   extension/convergence/timeout decisions live in their own state machine
//!   ([`train::StopSchedule`]).
//!
//! # Quick start
//!
//! ```rust
//! use tabreg::{scaling, Dataset, NetworkBuilder, TrainConfig};
//!
//! # fn main() -> tabreg::Result<()> {
//! let xs = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
//! let ys = vec![vec![10.0], vec![20.0], vec![30.0], vec![40.0]];
//! let mut data = Dataset::from_rows(&xs, &ys)?;
//!
//! let bounds = scaling::normalize_dataset(&mut data, 0.0, 1.0);
//!
//! let mut net = NetworkBuilder::regression(1, &[8], 1)?.build_with_seed(0)?;
//! let report = net.fit(
//!     &data,
//!     &TrainConfig {
//!         epochs: 50,
//!         learning_rate: 0.05,
//!         ..TrainConfig::default()
//!     },
//! )?;
//! assert!(report.final_mean_error <= report.initial_mean_error);
//! # let _ = bounds;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod config;
pub mod data;
pub mod error;
pub mod fileio;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optim;
pub mod run;
pub mod scaling;
pub mod serde_model;
pub mod session;
pub mod train;

pub use activation::Activation;
pub use builder::NetworkBuilder;
pub use config::RunConfig;
pub use data::Dataset;
pub use error::{Error, Result};
pub use layer::{Init, Layer};
pub use metrics::R2Variant;
pub use network::{Gradients, Network, Scratch};
pub use optim::Sgd;
pub use scaling::{DatasetBounds, MinMax};
pub use train::{StopSchedule, TrainConfig, TrainOutcome, TrainReport, TrainState};
