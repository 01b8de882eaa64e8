//! Run configuration.
//!
//! An immutable snapshot of everything one pipeline run needs, produced by
//! the CLI in `main.rs` (or assembled directly in tests). The core never
//! mutates it.

use std::path::PathBuf;

use crate::{R2Variant, TrainConfig};

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Tabular training data (header + rows).
    pub data_path: PathBuf,
    /// Optional denormalized dataset dump.
    pub output_data_path: Option<PathBuf>,
    /// Load model parameters from here instead of random initialization.
    pub load_model_path: Option<PathBuf>,
    /// Persist model parameters here after training.
    pub save_model_path: Option<PathBuf>,

    pub num_inputs: usize,
    pub num_outputs: usize,
    /// Hidden layer widths, input to output.
    pub hidden_layers: Vec<usize>,

    pub train: TrainConfig,

    /// Enter the interactive read-eval loop after the report.
    pub interactive: bool,
    /// Which R² formula leads the metrics summary.
    pub r2_variant: R2Variant,
}

impl RunConfig {
    /// A config with defaults for everything but the data location and shape.
    pub fn new(data_path: PathBuf, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            data_path,
            output_data_path: None,
            load_model_path: None,
            save_model_path: None,
            num_inputs,
            num_outputs,
            hidden_layers: vec![32],
            train: TrainConfig::default(),
            interactive: false,
            r2_variant: R2Variant::default(),
        }
    }
}
