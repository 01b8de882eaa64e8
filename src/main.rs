use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::error;

use tabreg::{R2Variant, RunConfig, TrainConfig};

/// Train a feed-forward regression network on tabular numeric data.
#[derive(Debug, Parser)]
#[command(name = "tabreg", version, about)]
struct Cli {
    /// Tabular data file: a header line, then rows of input and output values.
    #[arg(short = 'i', long)]
    data: PathBuf,

    /// Write the (denormalized) dataset back out to this file.
    #[arg(long)]
    output_data: Option<PathBuf>,

    /// Load model parameters from this JSON file instead of starting fresh.
    #[arg(long)]
    load_model: Option<PathBuf>,

    /// Save model parameters to this JSON file after training.
    #[arg(long)]
    save_model: Option<PathBuf>,

    /// Number of input features per sample.
    #[arg(long, default_value_t = 1)]
    num_inputs: usize,

    /// Number of output features per sample.
    #[arg(long, default_value_t = 1)]
    num_outputs: usize,

    /// Hidden layer widths, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "32")]
    hidden: Vec<usize>,

    /// Minimum number of training epochs.
    #[arg(short, long, default_value_t = 100)]
    epochs: usize,

    /// An extension epoch counts as stagnant unless the mean error drops by
    /// more than this.
    #[arg(long, default_value_t = 1e-5)]
    epsilon: f64,

    /// Fixed SGD learning rate.
    #[arg(long, default_value_t = 1e-6)]
    learning_rate: f32,

    /// Wall-clock training ceiling, in seconds.
    #[arg(long, default_value_t = 24 * 60 * 60)]
    max_seconds: u64,

    /// Print a progress line per epoch.
    #[arg(long)]
    progress: bool,

    /// Enter the interactive query loop after training.
    #[arg(long)]
    interactive: bool,

    /// Which R² formula leads the metrics summary:
    /// "explained-variance" or "conventional".
    #[arg(long, default_value = "explained-variance")]
    r2_variant: R2Variant,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            data_path: self.data,
            output_data_path: self.output_data,
            load_model_path: self.load_model,
            save_model_path: self.save_model,
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
            hidden_layers: self.hidden,
            train: TrainConfig {
                epochs: self.epochs,
                epsilon: self.epsilon,
                learning_rate: self.learning_rate,
                show_progress: self.progress,
                max_duration: Duration::from_secs(self.max_seconds),
            },
            interactive: self.interactive,
            r2_variant: self.r2_variant,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cfg = Cli::parse().into_config();
    match tabreg::run::run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
