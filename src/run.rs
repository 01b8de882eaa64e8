//! The pipeline orchestrator.
//!
//! Wires the whole run together: load data, normalize, construct or load the
//! model, train, report per-sample results and metrics, then optionally dump
//! the dataset, save the model, and enter the interactive session.
//!
//! Only a dataset that cannot be parsed fails the run. Training timeouts,
//! model-load problems (a fresh model is used instead) and persistence
//! problems are logged and the run continues.

use std::io;

use log::{error, info, warn};

use crate::scaling::{self, DatasetBounds};
use crate::{
    fileio, metrics, session, Dataset, Network, NetworkBuilder, Result, RunConfig, TrainOutcome,
};

/// The normalization range every run rescales into.
const NEW_MIN: f32 = 0.0;
const NEW_MAX: f32 = 1.0;

/// Execute one full pipeline run.
pub fn run(cfg: &RunConfig) -> Result<()> {
    let (mut data, header) = fileio::read_dataset(&cfg.data_path, cfg.num_inputs, cfg.num_outputs)?;
    info!(
        "loaded {} samples ({} inputs, {} outputs) from {}",
        data.len(),
        cfg.num_inputs,
        cfg.num_outputs,
        cfg.data_path.display()
    );

    let bounds = scaling::normalize_dataset(&mut data, NEW_MIN, NEW_MAX);

    let mut network = build_or_load(cfg)?;

    let report = network.fit(&data, &cfg.train)?;
    match report.outcome {
        TrainOutcome::Converged => info!(
            "training converged after {} epochs ({:.1?}), mean error {:.6} -> {:.6}",
            report.epochs, report.duration, report.initial_mean_error, report.final_mean_error
        ),
        TrainOutcome::TimedOut => println!(
            "Training stopped after {} epochs: the time budget of {:?} ran out.",
            report.epochs, cfg.train.max_duration
        ),
    }

    report_samples(&network, &data, &bounds)?;
    report_metrics(&network, &data, cfg)?;

    if let Some(path) = &cfg.output_data_path {
        match denormalized_copy(&data, &bounds) {
            Ok(copy) => {
                if let Err(e) = fileio::write_dataset(path, &copy, Some(&header)) {
                    error!("could not write the dataset dump: {e}");
                }
            }
            Err(e) => error!("could not denormalize the dataset for dumping: {e}"),
        }
    }

    if let Some(path) = &cfg.save_model_path {
        match network.save_json(path) {
            Ok(()) => info!("saved model parameters to {}", path.display()),
            Err(e) => error!("could not save model parameters: {e}"),
        }
    }

    if cfg.interactive {
        let stdin = io::stdin();
        if let Err(e) = session::run_session(
            &network,
            &bounds,
            NEW_MIN,
            NEW_MAX,
            stdin.lock(),
            io::stdout(),
        ) {
            error!("interactive session ended abnormally: {e}");
        }
    }

    Ok(())
}

fn build_or_load(cfg: &RunConfig) -> Result<Network> {
    if let Some(path) = &cfg.load_model_path {
        match Network::load_json(path) {
            Ok(network) => {
                if network.input_dim() == cfg.num_inputs && network.output_dim() == cfg.num_outputs
                {
                    info!("loaded model parameters from {}", path.display());
                    return Ok(network);
                }
                warn!(
                    "model at {} has shape {}->{}, expected {}->{}; training a fresh network",
                    path.display(),
                    network.input_dim(),
                    network.output_dim(),
                    cfg.num_inputs,
                    cfg.num_outputs
                );
            }
            Err(e) => warn!("could not load model parameters: {e}; training a fresh network"),
        }
    }

    NetworkBuilder::regression(cfg.num_inputs, &cfg.hidden_layers, cfg.num_outputs)?
        .build_with_seed(0)
}

/// Print every sample's raw-space input, target and prediction plus the
/// normalized-space loss.
fn report_samples(network: &Network, data: &Dataset, bounds: &DatasetBounds) -> Result<()> {
    let mut scratch = network.scratch();

    for idx in 0..data.len() {
        network.forward(data.input(idx), &mut scratch);
        let loss = crate::loss::mse(scratch.output(), data.target(idx));

        let mut input = data.input(idx).to_vec();
        let mut target = data.target(idx).to_vec();
        let mut prediction = scratch.output().to_vec();

        scaling::denormalize_vec(&mut input, &bounds.inputs, NEW_MIN, NEW_MAX, false)?;
        scaling::denormalize_vec(&mut target, &bounds.outputs, NEW_MIN, NEW_MAX, false)?;
        scaling::denormalize_vec(&mut prediction, &bounds.outputs, NEW_MIN, NEW_MAX, false)?;
        scaling::unscale_log(&mut target);
        scaling::unscale_log(&mut prediction);

        println!();
        println!("x: {}", fileio::format_row(&input));
        println!("y: {}", fileio::format_row(&target));
        println!("prediction: {}", fileio::format_row(&prediction));
        println!("loss: {loss}");
    }

    Ok(())
}

fn report_metrics(network: &Network, data: &Dataset, cfg: &RunConfig) -> Result<()> {
    let mse = metrics::mean_squared_error(network, data)?;

    let primary = cfg.r2_variant;
    let secondary = match primary {
        crate::R2Variant::ExplainedVariance => crate::R2Variant::Conventional,
        crate::R2Variant::Conventional => crate::R2Variant::ExplainedVariance,
    };

    println!();
    println!("mean squared error: {mse}");
    for variant in [primary, secondary] {
        let scores = variant.score(network, data)?;
        println!(
            "r2 score ({}): {}",
            variant.label(),
            scores
                .iter()
                .map(|s| format!("{s:.6}"))
                .collect::<Vec<_>>()
                .join(" ")
        );
    }

    Ok(())
}

/// Rebuild the raw-space dataset for dumping: invert the min-max step for
/// both spaces and the log-scaling for targets.
fn denormalized_copy(data: &Dataset, bounds: &DatasetBounds) -> Result<Dataset> {
    let mut copy = data.clone();
    for idx in 0..copy.len() {
        scaling::denormalize_vec(copy.input_mut(idx), &bounds.inputs, NEW_MIN, NEW_MAX, false)?;
        scaling::denormalize_vec(copy.target_mut(idx), &bounds.outputs, NEW_MIN, NEW_MAX, false)?;
        scaling::unscale_log(copy.target_mut(idx));
    }
    Ok(copy)
}
