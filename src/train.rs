//! The training loop.
//!
//! One epoch is a sequential per-sample pass (forward, MSE backward, one SGD
//! step; no batching). After each pass a forward-only sweep measures the mean
//! error over the whole dataset, and [`StopSchedule`] decides whether to keep
//! going.
//!
//! The epoch budget is a *minimum*, not a cap: once it is exhausted the loop
//! keeps extending as long as the error still improves by more than the
//! configured epsilon, and gives up after more than [`STAGNATION_LIMIT`]
//! consecutive stagnant epochs. A wall-clock ceiling bounds the whole run.

use std::io::Write as _;
use std::time::{Duration, Instant};

use crate::{loss, metrics, Dataset, Error, Network, Result, Sgd};

/// Consecutive stagnant epochs tolerated in the extension regime before the
/// schedule declares convergence.
pub const STAGNATION_LIMIT: u32 = 3;

#[derive(Debug, Clone)]
/// Immutable hyperparameter snapshot for one training run.
pub struct TrainConfig {
    /// Minimum number of epochs to run.
    pub epochs: usize,
    /// An extension epoch counts as stagnant unless the mean error drops by
    /// more than this.
    pub epsilon: f64,
    /// Fixed SGD learning rate.
    pub learning_rate: f32,
    /// Emit a per-epoch progress line on stdout.
    pub show_progress: bool,
    /// Hard wall-clock ceiling; checked once per epoch.
    pub max_duration: Duration,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            epsilon: 1e-5,
            learning_rate: 1e-6,
            show_progress: false,
            max_duration: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where the schedule currently stands.
pub enum TrainState {
    /// Still inside the epoch budget.
    Scheduled,
    /// Past the budget, continuing while the error keeps improving.
    Extending,
    /// Terminal: improvement stalled for more than `STAGNATION_LIMIT`
    /// consecutive extension epochs.
    Converged,
    /// Terminal: the wall-clock ceiling was hit.
    TimedOut,
}

impl TrainState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TrainState::Converged | TrainState::TimedOut)
    }
}

#[derive(Debug, Clone)]
/// The stopping policy, kept separate from the gradient loop so it can be
/// driven and tested without a model.
pub struct StopSchedule {
    budget: usize,
    epsilon: f64,
    max_duration: Duration,
    epoch: usize,
    stagnation: u32,
    state: TrainState,
}

impl StopSchedule {
    pub fn new(budget: usize, epsilon: f64, max_duration: Duration) -> Self {
        Self {
            budget,
            epsilon,
            max_duration,
            epoch: 0,
            stagnation: 0,
            state: TrainState::Scheduled,
        }
    }

    /// Record one finished epoch and return the resulting state.
    ///
    /// `improvement` is `previous_mean_error - current_mean_error`; the first
    /// epoch's improvement is measured against the pre-training baseline.
    /// The timeout wins over every other consideration.
    pub fn advance(&mut self, improvement: f64, elapsed: Duration) -> TrainState {
        debug_assert!(!self.state.is_terminal());

        self.epoch += 1;

        if elapsed >= self.max_duration {
            self.state = TrainState::TimedOut;
            return self.state;
        }

        match self.state {
            TrainState::Scheduled => {
                if self.epoch >= self.budget {
                    // Budget exhausted; the budget's final error becomes the
                    // baseline the extension epochs are measured against.
                    self.state = TrainState::Extending;
                }
            }
            TrainState::Extending => {
                if improvement <= self.epsilon {
                    self.stagnation += 1;
                } else {
                    self.stagnation = 0;
                }
                if self.stagnation > STAGNATION_LIMIT {
                    self.state = TrainState::Converged;
                }
            }
            TrainState::Converged | TrainState::TimedOut => unreachable!(),
        }

        self.state
    }

    #[inline]
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    #[inline]
    pub fn state(&self) -> TrainState {
        self.state
    }

    #[inline]
    /// Epochs left in the nominal budget; zero once extending.
    pub fn epochs_remaining(&self) -> usize {
        self.budget.saturating_sub(self.epoch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a completed run ended.
pub enum TrainOutcome {
    Converged,
    TimedOut,
}

#[derive(Debug, Clone)]
/// Summary of one completed training run; the model itself is updated in
/// place.
pub struct TrainReport {
    pub epochs: usize,
    pub initial_mean_error: f64,
    pub final_mean_error: f64,
    pub outcome: TrainOutcome,
    pub duration: Duration,
}

impl Network {
    /// Train on `data` (already normalized) until the schedule stops.
    pub fn fit(&mut self, data: &Dataset, cfg: &TrainConfig) -> Result<TrainReport> {
        if data.is_empty() {
            return Err(Error::InvalidData(
                "training dataset must not be empty".to_owned(),
            ));
        }
        if data.input_dim() != self.input_dim() {
            return Err(Error::ShapeMismatch(format!(
                "dataset input_dim {} does not match network input_dim {}",
                data.input_dim(),
                self.input_dim()
            )));
        }
        if data.target_dim() != self.output_dim() {
            return Err(Error::ShapeMismatch(format!(
                "dataset target_dim {} does not match network output_dim {}",
                data.target_dim(),
                self.output_dim()
            )));
        }
        if cfg.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }

        let opt = Sgd::new(cfg.learning_rate)?;
        let mut scratch = self.scratch();
        let mut grads = self.gradients();

        let initial_mean_error = metrics::mean_squared_error(self, data)?;
        let mut current = initial_mean_error;

        let mut schedule = StopSchedule::new(cfg.epochs, cfg.epsilon, cfg.max_duration);
        let start = Instant::now();

        loop {
            for idx in 0..data.len() {
                let input = data.input(idx);
                let target = data.target(idx);

                self.forward(input, &mut scratch);
                loss::mse_backward(scratch.output(), target, grads.d_output_mut());
                self.backward(input, &scratch, &mut grads);
                opt.step(self, &grads);
            }

            let previous = current;
            current = metrics::mean_squared_error(self, data)?;

            let state = schedule.advance(previous - current, start.elapsed());

            if cfg.show_progress {
                report_progress(&schedule, cfg.epochs, previous, current, start.elapsed());
            }

            if state.is_terminal() {
                break;
            }
        }

        let duration = start.elapsed();
        if cfg.show_progress {
            println!("\nTraining duration: {}", format_duration(duration));
        }

        let outcome = match schedule.state() {
            TrainState::TimedOut => TrainOutcome::TimedOut,
            _ => TrainOutcome::Converged,
        };

        Ok(TrainReport {
            epochs: schedule.epoch(),
            initial_mean_error,
            final_mean_error: current,
            outcome,
            duration,
        })
    }
}

fn report_progress(
    schedule: &StopSchedule,
    budget: usize,
    previous: f64,
    current: f64,
    elapsed: Duration,
) {
    let epoch = schedule.epoch();
    if epoch <= budget {
        // Linear extrapolation; only meaningful while the budget bounds the
        // remaining work.
        let remaining = elapsed.mul_f64(schedule.epochs_remaining() as f64 / epoch as f64);
        print!(
            "\rEpoch {epoch} of {budget}. Mean error: {current:.6} (previous {previous:.6}) \
             -- remaining time: {}",
            format_duration(remaining)
        );
    } else {
        print!(
            "\rEpoch {epoch} (past budget of {budget}). Mean error changed from \
             {previous:.6} to {current:.6}"
        );
    }
    let _ = std::io::stdout().flush();
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, NetworkBuilder};

    #[test]
    fn schedule_runs_budget_plus_four_epochs_without_improvement() {
        // Budget 5, epsilon 0, error never improves: the budget runs out
        // after epoch 5, then 3 stagnant epochs are tolerated and the 4th
        // stops the run. 9 epochs in total.
        let mut schedule = StopSchedule::new(5, 0.0, Duration::from_secs(3600));

        let mut epochs = 0;
        loop {
            let state = schedule.advance(0.0, Duration::from_secs(1));
            epochs += 1;
            if state.is_terminal() {
                break;
            }
            assert!(epochs < 100, "schedule failed to terminate");
        }

        assert_eq!(epochs, 9);
        assert_eq!(schedule.state(), TrainState::Converged);
    }

    #[test]
    fn schedule_extends_while_error_improves() {
        let mut schedule = StopSchedule::new(2, 1e-3, Duration::from_secs(3600));

        assert_eq!(schedule.advance(0.0, Duration::ZERO), TrainState::Scheduled);
        assert_eq!(schedule.advance(0.0, Duration::ZERO), TrainState::Extending);

        // Real improvements keep the extension alive and reset stagnation.
        for _ in 0..10 {
            assert_eq!(schedule.advance(0.5, Duration::ZERO), TrainState::Extending);
        }

        // Then improvement stalls: 3 tolerated, the 4th converges.
        for _ in 0..3 {
            assert_eq!(schedule.advance(0.0, Duration::ZERO), TrainState::Extending);
        }
        assert_eq!(schedule.advance(0.0, Duration::ZERO), TrainState::Converged);
    }

    #[test]
    fn schedule_times_out_regardless_of_phase() {
        let mut schedule = StopSchedule::new(100, 0.0, Duration::from_secs(10));
        assert_eq!(
            schedule.advance(1.0, Duration::from_secs(11)),
            TrainState::TimedOut
        );
        assert_eq!(schedule.epoch(), 1);
    }

    #[test]
    fn fit_with_zero_time_budget_reports_timeout() {
        let mut net = NetworkBuilder::new(1)
            .unwrap()
            .add_layer(1, Activation::Identity)
            .unwrap()
            .build_with_seed(0)
            .unwrap();
        let data = Dataset::from_rows(&[vec![0.0], vec![1.0]], &[vec![0.0], vec![1.0]]).unwrap();

        let cfg = TrainConfig {
            epochs: 50,
            max_duration: Duration::ZERO,
            ..TrainConfig::default()
        };
        let report = net.fit(&data, &cfg).unwrap();

        assert_eq!(report.outcome, TrainOutcome::TimedOut);
        assert_eq!(report.epochs, 1);
    }

    #[test]
    fn fit_reduces_error_on_a_linear_problem() {
        let mut net = NetworkBuilder::new(1)
            .unwrap()
            .add_layer(8, Activation::Tanh)
            .unwrap()
            .add_layer(1, Activation::Identity)
            .unwrap()
            .build_with_seed(42)
            .unwrap();

        // y = x over [0, 1]; comfortably learnable with a real learning rate.
        let xs: Vec<Vec<f32>> = (0..20).map(|i| vec![i as f32 / 19.0]).collect();
        let ys = xs.clone();
        let data = Dataset::from_rows(&xs, &ys).unwrap();

        let cfg = TrainConfig {
            epochs: 200,
            epsilon: 1e-7,
            learning_rate: 0.05,
            max_duration: Duration::from_secs(30),
            ..TrainConfig::default()
        };
        let report = net.fit(&data, &cfg).unwrap();

        assert!(report.epochs >= 200);
        assert!(
            report.final_mean_error < report.initial_mean_error,
            "error did not decrease: {} -> {}",
            report.initial_mean_error,
            report.final_mean_error
        );
    }

    #[test]
    fn fit_rejects_empty_dataset_and_zero_epochs() {
        let mut net = NetworkBuilder::new(1)
            .unwrap()
            .add_layer(1, Activation::Identity)
            .unwrap()
            .build_with_seed(0)
            .unwrap();

        let empty = Dataset::from_flat(vec![], vec![], 1, 1).unwrap();
        assert!(net.fit(&empty, &TrainConfig::default()).is_err());

        let data = Dataset::from_rows(&[vec![0.0]], &[vec![0.0]]).unwrap();
        let cfg = TrainConfig {
            epochs: 0,
            ..TrainConfig::default()
        };
        assert!(net.fit(&data, &cfg).is_err());
    }
}
