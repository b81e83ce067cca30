//! Settings and results for training networks.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

/// Settings for `Network::train_with`.
///
/// The defaults are:
///
/// * A learning rate of 0.01.
/// * 500 full-batch iterations.
/// * Runs every iteration, without early stopping.
/// * Logs on training completion.
/// * No finiteness checks and no cost history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub learning_rate: f64,
    /// The maximum number of gradient descent steps.
    pub iterations: usize,
    pub logging: Logging,
    /// An early stop; training never runs past `iterations`.
    pub stop: StopCondition,
    /// Fail with `Error::NonFinite` instead of applying NaN or infinite
    /// gradients.
    pub check_finite: bool,
    /// Record the cost every `n` iterations in the report; 0 disables.
    pub history_every: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.01,
            iterations: 500,
            logging: Logging::Completion,
            stop: StopCondition::Iterations,
            check_finite: false,
            history_every: 0,
        }
    }
}

impl TrainConfig {
    /// Sets the learning rate to use during gradient descent.
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Sets the maximum number of training iterations.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the type of logging to be emitted during training.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Sets the condition to finish training early.
    pub fn stop_condition<C>(mut self, condition: C) -> Self
    where
        C: Into<StopCondition>,
    {
        self.stop = condition.into();
        self
    }

    /// Sets whether NaN or infinite gradients abort training.
    pub fn check_finite(mut self, check: bool) -> Self {
        self.check_finite = check;
        self
    }

    /// Sets how often the cost is recorded in the report.
    pub fn history_every(mut self, every: usize) -> Self {
        self.history_every = every;
        self
    }
}

/// The outcome of a training run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    /// Number of gradient descent steps taken.
    pub iterations: usize,
    /// Cost after the last step.
    pub final_cost: f64,
    /// `(iteration, cost)` pairs, starting with the untrained cost.
    pub history: Vec<(usize, f64)>,
}

impl TrainReport {
    pub(crate) fn record(&mut self, iteration: usize, cost: f64, every: usize) {
        if every > 0 && iteration % every == 0 {
            self.history.push((iteration, cost));
        }
    }
}

/// Logging frequency to use during training
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logging {
    /// No logs will be emitted
    Silent,
    /// A summary will be emitted at completion
    Completion,
    /// A summary will be emitted after every `n` training iterations
    Iterations(usize),
}

impl Logging {
    /// Performs logging at the current `iteration` of training.
    pub(crate) fn iteration(&self, iteration: usize, training_error: f64) {
        if let Logging::Iterations(freq) = *self {
            if freq > 0 && iteration % freq == 0 {
                info!(iteration, cost = training_error, "training");
            }
        }
    }

    /// Performs logging at the end of training.
    pub(crate) fn completion(
        &self,
        iterations: usize,
        training_error: f64,
        start_time: Instant,
    ) {
        if let Logging::Silent = *self {
            return;
        }
        info!(
            iterations,
            cost = training_error,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "training completed"
        );
    }
}

/// When to stop training before the iteration limit
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCondition {
    /// Runs every configured iteration
    Iterations,
    /// Stops when the training error drops below the provided threshold
    ErrorThreshold(f64),
    /// Stops after the provided duration
    Duration(Duration),
}

impl Default for StopCondition {
    fn default() -> Self {
        StopCondition::Iterations
    }
}

impl From<Duration> for StopCondition {
    fn from(duration: Duration) -> StopCondition {
        StopCondition::Duration(duration)
    }
}

impl StopCondition {
    /// Returns true if training is complete.
    pub(crate) fn should_stop(&self, training_error: f64, start_time: Instant) -> bool {
        match *self {
            StopCondition::Iterations => false,
            StopCondition::ErrorThreshold(threshold) => training_error < threshold,
            StopCondition::Duration(limit) => start_time.elapsed() > limit,
        }
    }
}
