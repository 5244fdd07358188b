//! # Training Parameters
//!
//! Options recognized by the trainer, with defaults, builder methods and a
//! parser for the textual key/value form.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainerError};

/// Default number of training iterations.
pub const DEFAULT_ITERATIONS: usize = 100;
/// Default minimum number of occurrences for a predicate to be kept.
pub const DEFAULT_CUTOFF: u32 = 5;
/// Default number of worker threads.
pub const DEFAULT_THREADS: usize = 1;
/// Pseudo-count given to unseen (predicate, outcome) pairs under simple smoothing.
pub const DEFAULT_SMOOTHING_OBSERVATION: f64 = 0.1;
/// Default standard deviation of the Gaussian prior.
pub const DEFAULT_SIGMA: f64 = 2.0;
/// Minimum log-likelihood gain per iteration before training stops.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-4;

/// Training algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// Generalized iterative scaling for maximum-entropy models.
    #[default]
    #[serde(rename = "GIS", alias = "MAXENT")]
    Gis,
}

impl FromStr for Algorithm {
    type Err = TrainerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GIS" | "MAXENT" => Ok(Algorithm::Gis),
            _ => Err(TrainerError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Gis => write!(f, "GIS"),
        }
    }
}

/// How observed expectations are smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Smoothing {
    /// Observed counts only; predicates keep just the outcomes they were seen with.
    #[default]
    None,
    /// Every predicate is active for every outcome; unseen pairs get a pseudo-count.
    Simple {
        /// Pseudo-count for unseen pairs.
        observation: f64,
    },
    /// L2 penalty on the weights, solved per weight with Newton's method.
    Gaussian {
        /// Standard deviation of the prior.
        sigma: f64,
    },
}

impl Smoothing {
    /// Simple smoothing with the default pseudo-count.
    pub fn simple() -> Self {
        Smoothing::Simple {
            observation: DEFAULT_SMOOTHING_OBSERVATION,
        }
    }

    /// Gaussian smoothing with the default sigma.
    pub fn gaussian() -> Self {
        Smoothing::Gaussian {
            sigma: DEFAULT_SIGMA,
        }
    }
}

/// Configuration for a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Which optimizer to run
    pub algorithm: Algorithm,
    /// Upper bound on training iterations
    pub iterations: usize,
    /// Predicates seen fewer times than this are dropped
    pub cutoff: u32,
    /// Worker threads used to compute model expectations
    pub threads: usize,
    /// Smoothing of observed expectations
    pub smoothing: Smoothing,
    /// Training stops when the log-likelihood gain falls below this
    pub convergence_threshold: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Gis,
            iterations: DEFAULT_ITERATIONS,
            cutoff: DEFAULT_CUTOFF,
            threads: DEFAULT_THREADS,
            smoothing: Smoothing::None,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }
}

impl TrainingParams {
    /// Create training parameters with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration budget.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the predicate cutoff.
    pub fn with_cutoff(mut self, cutoff: u32) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the smoothing mode.
    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Set the convergence threshold.
    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Check ranges that serde and the builders cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.threads < 1 {
            return Err(TrainerError::InvalidThreadCount(self.threads));
        }
        match self.smoothing {
            Smoothing::Simple { observation } if observation.is_nan() || observation <= 0.0 => {
                return Err(invalid("SmoothingObservation", "must be positive"));
            }
            Smoothing::Gaussian { sigma } if sigma.is_nan() || sigma <= 0.0 => {
                return Err(invalid("GaussianSigma", "must be positive"));
            }
            _ => {}
        }
        if self.convergence_threshold.is_nan() || self.convergence_threshold < 0.0 {
            return Err(invalid("ConvergenceThreshold", "must not be negative"));
        }
        Ok(())
    }

    /// Parse the textual options form.
    ///
    /// Recognized keys: `Algorithm`, `Iterations`, `Cutoff`, `Threads`,
    /// `Smoothing` (`none`, `simple`, `gaussian`), `SmoothingObservation`,
    /// `GaussianSigma`, `ConvergenceThreshold`. Other keys are ignored.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        let mut params = Self::default();

        if let Some(value) = options.get("Algorithm") {
            params.algorithm = value.parse()?;
        }
        if let Some(value) = options.get("Iterations") {
            params.iterations = parse_number("Iterations", value)?;
        }
        if let Some(value) = options.get("Cutoff") {
            params.cutoff = parse_number("Cutoff", value)?;
        }
        if let Some(value) = options.get("Threads") {
            params.threads = parse_number("Threads", value)?;
        }
        if let Some(value) = options.get("ConvergenceThreshold") {
            params.convergence_threshold = parse_number("ConvergenceThreshold", value)?;
        }

        let observation = options
            .get("SmoothingObservation")
            .map(|v| parse_number("SmoothingObservation", v))
            .transpose()?;
        let sigma = options
            .get("GaussianSigma")
            .map(|v| parse_number("GaussianSigma", v))
            .transpose()?;

        if let Some(value) = options.get("Smoothing") {
            params.smoothing = match value.trim().to_ascii_lowercase().as_str() {
                "none" | "false" => Smoothing::None,
                "simple" | "true" => Smoothing::Simple {
                    observation: observation.unwrap_or(DEFAULT_SMOOTHING_OBSERVATION),
                },
                "gaussian" => Smoothing::Gaussian {
                    sigma: sigma.unwrap_or(DEFAULT_SIGMA),
                },
                other => {
                    return Err(invalid(
                        "Smoothing",
                        &format!("expected none, simple or gaussian, got {other:?}"),
                    ));
                }
            };
        }

        params.validate()?;
        Ok(params)
    }
}

fn invalid(name: &str, reason: &str) -> TrainerError {
    TrainerError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(name, &format!("{value:?}: {e}")))
}
