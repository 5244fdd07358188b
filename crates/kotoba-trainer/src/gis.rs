//! # GIS Trainer
//!
//! Generalized iterative scaling over indexed events. Model expectations are
//! computed in parallel over contiguous event shards; each shard fills a
//! private accumulator and the accumulators are summed in shard order, so a
//! run is reproducible for a fixed thread count.

use std::ops::Range;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use kotoba_core::model::{EvalParameters, GisModel, PredicateParams, Prior, UniformPrior};

use crate::error::{Result, TrainerError};
use crate::indexer::IndexedData;
use crate::params::{Smoothing, TrainingParams};

const NEWTON_MAX_STEPS: usize = 50;
const NEWTON_TOLERANCE: f64 = 1e-6;

/// Trains [`GisModel`]s from [`IndexedData`].
#[derive(Debug, Clone)]
pub struct GisTrainer {
    params: TrainingParams,
    prior: Arc<dyn Prior>,
}

impl GisTrainer {
    /// Create a trainer, rejecting invalid parameters before any work starts.
    pub fn new(params: TrainingParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            prior: Arc::new(UniformPrior),
        })
    }

    /// Train against a non-uniform prior. The prior is attached to the model.
    pub fn with_prior(mut self, prior: Arc<dyn Prior>) -> Self {
        self.prior = prior;
        self
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Run GIS until the iteration budget is spent, the log-likelihood gain
    /// drops below the convergence threshold, or the log-likelihood falls.
    ///
    /// On a fall the weights of the last improving iteration are returned.
    pub fn train(&self, data: &IndexedData) -> Result<GisModel> {
        data.validate()?;
        if data.num_events() == 0 {
            return Err(TrainerError::EmptyTrainingData);
        }

        let num_outcomes = data.num_outcomes();
        let correction_constant = (0..data.num_events())
            .map(|i| data.feature_mass(i))
            .fold(0.0, f64::max);
        if correction_constant.is_nan() || correction_constant <= 0.0 {
            return Err(TrainerError::InconsistentData(format!(
                "events carry no feature mass (correction constant {correction_constant})"
            )));
        }

        info!(
            "Training GIS model: {} unique events, {} predicates, {} outcomes, correction constant {}",
            data.num_events(),
            data.num_predicates(),
            num_outcomes,
            correction_constant
        );

        let (mut params, observed) = self.initial_parameters(data);
        let shards = shard_ranges(data.num_events(), self.params.threads);
        let pool = if shards.len() > 1 {
            Some(ThreadPoolBuilder::new().num_threads(shards.len()).build()?)
        } else {
            None
        };

        let mut previous_ll: Option<f64> = None;
        let mut checkpoint: Option<EvalParameters> = None;
        let mut completed = 0;

        for iteration in 1..=self.params.iterations {
            let stats = self.expectations(data, &params, &shards, pool.as_ref());
            let log_likelihood = stats.log_likelihood;
            debug!(
                "{:>4}: loglikelihood={:.6} accuracy={:.5}",
                iteration,
                log_likelihood,
                stats.accuracy()
            );

            let step = progress(
                previous_ll,
                log_likelihood,
                self.params.convergence_threshold,
            );
            if step == Progress::Diverged {
                warn!(
                    "Model diverging: log-likelihood fell to {:.6} at iteration {}",
                    log_likelihood, iteration
                );
                if let Some(best) = checkpoint.take() {
                    params = best;
                }
                break;
            }

            let before = params.clone();
            self.update(&mut params, &observed, &stats.model, correction_constant);
            if !all_finite(&params) {
                warn!(
                    "Non-finite weights after iteration {}, keeping the previous weights",
                    iteration
                );
                params = before;
                break;
            }
            checkpoint = Some(before);
            completed = iteration;

            if let Progress::Converged(gain) = step {
                info!(
                    "Converged after {} iterations (log-likelihood gain {:.3e})",
                    iteration, gain
                );
                break;
            }
            previous_ll = Some(log_likelihood);
        }

        info!("Finished training after {} iterations", completed);

        let model = GisModel::new(
            params,
            data.predicate_labels.clone(),
            data.outcome_labels.clone(),
        )?;
        Ok(model.with_prior(Arc::clone(&self.prior)))
    }

    /// Zeroed weights over each predicate's active outcomes, and the observed
    /// expectation of every active (predicate, outcome) slot.
    fn initial_parameters(&self, data: &IndexedData) -> (EvalParameters, Vec<Vec<f64>>) {
        let num_outcomes = data.num_outcomes();
        let mut counts = vec![vec![0.0f64; num_outcomes]; data.num_predicates()];
        for (i, context) in data.contexts.iter().enumerate() {
            let count = f64::from(data.counts[i]);
            let outcome = data.outcomes[i];
            for (j, &pid) in context.iter().enumerate() {
                let value = data.values_at(i).map_or(1.0, |v| f64::from(v[j]));
                counts[pid][outcome] += count * value;
            }
        }

        let pseudo_count = match self.params.smoothing {
            Smoothing::Simple { observation } => Some(observation),
            _ => None,
        };

        let mut table = Vec::with_capacity(counts.len());
        let mut observed = Vec::with_capacity(counts.len());
        for (pid, row) in counts.iter().enumerate() {
            let active: Vec<usize> = if pseudo_count.is_some() {
                (0..num_outcomes).collect()
            } else if data.predicate_counts[pid] >= self.params.cutoff {
                (0..num_outcomes).filter(|&oid| row[oid] != 0.0).collect()
            } else {
                Vec::new()
            };
            observed.push(
                active
                    .iter()
                    .map(|&oid| match pseudo_count {
                        Some(pseudo) if row[oid] == 0.0 => pseudo,
                        _ => row[oid],
                    })
                    .collect(),
            );
            table.push(PredicateParams::zeroed(active));
        }

        (EvalParameters::new(table, num_outcomes), observed)
    }

    fn expectations(
        &self,
        data: &IndexedData,
        params: &EvalParameters,
        shards: &[Range<usize>],
        pool: Option<&ThreadPool>,
    ) -> Expectations {
        let partials: Vec<Expectations> = match pool {
            Some(pool) => pool.install(|| {
                shards
                    .par_iter()
                    .map(|range| self.shard_expectations(data, params, range.clone()))
                    .collect()
            }),
            None => shards
                .iter()
                .map(|range| self.shard_expectations(data, params, range.clone()))
                .collect(),
        };

        let mut partials = partials.into_iter();
        let mut total = partials
            .next()
            .unwrap_or_else(|| Expectations::zeroed(params));
        for partial in partials {
            total.merge(partial);
        }
        total
    }

    fn shard_expectations(
        &self,
        data: &IndexedData,
        params: &EvalParameters,
        range: Range<usize>,
    ) -> Expectations {
        let mut acc = Expectations::zeroed(params);
        let mut dist = vec![0.0; params.num_outcomes()];

        for i in range {
            let context = &data.contexts[i];
            let values = data.values_at(i);
            self.prior.log_prior(&mut dist, context, values);
            params.eval_into(context, values, &mut dist);

            let count = f64::from(data.counts[i]);
            for (j, &pid) in context.iter().enumerate() {
                if data.predicate_counts[pid] < self.params.cutoff {
                    continue;
                }
                let value = values.map_or(1.0, |v| f64::from(v[j]));
                let entry = &params.params()[pid];
                for (slot, &oid) in entry.outcomes().iter().enumerate() {
                    acc.model[pid][slot] += dist[oid] * value * count;
                }
            }

            let gold = data.outcomes[i];
            acc.log_likelihood += dist[gold].ln() * count;
            acc.events += u64::from(data.counts[i]);
            if argmax(&dist) == gold {
                acc.correct += u64::from(data.counts[i]);
            }
        }
        acc
    }

    fn update(
        &self,
        params: &mut EvalParameters,
        observed: &[Vec<f64>],
        model: &[Vec<f64>],
        correction_constant: f64,
    ) {
        for (pid, entry) in params.params_mut().iter_mut().enumerate() {
            for slot in 0..entry.len() {
                let expected = model[pid][slot];
                let delta = match self.params.smoothing {
                    Smoothing::Gaussian { sigma } => gaussian_update(
                        entry.weights()[slot],
                        expected,
                        observed[pid][slot],
                        correction_constant,
                        sigma,
                    ),
                    _ => {
                        if expected == 0.0 {
                            debug!("Skipping update of predicate {pid}: zero model expectation");
                            continue;
                        }
                        (observed[pid][slot].ln() - expected.ln()) / correction_constant
                    }
                };
                entry.update_weight(slot, delta);
            }
        }
    }
}

/// Outcome of comparing an iteration's log-likelihood with the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Progress {
    Improving,
    /// The gain fell below the threshold. The pending update is still applied.
    Converged(f64),
    /// The log-likelihood fell or is not finite.
    Diverged,
}

fn progress(previous: Option<f64>, current: f64, threshold: f64) -> Progress {
    if !current.is_finite() {
        return Progress::Diverged;
    }
    match previous {
        None => Progress::Improving,
        Some(previous) if current < previous => Progress::Diverged,
        Some(previous) if current - previous < threshold => Progress::Converged(current - previous),
        Some(_) => Progress::Improving,
    }
}

fn all_finite(params: &EvalParameters) -> bool {
    params
        .params()
        .iter()
        .flat_map(|p| p.weights())
        .all(|w| w.is_finite())
}

/// Newton's method for the Gaussian-penalized step of one weight.
fn gaussian_update(
    param: f64,
    model: f64,
    observed: f64,
    correction_constant: f64,
    sigma: f64,
) -> f64 {
    let mut x = 0.0;
    for _ in 0..NEWTON_MAX_STEPS {
        let tmp = model * (correction_constant * x).exp();
        let f = tmp + (param + x) / sigma - observed;
        let fp = tmp * correction_constant + 1.0 / sigma;
        if fp == 0.0 {
            break;
        }
        let next = x - f / fp;
        if (next - x).abs() < NEWTON_TOLERANCE {
            return next;
        }
        x = next;
    }
    x
}

/// Split `events` into `threads` contiguous ranges whose sizes differ by at
/// most one. Empty ranges are left out.
fn shard_ranges(events: usize, threads: usize) -> Vec<Range<usize>> {
    let threads = threads.max(1);
    let base = events / threads;
    let leftover = events % threads;
    let mut ranges = Vec::with_capacity(threads);
    let mut start = 0;
    for i in 0..threads {
        let len = base + usize::from(i < leftover);
        if len == 0 {
            break;
        }
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

fn argmax(dist: &[f64]) -> usize {
    let mut best = 0;
    for (i, &p) in dist.iter().enumerate() {
        if p > dist[best] {
            best = i;
        }
    }
    best
}

/// Per-shard accumulator.
struct Expectations {
    model: Vec<Vec<f64>>,
    log_likelihood: f64,
    correct: u64,
    events: u64,
}

impl Expectations {
    fn zeroed(params: &EvalParameters) -> Self {
        Self {
            model: params.params().iter().map(|p| vec![0.0; p.len()]).collect(),
            log_likelihood: 0.0,
            correct: 0,
            events: 0,
        }
    }

    fn merge(&mut self, other: Expectations) {
        for (mine, theirs) in self.model.iter_mut().zip(other.model) {
            for (a, b) in mine.iter_mut().zip(theirs) {
                *a += b;
            }
        }
        self.log_likelihood += other.log_likelihood;
        self.correct += other.correct;
        self.events += other.events;
    }

    fn accuracy(&self) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            self.correct as f64 / self.events as f64
        }
    }
}
