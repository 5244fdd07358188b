//! # GIS Model
//!
//! An immutable log-linear model: outcome and predicate label tables plus the
//! sparse weight table produced by the trainer.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use crate::error::{KotobaError, Result};
use crate::model::ClassificationModel;
use crate::model::params::EvalParameters;
use crate::model::prior::{Prior, UniformPrior};

/// A trained maximum-entropy model.
///
/// The model is read-only after construction and can be shared across
/// threads; every decoder borrows it.
#[derive(Debug, Clone)]
pub struct GisModel {
    outcomes: Vec<String>,
    predicates: Vec<String>,
    predicate_index: HashMap<String, usize>,
    params: EvalParameters,
    prior: Arc<dyn Prior>,
}

impl GisModel {
    /// Assemble a model from its weight table and label tables.
    ///
    /// `params` must hold one entry per predicate label, and every active
    /// outcome id must address `outcomes`.
    pub fn new(
        params: EvalParameters,
        predicates: Vec<String>,
        outcomes: Vec<String>,
    ) -> Result<Self> {
        if params.params().len() != predicates.len() {
            return Err(KotobaError::LengthMismatch {
                what: "predicate parameters",
                expected: predicates.len(),
                actual: params.params().len(),
            });
        }
        if params.num_outcomes() != outcomes.len() {
            return Err(KotobaError::LengthMismatch {
                what: "outcome labels",
                expected: params.num_outcomes(),
                actual: outcomes.len(),
            });
        }
        if outcomes.is_empty() {
            return Err(KotobaError::InvalidArgument(
                "a model needs at least one outcome".into(),
            ));
        }
        if let Some((pred, _)) = params
            .params()
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.outcomes().iter().any(|&oid| oid >= outcomes.len()))
        {
            return Err(KotobaError::InvalidArgument(format!(
                "predicate {:?} references an outcome outside the table",
                predicates[pred]
            )));
        }

        let mut predicate_index = HashMap::with_capacity(predicates.len());
        for (id, name) in predicates.iter().enumerate() {
            if predicate_index.insert(name.clone(), id).is_some() {
                return Err(KotobaError::InvalidArgument(format!(
                    "duplicate predicate label {:?}",
                    name
                )));
            }
        }

        debug!(
            "Assembled model with {} outcomes and {} predicates",
            outcomes.len(),
            predicates.len()
        );
        Ok(Self {
            outcomes,
            predicates,
            predicate_index,
            params,
            prior: Arc::new(UniformPrior),
        })
    }

    /// Replace the uniform prior.
    pub fn with_prior(mut self, prior: Arc<dyn Prior>) -> Self {
        self.prior = prior;
        self
    }

    /// Evaluate a context already mapped to predicate ids.
    pub fn eval_ids(&self, context: &[usize], values: Option<&[f32]>) -> Vec<f64> {
        let mut dist = vec![0.0; self.outcomes.len()];
        self.prior.log_prior(&mut dist, context, values);
        self.params.eval_into(context, values, &mut dist);
        dist
    }

    /// Id of a predicate label, if it was seen during training.
    pub fn predicate_id(&self, predicate: &str) -> Option<usize> {
        self.predicate_index.get(predicate).copied()
    }

    /// Predicate labels ordered by id.
    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    /// The weight table.
    pub fn parameters(&self) -> &EvalParameters {
        &self.params
    }

    /// Render a distribution as `label[p] label[p] ...` for diagnostics.
    pub fn all_outcomes(&self, probs: &[f64]) -> String {
        let mut out = String::new();
        for (label, p) in self.outcomes.iter().zip(probs) {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{}[{:.4}]", label, p);
        }
        out
    }

    fn resolve(&self, context: &[String]) -> Vec<usize> {
        context
            .iter()
            .filter_map(|pred| self.predicate_id(pred))
            .collect()
    }
}

impl ClassificationModel for GisModel {
    fn eval(&self, context: &[String]) -> Vec<f64> {
        let ids = self.resolve(context);
        self.eval_ids(&ids, None)
    }

    fn eval_with_values(&self, context: &[String], values: &[f32]) -> Result<Vec<f64>> {
        if context.len() != values.len() {
            return Err(KotobaError::LengthMismatch {
                what: "context values",
                expected: context.len(),
                actual: values.len(),
            });
        }
        let (ids, kept): (Vec<usize>, Vec<f32>) = context
            .iter()
            .zip(values)
            .filter_map(|(pred, &value)| self.predicate_id(pred).map(|id| (id, value)))
            .unzip();
        Ok(self.eval_ids(&ids, Some(&kept)))
    }

    fn outcomes(&self) -> &[String] {
        &self.outcomes
    }
}
