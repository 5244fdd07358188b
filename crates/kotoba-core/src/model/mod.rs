pub mod gis;
pub mod params;
pub mod prior;

pub use gis::GisModel;
pub use params::{EvalParameters, PredicateParams};
pub use prior::{Prior, UniformPrior};

use std::sync::Arc;

use crate::error::Result;

/// A classifier that maps a feature context to a distribution over a fixed
/// set of outcome labels.
pub trait ClassificationModel: Send + Sync {
    /// Outcome probabilities for a context, in outcome-id order.
    fn eval(&self, context: &[String]) -> Vec<f64>;

    /// Like [`ClassificationModel::eval`] with one real value per predicate.
    fn eval_with_values(&self, context: &[String], values: &[f32]) -> Result<Vec<f64>>;

    /// Outcome labels ordered by id.
    fn outcomes(&self) -> &[String];

    /// Number of outcomes.
    fn num_outcomes(&self) -> usize {
        self.outcomes().len()
    }

    /// Label of an outcome id.
    fn outcome(&self, id: usize) -> Option<&str> {
        self.outcomes().get(id).map(String::as_str)
    }

    /// Id of an outcome label.
    fn index_of(&self, outcome: &str) -> Option<usize> {
        self.outcomes().iter().position(|o| o == outcome)
    }

    /// Label with the highest probability; the lowest id wins ties.
    fn best_outcome(&self, probs: &[f64]) -> Option<&str> {
        let mut best: Option<(usize, f64)> = None;
        for (id, &p) in probs.iter().enumerate() {
            if best.is_none_or(|(_, top)| p > top) {
                best = Some((id, p));
            }
        }
        best.and_then(|(id, _)| self.outcome(id))
    }
}

impl<T: ClassificationModel + ?Sized> ClassificationModel for Arc<T> {
    fn eval(&self, context: &[String]) -> Vec<f64> {
        (**self).eval(context)
    }

    fn eval_with_values(&self, context: &[String], values: &[f32]) -> Result<Vec<f64>> {
        (**self).eval_with_values(context, values)
    }

    fn outcomes(&self) -> &[String] {
        (**self).outcomes()
    }
}
