//! # Sparse Weight Table
//!
//! Per-predicate parameters and the log-linear evaluator that turns a sparse
//! context into a normalized outcome distribution.

use serde::{Deserialize, Serialize};

use crate::error::{KotobaError, Result};

/// Weights of a single predicate, stored only for its active outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateParams {
    outcomes: Vec<usize>,
    weights: Vec<f64>,
}

impl PredicateParams {
    /// Build a parameter entry, checking that `outcomes` is strictly increasing
    /// and parallel to `weights`.
    pub fn new(outcomes: Vec<usize>, weights: Vec<f64>) -> Result<Self> {
        if outcomes.len() != weights.len() {
            return Err(KotobaError::LengthMismatch {
                what: "predicate weights",
                expected: outcomes.len(),
                actual: weights.len(),
            });
        }
        if outcomes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(KotobaError::InvalidArgument(format!(
                "active outcomes must be strictly increasing: {:?}",
                outcomes
            )));
        }
        Ok(Self { outcomes, weights })
    }

    /// All weights start at zero.
    pub fn zeroed(outcomes: Vec<usize>) -> Self {
        debug_assert!(outcomes.windows(2).all(|pair| pair[0] < pair[1]));
        let weights = vec![0.0; outcomes.len()];
        Self { outcomes, weights }
    }

    /// Active outcome ids, strictly increasing.
    pub fn outcomes(&self) -> &[usize] {
        &self.outcomes
    }

    /// One weight per active outcome.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of active outcomes.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// A predicate without active outcomes contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Add `delta` to the weight stored at `slot`.
    pub fn update_weight(&mut self, slot: usize, delta: f64) {
        self.weights[slot] += delta;
    }

    /// Iterate `(outcome id, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.outcomes.iter().copied().zip(self.weights.iter().copied())
    }
}

/// The full weight table plus the legacy GIS correction scalars.
///
/// Newly trained models use a correction constant of 1 and a correction
/// parameter of 0, which reduces evaluation to a plain softmax over the
/// accumulated scores. Other values only matter for models produced by
/// older trainers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalParameters {
    params: Vec<PredicateParams>,
    num_outcomes: usize,
    correction_constant: f64,
    correction_param: f64,
}

impl EvalParameters {
    /// Parameters with the neutral correction scalars (1, 0).
    pub fn new(params: Vec<PredicateParams>, num_outcomes: usize) -> Self {
        Self {
            params,
            num_outcomes,
            correction_constant: 1.0,
            correction_param: 0.0,
        }
    }

    /// Parameters carrying legacy correction scalars.
    pub fn with_correction(
        params: Vec<PredicateParams>,
        num_outcomes: usize,
        correction_constant: f64,
        correction_param: f64,
    ) -> Result<Self> {
        if correction_constant.is_nan() || correction_constant <= 0.0 {
            return Err(KotobaError::InvalidArgument(format!(
                "correction constant must be positive, got {}",
                correction_constant
            )));
        }
        Ok(Self {
            params,
            num_outcomes,
            correction_constant,
            correction_param,
        })
    }

    /// Per-predicate parameters indexed by predicate id.
    pub fn params(&self) -> &[PredicateParams] {
        &self.params
    }

    /// Mutable access for trainers that update weights in place.
    pub fn params_mut(&mut self) -> &mut [PredicateParams] {
        &mut self.params
    }

    /// Number of outcomes every distribution covers.
    pub fn num_outcomes(&self) -> usize {
        self.num_outcomes
    }

    /// Legacy correction constant.
    pub fn correction_constant(&self) -> f64 {
        self.correction_constant
    }

    /// Legacy correction parameter.
    pub fn correction_param(&self) -> f64 {
        self.correction_param
    }

    /// Evaluate a context in place.
    ///
    /// `scores` must hold `num_outcomes` entries and arrive filled with the
    /// prior's log scores; on return it holds the normalized distribution.
    /// Predicate ids outside the table are ignored. When `values` is given it
    /// must be parallel to `context`; otherwise every predicate has value 1.
    pub fn eval_into(&self, context: &[usize], values: Option<&[f32]>, scores: &mut [f64]) {
        debug_assert_eq!(scores.len(), self.num_outcomes);
        let legacy = self.correction_param != 0.0;
        let mut touched = if legacy {
            vec![0u32; self.num_outcomes]
        } else {
            Vec::new()
        };

        for (i, &pred) in context.iter().enumerate() {
            let Some(entry) = self.params.get(pred) else {
                continue;
            };
            let value = values.map_or(1.0, |v| f64::from(v[i]));
            for (oid, weight) in entry.iter() {
                scores[oid] += weight * value;
                if legacy {
                    touched[oid] += 1;
                }
            }
        }

        let inverse = 1.0 / self.correction_constant;
        for (oid, score) in scores.iter_mut().enumerate() {
            *score *= inverse;
            if legacy {
                let coverage = f64::from(touched[oid]) / self.correction_constant;
                *score += (1.0 - coverage) * self.correction_param;
            }
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut normal = 0.0;
        for score in scores.iter_mut() {
            *score = (*score - max).exp();
            normal += *score;
        }
        for score in scores.iter_mut() {
            *score /= normal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EvalParameters {
        EvalParameters::new(
            vec![
                PredicateParams::new(vec![0, 1], vec![1.0, -1.0]).unwrap(),
                PredicateParams::new(vec![2], vec![0.5]).unwrap(),
                PredicateParams::zeroed(Vec::new()),
            ],
            3,
        )
    }

    #[test]
    fn test_rejects_unsorted_outcomes() {
        assert!(PredicateParams::new(vec![1, 0], vec![0.0, 0.0]).is_err());
        assert!(PredicateParams::new(vec![1, 1], vec![0.0, 0.0]).is_err());
        assert!(PredicateParams::new(vec![0], vec![]).is_err());
    }

    #[test]
    fn test_empty_context_is_uniform() {
        let params = table();
        let mut scores = vec![0.0; 3];
        params.eval_into(&[], None, &mut scores);
        for p in scores {
            assert!((p - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_over_active_outcomes() {
        let params = table();
        let mut scores = vec![0.0; 3];
        params.eval_into(&[0], None, &mut scores);

        let z = 1f64.exp() + (-1f64).exp() + 1.0;
        assert!((scores[0] - 1f64.exp() / z).abs() < 1e-12);
        assert!((scores[1] - (-1f64).exp() / z).abs() < 1e-12);
        assert!((scores[2] - 1.0 / z).abs() < 1e-12);
    }

    #[test]
    fn test_values_scale_weights() {
        let params = table();
        let mut scaled = vec![0.0; 3];
        params.eval_into(&[1], Some(&[2.0]), &mut scaled);
        let mut doubled = vec![0.0; 3];
        params.eval_into(&[1, 1], None, &mut doubled);
        for (a, b) in scaled.iter().zip(&doubled) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unknown_predicates_are_ignored() {
        let params = table();
        let mut with_unknown = vec![0.0; 3];
        params.eval_into(&[0, 99], None, &mut with_unknown);
        let mut known = vec![0.0; 3];
        params.eval_into(&[0], None, &mut known);
        assert_eq!(with_unknown, known);
    }

    #[test]
    fn test_legacy_correction_changes_distribution() {
        let plain = table();
        let legacy =
            EvalParameters::with_correction(plain.params().to_vec(), 3, 2.0, 0.5).unwrap();

        let mut a = vec![0.0; 3];
        plain.eval_into(&[0], None, &mut a);
        let mut b = vec![0.0; 3];
        legacy.eval_into(&[0], None, &mut b);

        assert!((b.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((a[0] - b[0]).abs() > 1e-6);
    }

    #[test]
    fn test_correction_constant_must_be_positive() {
        assert!(EvalParameters::with_correction(Vec::new(), 1, 0.0, 0.0).is_err());
    }
}
