//! # Beam Search Decoding
//!
//! Approximate search for the most probable label sequence. At every token
//! the decoder extends each kept sequence with each outcome the validator
//! accepts, then keeps the `beam_size` best successors.

use crate::context::{ContextGenerator, ExtraContext};
use crate::error::{KotobaError, Result};
use crate::model::ClassificationModel;
use crate::search::validator::SequenceValidator;
use crate::types::Sequence;

/// Beam size used when the caller does not pick one.
pub const DEFAULT_BEAM_SIZE: usize = 3;

/// Beam search decoder over a classification model and a context generator.
#[derive(Debug)]
pub struct BeamSearch<'a, M: ?Sized, G: ?Sized> {
    model: &'a M,
    generator: &'a G,
    beam_size: usize,
}

/// A scored extension of one beam entry, materialized only if it survives.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    parent: usize,
    outcome: usize,
    prob: f64,
}

impl<'a, M, G> BeamSearch<'a, M, G>
where
    M: ClassificationModel + ?Sized,
    G: ContextGenerator + ?Sized,
{
    /// Create a decoder keeping `beam_size` sequences per position.
    ///
    /// # Arguments
    /// * `model` - Per-position outcome distribution
    /// * `generator` - Feature generator for each position
    /// * `beam_size` - Number of sequences kept after each step, at least 1
    pub fn new(model: &'a M, generator: &'a G, beam_size: usize) -> Result<Self> {
        if beam_size == 0 {
            return Err(KotobaError::InvalidArgument(
                "beam size must be at least 1".into(),
            ));
        }
        Ok(Self {
            model,
            generator,
            beam_size,
        })
    }

    /// Number of sequences kept per position.
    pub fn beam_size(&self) -> usize {
        self.beam_size
    }

    /// The `k` best complete sequences, best first.
    ///
    /// Fewer than `k` sequences are returned when the beam holds fewer.
    /// Successors are ranked by cumulative log probability; equal scores keep
    /// generation order (beam rank, then outcome id), so decoding is fully
    /// deterministic.
    pub fn best_sequences(
        &self,
        k: usize,
        tokens: &[String],
        extra: ExtraContext<'_>,
        validator: &dyn SequenceValidator,
    ) -> Result<Vec<Sequence>> {
        if k == 0 {
            return Err(KotobaError::InvalidArgument(
                "number of sequences must be at least 1".into(),
            ));
        }

        let mut beam = vec![Sequence::new()];
        let mut candidates = Vec::new();

        for index in 0..tokens.len() {
            candidates.clear();

            for (parent, sequence) in beam.iter().enumerate() {
                let history = sequence.outcomes();
                let context = self.generator.context(index, tokens, history, extra);
                let probs = self.model.eval(&context);

                for (outcome, &prob) in probs.iter().enumerate() {
                    if prob <= 0.0 {
                        continue;
                    }
                    let Some(label) = self.model.outcome(outcome) else {
                        continue;
                    };
                    if validator.valid(index, tokens, history, label) {
                        candidates.push(Candidate {
                            score: sequence.score() + prob.ln(),
                            parent,
                            outcome,
                            prob,
                        });
                    }
                }
            }

            if candidates.is_empty() {
                return Err(KotobaError::EmptyBeam { position: index });
            }

            // stable: ties keep generation order
            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
            candidates.truncate(self.beam_size);

            let mut next = Vec::with_capacity(candidates.len());
            for candidate in &candidates {
                let label = self.model.outcome(candidate.outcome).unwrap_or_default();
                next.push(beam[candidate.parent].extend(label, candidate.prob));
            }
            beam = next;
        }

        beam.truncate(k);
        Ok(beam)
    }

    /// The single best complete sequence.
    pub fn best_sequence(
        &self,
        tokens: &[String],
        extra: ExtraContext<'_>,
        validator: &dyn SequenceValidator,
    ) -> Result<Sequence> {
        self.best_sequences(1, tokens, extra, validator)?
            .into_iter()
            .next()
            .ok_or(KotobaError::EmptyBeam { position: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::validator::AcceptAll;

    /// Looks up a fixed distribution per (token, previous outcome).
    struct TableModel {
        outcomes: Vec<String>,
    }

    impl ClassificationModel for TableModel {
        fn eval(&self, context: &[String]) -> Vec<f64> {
            match (context[0].as_str(), context[1].as_str()) {
                ("a", _) => vec![0.6, 0.4],
                ("b", "po=X") => vec![0.1, 0.9],
                ("b", _) => vec![0.5, 0.5],
                ("c", "po=Y") => vec![0.2, 0.8],
                ("c", _) => vec![0.7, 0.3],
                _ => vec![0.5, 0.5],
            }
        }

        fn eval_with_values(&self, context: &[String], _values: &[f32]) -> Result<Vec<f64>> {
            Ok(self.eval(context))
        }

        fn outcomes(&self) -> &[String] {
            &self.outcomes
        }
    }

    struct TokenAndPrevious;

    impl ContextGenerator for TokenAndPrevious {
        fn context(
            &self,
            index: usize,
            tokens: &[String],
            history: &[String],
            _extra: ExtraContext<'_>,
        ) -> Vec<String> {
            assert_eq!(history.len(), index);
            let prev = history.last().map_or("BOS", String::as_str);
            vec![tokens[index].clone(), format!("po={prev}")]
        }
    }

    struct NeverY;

    impl SequenceValidator for NeverY {
        fn valid(&self, _: usize, _: &[String], _: &[String], outcome: &str) -> bool {
            outcome != "Y"
        }
    }

    struct RejectAll;

    impl SequenceValidator for RejectAll {
        fn valid(&self, _: usize, _: &[String], _: &[String], _: &str) -> bool {
            false
        }
    }

    fn model() -> TableModel {
        TableModel {
            outcomes: vec!["X".into(), "Y".into()],
        }
    }

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_beam_of_one_is_greedy() {
        let model = model();
        let search = BeamSearch::new(&model, &TokenAndPrevious, 1).unwrap();

        // a -> X (0.6), b after X -> Y (0.9), c after Y -> Y (0.8)
        let best = search
            .best_sequence(&tokens(&["a", "b", "c"]), ExtraContext::default(), &AcceptAll)
            .unwrap();
        assert_eq!(best.outcomes(), ["X", "Y", "Y"]);
        assert_eq!(best.probs(), [0.6, 0.9, 0.8]);
        let expected = 0.6f64.ln() + 0.9f64.ln() + 0.8f64.ln();
        assert!((best.score() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_wider_beam_finds_better_path() {
        let model = model();
        let search = BeamSearch::new(&model, &TokenAndPrevious, 4).unwrap();

        let found = search
            .best_sequences(4, &tokens(&["a", "b", "c"]), ExtraContext::default(), &AcceptAll)
            .unwrap();
        assert_eq!(found.len(), 4);
        assert_eq!(found[0].outcomes(), ["X", "Y", "Y"]);
        for pair in found.windows(2) {
            assert!(pair[0].score() >= pair[1].score());
        }
    }

    #[test]
    fn test_validator_constrains_choices() {
        let model = model();
        let search = BeamSearch::new(&model, &TokenAndPrevious, 2).unwrap();

        let best = search
            .best_sequence(&tokens(&["a", "b", "c"]), ExtraContext::default(), &NeverY)
            .unwrap();
        assert_eq!(best.outcomes(), ["X", "X", "X"]);
    }

    #[test]
    fn test_empty_input_yields_empty_sequence() {
        let model = model();
        let search = BeamSearch::new(&model, &TokenAndPrevious, 3).unwrap();
        let best = search
            .best_sequence(&[], ExtraContext::default(), &AcceptAll)
            .unwrap();
        assert!(best.is_empty());
        assert_eq!(best.score(), 0.0);
    }

    #[test]
    fn test_rejecting_validator_reports_position() {
        let model = model();
        let search = BeamSearch::new(&model, &TokenAndPrevious, 3).unwrap();
        let err = search
            .best_sequence(&tokens(&["a"]), ExtraContext::default(), &RejectAll)
            .unwrap_err();
        assert!(matches!(err, KotobaError::EmptyBeam { position: 0 }));
    }

    #[test]
    fn test_invalid_sizes() {
        let model = model();
        assert!(BeamSearch::new(&model, &TokenAndPrevious, 0).is_err());

        let search = BeamSearch::new(&model, &TokenAndPrevious, 2).unwrap();
        assert!(
            search
                .best_sequences(0, &tokens(&["a"]), ExtraContext::default(), &AcceptAll)
                .is_err()
        );
    }

    #[test]
    fn test_ties_keep_generation_order() {
        let model = model();
        let search = BeamSearch::new(&model, &TokenAndPrevious, 2).unwrap();

        // "z" evaluates to an even split, so X (generated first) must lead
        let found = search
            .best_sequences(2, &tokens(&["z"]), ExtraContext::default(), &AcceptAll)
            .unwrap();
        assert_eq!(found[0].outcomes(), ["X"]);
        assert_eq!(found[1].outcomes(), ["Y"]);
    }
}
