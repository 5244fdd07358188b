//! # Part-of-Speech Tagger
//!
//! Unconstrained sequence tagging: every tag may follow every other tag.

use crate::context::{ContextGenerator, ExtraContext};
use crate::error::Result;
use crate::model::ClassificationModel;
use crate::search::{AcceptAll, BeamSearch, DEFAULT_BEAM_SIZE, SequenceValidator};
use crate::types::Sequence;

/// Beam-search tagger assigning one tag per token.
#[derive(Debug, Clone)]
pub struct PosTagger<M, G> {
    model: M,
    generator: G,
    beam_size: usize,
}

impl<M: ClassificationModel, G: ContextGenerator> PosTagger<M, G> {
    /// Create a tagger with the default beam size.
    pub fn new(model: M, generator: G) -> Self {
        Self {
            model,
            generator,
            beam_size: DEFAULT_BEAM_SIZE,
        }
    }

    /// Set the beam size.
    pub fn with_beam_size(mut self, beam_size: usize) -> Self {
        self.beam_size = beam_size;
        self
    }

    /// Tag a sentence.
    pub fn tag(&self, tokens: &[String]) -> Result<Vec<String>> {
        Ok(self.tag_sequence(tokens)?.into_outcomes())
    }

    /// Tag a sentence, keeping the per-token probabilities.
    pub fn tag_sequence(&self, tokens: &[String]) -> Result<Sequence> {
        self.search()?
            .best_sequence(tokens, ExtraContext::default(), self.validator())
    }

    /// Tag a sentence with caller-supplied features per token.
    pub fn tag_with_context(
        &self,
        tokens: &[String],
        additional: &[Vec<String>],
    ) -> Result<Sequence> {
        let extra = ExtraContext {
            additional,
            adaptive: None,
        };
        self.search()?.best_sequence(tokens, extra, self.validator())
    }

    /// The `k` most probable tag sequences, best first.
    pub fn top_k_sequences(&self, tokens: &[String], k: usize) -> Result<Vec<Sequence>> {
        self.search()?
            .best_sequences(k, tokens, ExtraContext::default(), self.validator())
    }

    /// Every tag the model can assign.
    pub fn all_tags(&self) -> &[String] {
        self.model.outcomes()
    }

    /// The underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    fn search(&self) -> Result<BeamSearch<'_, M, G>> {
        BeamSearch::new(&self.model, &self.generator, self.beam_size)
    }

    fn validator(&self) -> &dyn SequenceValidator {
        &AcceptAll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WindowContextGenerator;
    use crate::model::{EvalParameters, GisModel, PredicateParams};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// DET=0, NOUN=1, VERB=2
    fn model() -> GisModel {
        let entries = vec![
            ("w=the", vec![(0, 3.0)]),
            ("w=dog", vec![(1, 3.0)]),
            ("w=barks", vec![(1, 1.0), (2, 1.5)]),
            ("po=NOUN", vec![(2, 1.0)]),
            ("po=DET", vec![(1, 2.0)]),
        ];
        let mut predicates = Vec::new();
        let mut params = Vec::new();
        for (name, pairs) in entries {
            predicates.push(name.to_string());
            let (outcomes, weights) = pairs.into_iter().unzip();
            params.push(PredicateParams::new(outcomes, weights).unwrap());
        }
        GisModel::new(
            EvalParameters::new(params, 3),
            predicates,
            strings(&["DET", "NOUN", "VERB"]),
        )
        .unwrap()
    }

    #[test]
    fn test_tag_sentence() {
        let tagger = PosTagger::new(model(), WindowContextGenerator::new());
        let tags = tagger.tag(&strings(&["The", "dog", "barks"])).unwrap();
        assert_eq!(tags, strings(&["DET", "NOUN", "VERB"]));
    }

    #[test]
    fn test_tag_sequence_probabilities() {
        let tagger = PosTagger::new(model(), WindowContextGenerator::new()).with_beam_size(5);
        let sequence = tagger.tag_sequence(&strings(&["the", "dog"])).unwrap();
        assert_eq!(sequence.probs().len(), 2);
        assert!(sequence.probs().iter().all(|&p| p > 0.0 && p <= 1.0));
    }

    #[test]
    fn test_top_k_sequences_are_distinct_and_sorted() {
        let tagger = PosTagger::new(model(), WindowContextGenerator::new());
        let tokens = strings(&["the", "dog", "barks"]);
        let top = tagger.top_k_sequences(&tokens, 3).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].outcomes(), ["DET", "NOUN", "VERB"]);
        assert_ne!(top[0].outcomes(), top[1].outcomes());
        assert!(top[0].score() >= top[1].score());
        assert!(top[1].score() >= top[2].score());
    }

    #[test]
    fn test_zero_beam_is_rejected() {
        let tagger = PosTagger::new(model(), WindowContextGenerator::new()).with_beam_size(0);
        assert!(tagger.tag(&strings(&["dog"])).is_err());
    }

    #[test]
    fn test_all_tags() {
        let tagger = PosTagger::new(model(), WindowContextGenerator::new());
        assert_eq!(tagger.all_tags(), ["DET", "NOUN", "VERB"]);
    }
}
