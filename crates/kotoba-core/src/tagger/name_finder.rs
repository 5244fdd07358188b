//! # Name Finder
//!
//! Span tagging on top of beam search: the codec validator keeps decoded
//! label sequences well formed, and the finder remembers earlier decisions
//! within a document through [`AdaptiveData`].

use crate::codec::{BioCodec, SequenceCodec};
use crate::context::{AdaptiveData, ContextGenerator, ExtraContext};
use crate::error::{KotobaError, Result};
use crate::model::ClassificationModel;
use crate::search::{BeamSearch, DEFAULT_BEAM_SIZE, SequenceValidator};
use crate::types::{Sequence, Span};

/// A span found in a sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    /// Token interval and type.
    pub span: Span,
    /// The covered tokens joined by single spaces.
    pub text: String,
    /// Mean probability of the labels covering the span.
    pub probability: f64,
}

/// Finds typed spans (names, chunks) in token sequences.
pub struct NameFinder<M, G> {
    model: M,
    generator: G,
    codec: Box<dyn SequenceCodec>,
    validator: Box<dyn SequenceValidator>,
    beam_size: usize,
    adaptive: AdaptiveData,
}

impl<M: ClassificationModel, G: ContextGenerator> NameFinder<M, G> {
    /// Create a BIO name finder.
    pub fn new(model: M, generator: G) -> Result<Self> {
        Self::with_codec(model, generator, Box::new(BioCodec))
    }

    /// Create a name finder for another label scheme.
    ///
    /// Fails when the model's outcomes cannot be decoded by `codec`.
    pub fn with_codec(model: M, generator: G, codec: Box<dyn SequenceCodec>) -> Result<Self> {
        if !codec.are_outcomes_compatible(model.outcomes()) {
            return Err(KotobaError::IncompatibleOutcomes {
                codec: codec.name(),
                outcomes: model.outcomes().to_vec(),
            });
        }
        let validator = codec.create_sequence_validator();
        Ok(Self {
            model,
            generator,
            codec,
            validator,
            beam_size: DEFAULT_BEAM_SIZE,
            adaptive: AdaptiveData::new(),
        })
    }

    /// Set the beam size.
    pub fn with_beam_size(mut self, beam_size: usize) -> Self {
        self.beam_size = beam_size;
        self
    }

    /// Find spans in a sentence and remember the decision for the rest of
    /// the document.
    pub fn find(&mut self, tokens: &[String]) -> Result<Vec<Mention>> {
        self.find_with_context(tokens, &[])
    }

    /// Like [`NameFinder::find`] with caller-supplied features per token.
    pub fn find_with_context(
        &mut self,
        tokens: &[String],
        additional: &[Vec<String>],
    ) -> Result<Vec<Mention>> {
        let sequence = self.decode(tokens, additional)?;
        self.adaptive.update(tokens, sequence.outcomes())?;

        let spans = self.codec.decode(sequence.outcomes())?;
        Ok(spans
            .into_iter()
            .map(|span| {
                let probs = &sequence.probs()[span.start..span.end];
                let probability = probs.iter().sum::<f64>() / probs.len() as f64;
                let text = tokens[span.start..span.end].join(" ");
                Mention {
                    span,
                    text,
                    probability,
                }
            })
            .collect())
    }

    /// Best label sequence for a sentence without touching adaptive data.
    pub fn decode(&self, tokens: &[String], additional: &[Vec<String>]) -> Result<Sequence> {
        let extra = ExtraContext {
            additional,
            adaptive: Some(&self.adaptive),
        };
        BeamSearch::new(&self.model, &self.generator, self.beam_size)?.best_sequence(
            tokens,
            extra,
            self.validator.as_ref(),
        )
    }

    /// Record final outcomes of a sentence decoded elsewhere.
    pub fn update_adaptive_data(&mut self, tokens: &[String], outcomes: &[String]) -> Result<()> {
        self.adaptive.update(tokens, outcomes)
    }

    /// Forget document-scoped decisions; call at document boundaries.
    pub fn clear_adaptive_data(&mut self) {
        self.adaptive.clear();
    }

    /// Document-scoped memory gathered so far.
    pub fn adaptive_data(&self) -> &AdaptiveData {
        &self.adaptive
    }

    /// The label scheme in use.
    pub fn codec(&self) -> &dyn SequenceCodec {
        self.codec.as_ref()
    }
}
