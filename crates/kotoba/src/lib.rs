//! # Kotoba
//!
//! Statistical sequence labeling with maximum-entropy models: train a
//! part-of-speech tagger or a name finder from labelled sentences, then
//! decode new sentences with beam search.
//!
//! ## Quick Start
//!
//! ```rust
//! use kotoba::{TaggedSample, TrainingParams, WindowContextGenerator, train_pos_tagger};
//!
//! let words = |s: &str| s.split(' ').map(str::to_string).collect::<Vec<_>>();
//! let samples = vec![
//!     TaggedSample::new(words("the dog runs"), words("DET NOUN VERB")),
//!     TaggedSample::new(words("a cat sleeps"), words("DET NOUN VERB")),
//! ];
//! let params = TrainingParams::new().with_cutoff(0).with_iterations(50);
//! let tagger = train_pos_tagger(&samples, WindowContextGenerator::new(), &params).unwrap();
//!
//! assert_eq!(tagger.tag(&words("the cat runs")).unwrap(), words("DET NOUN VERB"));
//! ```

pub use kotoba_core::codec::{self, BilouCodec, BioCodec, SequenceCodec};
pub use kotoba_core::context::{
    self, AdaptiveData, ContextGenerator, ExtraContext, WindowContextGenerator,
};
pub use kotoba_core::model::{
    self, ClassificationModel, EvalParameters, GisModel, PredicateParams, Prior, UniformPrior,
};
pub use kotoba_core::search::{self, AcceptAll, BeamSearch, DEFAULT_BEAM_SIZE, SequenceValidator};
pub use kotoba_core::tagger::{Mention, NameFinder, PosTagger};
pub use kotoba_core::types::{Sequence, Span};
pub use kotoba_core::KotobaError;
pub use kotoba_trainer::{
    Algorithm, Event, GisTrainer, IndexedData, NameSample, OnePassDataIndexer, Smoothing,
    TaggedSample, TrainerError, TrainingParams, name_sample_events, sequence_events, train_events,
};

use tracing::info;

/// Result type alias for end-to-end training.
pub type Result<T> = std::result::Result<T, TrainerError>;

/// Train a part-of-speech tagger on gold-tagged sentences.
pub fn train_pos_tagger<G: ContextGenerator>(
    samples: &[TaggedSample],
    generator: G,
    params: &TrainingParams,
) -> Result<PosTagger<GisModel, G>> {
    info!("Training POS tagger on {} sentences", samples.len());
    let events = sequence_events(samples, &generator)?;
    let model = train_events(&events, params)?;
    Ok(PosTagger::new(model, generator))
}

/// Train a name finder on span-annotated sentences using `codec` to turn
/// spans into per-token labels.
pub fn train_name_finder<G: ContextGenerator>(
    samples: &[NameSample],
    generator: G,
    codec: Box<dyn SequenceCodec>,
    params: &TrainingParams,
) -> Result<NameFinder<GisModel, G>> {
    info!(
        "Training {} name finder on {} sentences",
        codec.name(),
        samples.len()
    );
    let events = name_sample_events(samples, codec.as_ref(), &generator)?;
    let model = train_events(&events, params)?;
    Ok(NameFinder::with_codec(model, generator, codec)?)
}
