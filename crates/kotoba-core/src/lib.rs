//! # Kotoba Core
//!
//! Decoding side of the Kotoba sequence labeler: maximum-entropy models,
//! beam search over label sequences, span codecs and the taggers built on
//! top of them.
//!
//! ## Quick Start
//!
//! ```rust
//! use kotoba_core::codec::{BioCodec, SequenceCodec};
//! use kotoba_core::Span;
//!
//! let outcomes = BioCodec.encode(&[Span::typed(0, 2, "PER")], 4).unwrap();
//! assert_eq!(outcomes, ["PER-start", "PER-continue", "other", "other"]);
//! assert_eq!(BioCodec.decode(&outcomes).unwrap(), vec![Span::typed(0, 2, "PER")]);
//! ```
pub mod codec;
pub mod context;
pub mod error;
pub mod model;
pub mod search;
pub mod tagger;
pub mod types;

// Re-export primary API
pub use codec::{BilouCodec, BioCodec, SequenceCodec};
pub use context::{AdaptiveData, ContextGenerator, ExtraContext, WindowContextGenerator};
pub use error::{KotobaError, Result};
pub use model::{ClassificationModel, EvalParameters, GisModel, PredicateParams, Prior, UniformPrior};
pub use search::{AcceptAll, BeamSearch, DEFAULT_BEAM_SIZE, SequenceValidator};
pub use tagger::{Mention, NameFinder, PosTagger};
pub use types::{Sequence, Span};
