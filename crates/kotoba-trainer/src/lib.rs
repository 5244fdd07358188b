//! # Kotoba Trainer
//!
//! Training side of Kotoba: turns labelled samples into events, indexes
//! them, and fits maximum-entropy models with generalized iterative scaling.
//!
//! ## Quick Start
//!
//! ```rust
//! use kotoba_core::ClassificationModel;
//! use kotoba_trainer::{Event, TrainingParams, train_events};
//!
//! let events = vec![
//!     Event::new("NOUN", vec!["w=dog".into()]),
//!     Event::new("VERB", vec!["w=runs".into()]),
//! ];
//! let params = TrainingParams::new().with_cutoff(0).with_iterations(20);
//! let model = train_events(&events, &params).unwrap();
//!
//! let probs = model.eval(&["w=dog".to_string()]);
//! assert_eq!(model.best_outcome(&probs), Some("NOUN"));
//! ```
pub mod data;
pub mod error;
pub mod gis;
pub mod indexer;
pub mod params;

// Re-export primary API
pub use data::{Event, NameSample, TaggedSample, name_sample_events, sequence_events};
pub use error::{Result, TrainerError};
pub use gis::GisTrainer;
pub use indexer::{IndexedData, OnePassDataIndexer};
pub use params::{Algorithm, Smoothing, TrainingParams};

use kotoba_core::GisModel;

/// Index `events` with the configured cutoff and train a GIS model on them.
pub fn train_events(events: &[Event], params: &TrainingParams) -> Result<GisModel> {
    let trainer = GisTrainer::new(params.clone())?;
    let data = OnePassDataIndexer::new(params.cutoff).index(events)?;
    trainer.train(&data)
}
