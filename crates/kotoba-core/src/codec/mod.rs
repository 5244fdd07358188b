//! # Span Codecs
//!
//! Convert typed token spans to per-token outcome labels and back. Each codec
//! also supplies the sequence validator that keeps beam search from emitting
//! label sequences it could not decode.

pub mod bilou;
pub mod bio;

use crate::error::Result;
use crate::search::SequenceValidator;
use crate::types::Span;

pub use bilou::{BilouCodec, BilouSequenceValidator};
pub use bio::{BioCodec, BioSequenceValidator};

/// Outcome for tokens outside every span.
pub const OTHER: &str = "other";

/// Type used when encoding a span without one.
pub const DEFAULT_TYPE: &str = "default";

/// A labelling scheme for spans.
pub trait SequenceCodec: Send + Sync {
    /// Short scheme name used in error messages.
    fn name(&self) -> &'static str;

    /// One outcome per token for the given non-overlapping spans.
    fn encode(&self, spans: &[Span], length: usize) -> Result<Vec<String>>;

    /// Spans described by a label sequence.
    fn decode(&self, outcomes: &[String]) -> Result<Vec<Span>>;

    /// Validator accepting only label sequences this codec can decode.
    fn create_sequence_validator(&self) -> Box<dyn SequenceValidator>;

    /// True when a model's outcome inventory can be decoded by this codec.
    fn are_outcomes_compatible(&self, outcomes: &[String]) -> bool;
}

/// Split `"{type}-{suffix}"` into its type, if the label ends with `suffix`.
pub(crate) fn strip_kind<'a>(outcome: &'a str, suffix: &str) -> Option<&'a str> {
    outcome
        .strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix('-'))
}

pub(crate) fn is_other(outcome: &str) -> bool {
    outcome == OTHER
}

pub(crate) fn span_label(span: &Span, suffix: &str) -> String {
    format!("{}-{}", span.span_type().unwrap_or(DEFAULT_TYPE), suffix)
}

pub(crate) fn check_bounds(span: &Span, length: usize) -> Result<()> {
    if span.start >= span.end || span.end > length {
        return Err(crate::error::KotobaError::InvalidArgument(format!(
            "span {} does not fit a sequence of {} tokens",
            span, length
        )));
    }
    Ok(())
}
