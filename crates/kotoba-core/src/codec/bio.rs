//! # BIO Codec
//!
//! Begin/continue/other labels: the first token of a span is `"{type}-start"`,
//! the rest are `"{type}-continue"`, every other token is `"other"`.

use std::collections::HashSet;

use crate::codec::{OTHER, SequenceCodec, check_bounds, is_other, span_label, strip_kind};
use crate::error::{KotobaError, Result};
use crate::search::SequenceValidator;
use crate::types::Span;

/// Suffix of the label on the first token of a span.
pub const START: &str = "start";
/// Suffix of the label on the remaining tokens of a span.
pub const CONTINUE: &str = "continue";

/// A parsed BIO outcome label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BioLabel<'a> {
    Start(&'a str),
    Continue(&'a str),
    Other,
}

impl<'a> BioLabel<'a> {
    /// Parse an outcome label; `None` when it is not BIO-shaped.
    pub fn parse(outcome: &'a str) -> Option<Self> {
        if is_other(outcome) {
            Some(BioLabel::Other)
        } else if let Some(span_type) = strip_kind(outcome, START) {
            Some(BioLabel::Start(span_type))
        } else {
            strip_kind(outcome, CONTINUE).map(BioLabel::Continue)
        }
    }

    /// Check if this is a "start" label.
    pub fn is_start(&self) -> bool {
        matches!(self, BioLabel::Start(_))
    }

    /// Check if this is a "continue" label.
    pub fn is_continue(&self) -> bool {
        matches!(self, BioLabel::Continue(_))
    }

    /// Get the span type carried by this label.
    pub fn span_type(&self) -> Option<&'a str> {
        match self {
            BioLabel::Start(t) | BioLabel::Continue(t) => Some(t),
            BioLabel::Other => None,
        }
    }

    /// Check if `to` may follow `from` (`None` meaning sentence start).
    pub fn is_valid_transition(from: Option<BioLabel<'_>>, to: BioLabel<'_>) -> bool {
        match to {
            BioLabel::Continue(t) => match from {
                Some(BioLabel::Start(p)) | Some(BioLabel::Continue(p)) => p == t,
                _ => false,
            },
            BioLabel::Start(_) | BioLabel::Other => true,
        }
    }
}

/// Span codec for the BIO scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BioCodec;

impl BioCodec {
    /// Create a BIO codec.
    pub fn new() -> Self {
        Self
    }
}

impl SequenceCodec for BioCodec {
    fn name(&self) -> &'static str {
        "BIO"
    }

    fn encode(&self, spans: &[Span], length: usize) -> Result<Vec<String>> {
        let mut outcomes = vec![OTHER.to_string(); length];
        for span in spans {
            check_bounds(span, length)?;
            outcomes[span.start] = span_label(span, START);
            for outcome in &mut outcomes[span.start + 1..span.end] {
                *outcome = span_label(span, CONTINUE);
            }
        }
        Ok(outcomes)
    }

    fn decode(&self, outcomes: &[String]) -> Result<Vec<Span>> {
        let mut spans = Vec::new();
        let mut open: Option<(usize, &str)> = None;

        for (position, outcome) in outcomes.iter().enumerate() {
            let label = BioLabel::parse(outcome).ok_or_else(|| KotobaError::MalformedOutcome {
                outcome: outcome.clone(),
                position,
            })?;

            match label {
                BioLabel::Start(span_type) => {
                    if let Some((start, open_type)) = open.take() {
                        spans.push(Span::typed(start, position, open_type));
                    }
                    open = Some((position, span_type));
                }
                // a continue without an open span starts one
                BioLabel::Continue(span_type) => {
                    if open.is_none() {
                        open = Some((position, span_type));
                    }
                }
                BioLabel::Other => {
                    if let Some((start, open_type)) = open.take() {
                        spans.push(Span::typed(start, position, open_type));
                    }
                }
            }
        }

        if let Some((start, open_type)) = open {
            spans.push(Span::typed(start, outcomes.len(), open_type));
        }
        Ok(spans)
    }

    fn create_sequence_validator(&self) -> Box<dyn SequenceValidator> {
        Box::new(BioSequenceValidator)
    }

    fn are_outcomes_compatible(&self, outcomes: &[String]) -> bool {
        let mut starts = HashSet::new();
        let mut continues = HashSet::new();
        for outcome in outcomes {
            match BioLabel::parse(outcome) {
                Some(BioLabel::Start(t)) => {
                    starts.insert(t);
                }
                Some(BioLabel::Continue(t)) => {
                    continues.insert(t);
                }
                _ => {}
            }
        }
        !starts.is_empty() && continues.iter().all(|t| starts.contains(t))
    }
}

/// Accepts `start` and `other` anywhere and `continue` only inside an open
/// span of the same type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BioSequenceValidator;

impl SequenceValidator for BioSequenceValidator {
    fn valid(&self, _index: usize, _tokens: &[String], history: &[String], outcome: &str) -> bool {
        let Some(next) = BioLabel::parse(outcome) else {
            return false;
        };
        let previous = history.last().and_then(|prev| BioLabel::parse(prev));
        BioLabel::is_valid_transition(previous, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_single_span() {
        let encoded = BioCodec.encode(&[Span::typed(0, 2, "PER")], 4).unwrap();
        assert_eq!(
            encoded,
            strings(&["PER-start", "PER-continue", "other", "other"])
        );
        assert_eq!(BioCodec.decode(&encoded).unwrap(), vec![Span::typed(0, 2, "PER")]);
    }

    #[test]
    fn test_encode_untyped_span_uses_default() {
        let encoded = BioCodec.encode(&[Span::new(1, 2)], 3).unwrap();
        assert_eq!(encoded, strings(&["other", "default-start", "other"]));
        assert_eq!(
            BioCodec.decode(&encoded).unwrap(),
            vec![Span::typed(1, 2, "default")]
        );
    }

    #[test]
    fn test_encode_rejects_out_of_range_span() {
        assert!(BioCodec.encode(&[Span::new(2, 5)], 4).is_err());
    }

    #[test]
    fn test_decode_adjacent_spans() {
        let outcomes = strings(&["PER-start", "PER-continue", "LOC-start", "other", "ORG-start"]);
        assert_eq!(
            BioCodec.decode(&outcomes).unwrap(),
            vec![
                Span::typed(0, 2, "PER"),
                Span::typed(2, 3, "LOC"),
                Span::typed(4, 5, "ORG"),
            ]
        );
    }

    #[test]
    fn test_decode_lenient_continue() {
        let outcomes = strings(&["other", "LOC-continue", "LOC-continue", "other"]);
        assert_eq!(
            BioCodec.decode(&outcomes).unwrap(),
            vec![Span::typed(1, 3, "LOC")]
        );
    }

    #[test]
    fn test_decode_rejects_malformed_label() {
        let err = BioCodec
            .decode(&strings(&["other", "B-PER"]))
            .unwrap_err();
        assert!(matches!(
            err,
            KotobaError::MalformedOutcome { position: 1, .. }
        ));
    }

    #[test]
    fn test_outcome_compatibility() {
        assert!(BioCodec.are_outcomes_compatible(&strings(&[
            "other",
            "X-start",
            "X-continue",
            "Y-start"
        ])));
        assert!(!BioCodec.are_outcomes_compatible(&strings(&["X-continue"])));
        assert!(!BioCodec.are_outcomes_compatible(&strings(&["other"])));
        assert!(!BioCodec.are_outcomes_compatible(&strings(&[
            "X-start",
            "Y-continue"
        ])));
    }

    #[test]
    fn test_valid_transitions() {
        let validator = BioCodec.create_sequence_validator();
        let tokens = strings(&["a", "b", "c"]);

        assert!(validator.valid(0, &tokens, &[], "PER-start"));
        assert!(validator.valid(0, &tokens, &[], "other"));
        assert!(validator.valid(1, &tokens, &strings(&["PER-start"]), "PER-continue"));
        assert!(validator.valid(
            2,
            &tokens,
            &strings(&["PER-start", "PER-continue"]),
            "PER-continue"
        ));
        assert!(validator.valid(1, &tokens, &strings(&["PER-start"]), "other"));
    }

    #[test]
    fn test_invalid_transitions() {
        let validator = BioSequenceValidator;
        let tokens = strings(&["a", "b"]);

        assert!(!validator.valid(0, &tokens, &[], "PER-continue"));
        assert!(!validator.valid(1, &tokens, &strings(&["other"]), "PER-continue"));
        assert!(!validator.valid(1, &tokens, &strings(&["LOC-start"]), "PER-continue"));
        assert!(!validator.valid(0, &tokens, &[], "I-PER"));
    }

    #[test]
    fn test_label_accessors() {
        let label = BioLabel::parse("ORG-continue").unwrap();
        assert!(label.is_continue());
        assert!(!label.is_start());
        assert_eq!(label.span_type(), Some("ORG"));
        assert_eq!(BioLabel::parse("other"), Some(BioLabel::Other));
        assert_eq!(BioLabel::parse("ORG"), None);
    }
}
