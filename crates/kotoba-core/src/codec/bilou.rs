//! # BILOU Codec
//!
//! Spans of one token are `"{type}-unit"`; longer spans are labelled
//! `"{type}-start"`, `"{type}-continue"`..., `"{type}-last"`.

use std::collections::HashSet;

use crate::codec::bio::{CONTINUE, START};
use crate::codec::{OTHER, SequenceCodec, check_bounds, is_other, span_label, strip_kind};
use crate::error::{KotobaError, Result};
use crate::search::SequenceValidator;
use crate::types::Span;

/// Suffix of the label on the final token of a multi-token span.
pub const LAST: &str = "last";
/// Suffix of the label on a single-token span.
pub const UNIT: &str = "unit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BilouLabel<'a> {
    Start(&'a str),
    Continue(&'a str),
    Last(&'a str),
    Unit(&'a str),
    Other,
}

impl<'a> BilouLabel<'a> {
    fn parse(outcome: &'a str) -> Option<Self> {
        if is_other(outcome) {
            return Some(BilouLabel::Other);
        }
        strip_kind(outcome, START)
            .map(BilouLabel::Start)
            .or_else(|| strip_kind(outcome, CONTINUE).map(BilouLabel::Continue))
            .or_else(|| strip_kind(outcome, LAST).map(BilouLabel::Last))
            .or_else(|| strip_kind(outcome, UNIT).map(BilouLabel::Unit))
    }

    /// Type of the span this label leaves open.
    fn open_type(self) -> Option<&'a str> {
        match self {
            BilouLabel::Start(t) | BilouLabel::Continue(t) => Some(t),
            _ => None,
        }
    }
}

/// Span codec for the BILOU scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BilouCodec;

impl BilouCodec {
    /// Create a BILOU codec.
    pub fn new() -> Self {
        Self
    }
}

impl SequenceCodec for BilouCodec {
    fn name(&self) -> &'static str {
        "BILOU"
    }

    fn encode(&self, spans: &[Span], length: usize) -> Result<Vec<String>> {
        let mut outcomes = vec![OTHER.to_string(); length];
        for span in spans {
            check_bounds(span, length)?;
            if span.len() == 1 {
                outcomes[span.start] = span_label(span, UNIT);
                continue;
            }
            outcomes[span.start] = span_label(span, START);
            for outcome in &mut outcomes[span.start + 1..span.end - 1] {
                *outcome = span_label(span, CONTINUE);
            }
            outcomes[span.end - 1] = span_label(span, LAST);
        }
        Ok(outcomes)
    }

    fn decode(&self, outcomes: &[String]) -> Result<Vec<Span>> {
        let mut spans = Vec::new();
        let mut open: Option<(usize, &str)> = None;

        for (position, outcome) in outcomes.iter().enumerate() {
            let label = BilouLabel::parse(outcome).ok_or_else(|| KotobaError::MalformedOutcome {
                outcome: outcome.clone(),
                position,
            })?;

            match label {
                BilouLabel::Start(span_type) => {
                    if let Some((start, open_type)) = open.take() {
                        spans.push(Span::typed(start, position, open_type));
                    }
                    open = Some((position, span_type));
                }
                BilouLabel::Continue(span_type) => {
                    if open.is_none() {
                        open = Some((position, span_type));
                    }
                }
                BilouLabel::Last(span_type) => {
                    let (start, open_type) = open.take().unwrap_or((position, span_type));
                    spans.push(Span::typed(start, position + 1, open_type));
                }
                BilouLabel::Unit(span_type) => {
                    if let Some((start, open_type)) = open.take() {
                        spans.push(Span::typed(start, position, open_type));
                    }
                    spans.push(Span::typed(position, position + 1, span_type));
                }
                BilouLabel::Other => {
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
        Box::new(BilouSequenceValidator)
    }

    fn are_outcomes_compatible(&self, outcomes: &[String]) -> bool {
        let mut starts = HashSet::new();
        let mut continues = HashSet::new();
        let mut lasts = HashSet::new();
        let mut units = HashSet::new();
        let mut other = false;

        for outcome in outcomes {
            match BilouLabel::parse(outcome) {
                Some(BilouLabel::Start(t)) => {
                    starts.insert(t);
                }
                Some(BilouLabel::Continue(t)) => {
                    continues.insert(t);
                }
                Some(BilouLabel::Last(t)) => {
                    lasts.insert(t);
                }
                Some(BilouLabel::Unit(t)) => {
                    units.insert(t);
                }
                Some(BilouLabel::Other) => other = true,
                None => {}
            }
        }

        other
            && (!starts.is_empty() || !units.is_empty())
            && starts == lasts
            && continues.iter().all(|t| starts.contains(t))
    }
}

/// Enforces well-formed BILOU sequences: a span opened by `start` must be
/// closed by a `last` of the same type, and no span may be left open at the
/// final token.
///
/// Inside an open span "other" is refused. `{type}-last` is always accepted
/// there instead, and compatible outcome sets carry a `last` label for every
/// `start` label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BilouSequenceValidator;

impl SequenceValidator for BilouSequenceValidator {
    fn valid(&self, index: usize, tokens: &[String], history: &[String], outcome: &str) -> bool {
        let Some(next) = BilouLabel::parse(outcome) else {
            return false;
        };
        let open = history
            .last()
            .and_then(|prev| BilouLabel::parse(prev))
            .and_then(BilouLabel::open_type);
        let final_token = index + 1 == tokens.len();

        match next {
            BilouLabel::Continue(t) => open == Some(t) && !final_token,
            BilouLabel::Last(t) => open == Some(t),
            BilouLabel::Start(_) => open.is_none() && !final_token,
            BilouLabel::Unit(_) | BilouLabel::Other => open.is_none(),
        }
    }
}
