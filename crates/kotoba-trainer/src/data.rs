//! Training events and the labelled samples they are generated from.

use serde::{Deserialize, Serialize};

use kotoba_core::codec::SequenceCodec;
use kotoba_core::{AdaptiveData, ContextGenerator, ExtraContext, KotobaError, Span};

use crate::error::{Result, TrainerError};

/// One training instance: an outcome and the predicates active for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub outcome: String,
    pub context: Vec<String>,
    /// One value per predicate; absent means every predicate has value 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
}

impl Event {
    pub fn new(outcome: impl Into<String>, context: Vec<String>) -> Self {
        Self {
            outcome: outcome.into(),
            context,
            values: None,
        }
    }

    /// An event with real-valued predicates.
    pub fn with_values(
        outcome: impl Into<String>,
        context: Vec<String>,
        values: Vec<f32>,
    ) -> Result<Self> {
        check_values(context.len(), &values)?;
        Ok(Self {
            outcome: outcome.into(),
            context,
            values: Some(values),
        })
    }

    /// Check that any values are parallel to the context, finite and not
    /// negative.
    pub fn validate(&self) -> Result<()> {
        match &self.values {
            Some(values) => check_values(self.context.len(), values),
            None => Ok(()),
        }
    }
}

pub(crate) fn check_values(len: usize, values: &[f32]) -> Result<()> {
    if values.len() != len {
        return Err(KotobaError::LengthMismatch {
            what: "event values",
            expected: len,
            actual: values.len(),
        }
        .into());
    }
    if let Some((j, v)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(TrainerError::InconsistentData(format!(
            "predicate {j} has value {v}, values must be finite and not negative"
        )));
    }
    Ok(())
}

/// A sentence with one gold tag per token.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaggedSample {
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
    /// Extra features per token; empty when unused.
    #[serde(default)]
    pub additional: Vec<Vec<String>>,
    /// First sentence of a new document.
    #[serde(default)]
    pub clear_adaptive: bool,
}

impl TaggedSample {
    pub fn new(tokens: Vec<String>, tags: Vec<String>) -> Self {
        Self {
            tokens,
            tags,
            additional: Vec::new(),
            clear_adaptive: false,
        }
    }

    /// Mark the sample as the start of a new document.
    pub fn starting_document(mut self) -> Self {
        self.clear_adaptive = true;
        self
    }
}

/// A sentence with gold spans.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NameSample {
    pub tokens: Vec<String>,
    pub spans: Vec<Span>,
    #[serde(default)]
    pub additional: Vec<Vec<String>>,
    #[serde(default)]
    pub clear_adaptive: bool,
}

impl NameSample {
    pub fn new(tokens: Vec<String>, spans: Vec<Span>) -> Self {
        Self {
            tokens,
            spans,
            additional: Vec::new(),
            clear_adaptive: false,
        }
    }

    /// Mark the sample as the start of a new document.
    pub fn starting_document(mut self) -> Self {
        self.clear_adaptive = true;
        self
    }

    /// Convert to per-token tags with `codec`.
    pub fn to_tagged(&self, codec: &dyn SequenceCodec) -> Result<TaggedSample> {
        Ok(TaggedSample {
            tokens: self.tokens.clone(),
            tags: codec.encode(&self.spans, self.tokens.len())?,
            additional: self.additional.clone(),
            clear_adaptive: self.clear_adaptive,
        })
    }
}

/// One event per token, generated with the gold history.
///
/// Adaptive data is filled with each sample's gold tags after the sample is
/// processed and cleared whenever a sample starts a new document, mirroring
/// what a decoder sees at tagging time.
pub fn sequence_events<G>(samples: &[TaggedSample], generator: &G) -> Result<Vec<Event>>
where
    G: ContextGenerator + ?Sized,
{
    let mut adaptive = AdaptiveData::new();
    let mut events = Vec::new();

    for sample in samples {
        if sample.tokens.len() != sample.tags.len() {
            return Err(KotobaError::LengthMismatch {
                what: "sample tags",
                expected: sample.tokens.len(),
                actual: sample.tags.len(),
            }
            .into());
        }
        if sample.clear_adaptive {
            adaptive.clear();
        }

        let extra = ExtraContext {
            additional: &sample.additional,
            adaptive: Some(&adaptive),
        };
        for (index, tag) in sample.tags.iter().enumerate() {
            let context = generator.context(index, &sample.tokens, &sample.tags[..index], extra);
            events.push(Event::new(tag.clone(), context));
        }

        adaptive.update(&sample.tokens, &sample.tags)?;
    }

    Ok(events)
}

/// Events for span-annotated samples, encoded with `codec` first.
pub fn name_sample_events<G>(
    samples: &[NameSample],
    codec: &dyn SequenceCodec,
    generator: &G,
) -> Result<Vec<Event>>
where
    G: ContextGenerator + ?Sized,
{
    let tagged = samples
        .iter()
        .map(|sample| sample.to_tagged(codec))
        .collect::<Result<Vec<_>>>()?;
    sequence_events(&tagged, generator)
}
