//! Turns string events into the dense integer arrays the trainer works on.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, info};

use crate::data::{Event, check_values};
use crate::error::{Result, TrainerError};

/// Training data after indexing.
///
/// Every array is indexed by unique event id except `predicate_counts`,
/// which is indexed by predicate id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexedData {
    /// Predicate ids per unique event.
    pub contexts: Vec<Vec<usize>>,
    /// Predicate values parallel to `contexts`; `None` means all ones.
    pub values: Option<Vec<Vec<f32>>>,
    /// Gold outcome id per unique event.
    pub outcomes: Vec<usize>,
    /// How often each unique event occurred.
    pub counts: Vec<u32>,
    /// Occurrences of each predicate in the raw events.
    pub predicate_counts: Vec<u32>,
    /// Outcome labels by id.
    pub outcome_labels: Vec<String>,
    /// Predicate labels by id.
    pub predicate_labels: Vec<String>,
}

impl IndexedData {
    pub fn num_events(&self) -> usize {
        self.contexts.len()
    }

    pub fn num_outcomes(&self) -> usize {
        self.outcome_labels.len()
    }

    pub fn num_predicates(&self) -> usize {
        self.predicate_labels.len()
    }

    /// Total number of raw events, duplicates included.
    pub fn total_events(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Values of event `index`, if the data is real-valued.
    pub fn values_at(&self, index: usize) -> Option<&[f32]> {
        self.values.as_ref().map(|values| values[index].as_slice())
    }

    /// Sum of the predicate values of event `index`, or its predicate count
    /// when the data is not real-valued.
    pub fn feature_mass(&self, index: usize) -> f64 {
        match self.values_at(index) {
            Some(values) => values.iter().map(|&v| f64::from(v)).sum(),
            None => self.contexts[index].len() as f64,
        }
    }

    /// Check that the arrays agree in length and every id is in range.
    pub fn validate(&self) -> Result<()> {
        let events = self.contexts.len();
        if self.outcomes.len() != events || self.counts.len() != events {
            return Err(inconsistent(format!(
                "{} contexts, {} outcomes, {} counts",
                events,
                self.outcomes.len(),
                self.counts.len()
            )));
        }
        if self.predicate_counts.len() != self.predicate_labels.len() {
            return Err(inconsistent(format!(
                "{} predicate counts for {} predicates",
                self.predicate_counts.len(),
                self.predicate_labels.len()
            )));
        }
        if let Some(values) = &self.values {
            if values.len() != events {
                return Err(inconsistent(format!(
                    "{} value rows for {} events",
                    values.len(),
                    events
                )));
            }
            if let Some(i) = (0..events).find(|&i| values[i].len() != self.contexts[i].len()) {
                return Err(inconsistent(format!(
                    "event {} has {} predicates but {} values",
                    i,
                    self.contexts[i].len(),
                    values[i].len()
                )));
            }
            for (i, row) in values.iter().enumerate() {
                if let Some(v) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
                    return Err(inconsistent(format!("event {i} has value {v}")));
                }
            }
        }

        let num_predicates = self.num_predicates();
        for (i, context) in self.contexts.iter().enumerate() {
            if let Some(&pid) = context.iter().find(|&&pid| pid >= num_predicates) {
                return Err(inconsistent(format!(
                    "event {i} references predicate {pid} of {num_predicates}"
                )));
            }
        }
        if let Some((i, &oid)) = self
            .outcomes
            .iter()
            .enumerate()
            .find(|&(_, &oid)| oid >= self.num_outcomes())
        {
            return Err(inconsistent(format!(
                "event {i} has outcome {oid} of {}",
                self.num_outcomes()
            )));
        }
        if let Some(i) = self.counts.iter().position(|&c| c == 0) {
            return Err(inconsistent(format!("event {i} has a zero count")));
        }
        Ok(())
    }
}

fn inconsistent(message: String) -> TrainerError {
    TrainerError::InconsistentData(message)
}

/// Indexes events in a single pass over an in-memory slice.
///
/// Predicates seen fewer than `cutoff` times are removed from every event,
/// events left without predicates are dropped, and identical events are
/// merged into one entry with a repetition count. Ids are assigned in order
/// of first appearance, so the result is deterministic for a given input.
#[derive(Debug, Clone, Copy)]
pub struct OnePassDataIndexer {
    cutoff: u32,
}

impl OnePassDataIndexer {
    pub fn new(cutoff: u32) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> u32 {
        self.cutoff
    }

    pub fn index(&self, events: &[Event]) -> Result<IndexedData> {
        info!(
            "Indexing {} events with predicate cutoff {}",
            events.len(),
            self.cutoff
        );

        let mut occurrences: HashMap<&str, u32> = HashMap::new();
        for event in events {
            if let Some(values) = &event.values {
                check_values(event.context.len(), values)?;
            }
            for predicate in &event.context {
                *occurrences.entry(predicate.as_str()).or_default() += 1;
            }
        }

        let mut predicate_ids: HashMap<&str, usize> = HashMap::new();
        let mut predicate_labels = Vec::new();
        let mut predicate_counts = Vec::new();
        let mut outcome_ids: HashMap<&str, usize> = HashMap::new();
        let mut outcome_labels = Vec::new();
        let real_valued = events.iter().any(|e| e.values.is_some());

        let mut indexed = Vec::with_capacity(events.len());
        let mut dropped = 0usize;

        for event in events {
            let mut context = Vec::with_capacity(event.context.len());
            let mut values = Vec::new();

            for (j, predicate) in event.context.iter().enumerate() {
                let count = occurrences.get(predicate.as_str()).copied().unwrap_or(0);
                if count < self.cutoff {
                    continue;
                }
                let pid = *predicate_ids.entry(predicate.as_str()).or_insert_with(|| {
                    predicate_labels.push(predicate.clone());
                    predicate_counts.push(count);
                    predicate_labels.len() - 1
                });
                context.push(pid);
                if real_valued {
                    values.push(event.values.as_ref().map_or(1.0, |v| v[j]));
                }
            }

            if context.is_empty() {
                debug!("Dropped event {}: no predicate passed the cutoff", event.outcome);
                dropped += 1;
                continue;
            }

            let oid = *outcome_ids.entry(event.outcome.as_str()).or_insert_with(|| {
                outcome_labels.push(event.outcome.clone());
                outcome_labels.len() - 1
            });
            indexed.push(IndexedEvent {
                outcome: oid,
                context,
                values,
            });
        }

        if indexed.is_empty() {
            return Err(TrainerError::EmptyTrainingData);
        }

        indexed.sort_by(IndexedEvent::compare);
        let mut data = IndexedData {
            values: real_valued.then(Vec::new),
            predicate_counts,
            outcome_labels,
            predicate_labels,
            ..IndexedData::default()
        };
        for event in indexed {
            let duplicate = data.contexts.last().is_some_and(|last| {
                let i = data.contexts.len() - 1;
                data.outcomes[i] == event.outcome
                    && *last == event.context
                    && data.values_at(i).is_none_or(|v| v == event.values.as_slice())
            });
            if duplicate {
                if let Some(count) = data.counts.last_mut() {
                    *count += 1;
                }
                continue;
            }
            data.outcomes.push(event.outcome);
            data.contexts.push(event.context);
            data.counts.push(1);
            if let Some(values) = data.values.as_mut() {
                values.push(event.values);
            }
        }

        info!(
            "Indexed {} unique events ({} dropped), {} predicates, {} outcomes",
            data.num_events(),
            dropped,
            data.num_predicates(),
            data.num_outcomes()
        );
        Ok(data)
    }
}

struct IndexedEvent {
    outcome: usize,
    context: Vec<usize>,
    values: Vec<f32>,
}

impl IndexedEvent {
    fn compare(a: &Self, b: &Self) -> Ordering {
        a.outcome
            .cmp(&b.outcome)
            .then_with(|| a.context.cmp(&b.context))
            .then_with(|| {
                a.values
                    .iter()
                    .zip(&b.values)
                    .map(|(x, y)| x.total_cmp(y))
                    .find(|o| o.is_ne())
                    .unwrap_or_else(|| a.values.len().cmp(&b.values.len()))
            })
    }
}
