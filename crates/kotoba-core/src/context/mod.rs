//! # Context Generation
//!
//! The contract between decoders and feature generators. Generators are
//! stateless; document-scoped memory lives in an explicit [`AdaptiveData`]
//! value owned by the caller and handed in on every call.

pub mod window;

use std::collections::HashMap;

use crate::error::{KotobaError, Result};

pub use window::WindowContextGenerator;

/// Document-scoped memory of the outcomes already assigned to tokens.
///
/// Updated after each finished sentence and cleared at document boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdaptiveData {
    previous: HashMap<String, String>,
}

impl AdaptiveData {
    /// Empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the final outcomes of a decoded or gold sentence.
    pub fn update(&mut self, tokens: &[String], outcomes: &[String]) -> Result<()> {
        if tokens.len() != outcomes.len() {
            return Err(KotobaError::LengthMismatch {
                what: "adaptive outcomes",
                expected: tokens.len(),
                actual: outcomes.len(),
            });
        }
        for (token, outcome) in tokens.iter().zip(outcomes) {
            self.previous.insert(token.clone(), outcome.clone());
        }
        Ok(())
    }

    /// Outcome most recently assigned to `token` in this document.
    pub fn previous_outcome(&self, token: &str) -> Option<&str> {
        self.previous.get(token).map(String::as_str)
    }

    /// Forget everything; call at document boundaries.
    pub fn clear(&mut self) {
        self.previous.clear();
    }

    /// True when nothing has been remembered yet.
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

/// Side information handed to a context generator next to the tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtraContext<'a> {
    /// Caller-supplied features, one list per token (may be empty).
    pub additional: &'a [Vec<String>],
    /// Document-scoped memory, when the caller keeps one.
    pub adaptive: Option<&'a AdaptiveData>,
}

impl<'a> ExtraContext<'a> {
    /// Extra context carrying only adaptive memory.
    pub fn adaptive(adaptive: &'a AdaptiveData) -> Self {
        Self {
            additional: &[],
            adaptive: Some(adaptive),
        }
    }

    /// Additional features attached to token `index`.
    pub fn additional_at(&self, index: usize) -> &'a [String] {
        match self.additional.get(index) {
            Some(features) => features,
            None => &[],
        }
    }
}

/// Produces the predicate strings describing one sequence position.
///
/// `history` holds the outcomes already chosen for positions `< index` and
/// nothing else; a generator never sees later decisions.
pub trait ContextGenerator: Send + Sync {
    /// Ordered feature strings for position `index`.
    fn context(
        &self,
        index: usize,
        tokens: &[String],
        history: &[String],
        extra: ExtraContext<'_>,
    ) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn adaptive_data_lifecycle() {
        let mut data = AdaptiveData::new();
        assert!(data.is_empty());

        data.update(&strings(&["Alice", "runs"]), &strings(&["PER-start", "other"]))
            .unwrap();
        assert_eq!(data.previous_outcome("Alice"), Some("PER-start"));

        data.update(&strings(&["Alice"]), &strings(&["other"])).unwrap();
        assert_eq!(data.previous_outcome("Alice"), Some("other"));

        data.clear();
        assert!(data.is_empty());
        assert_eq!(data.previous_outcome("Alice"), None);
    }

    #[test]
    fn adaptive_update_rejects_mismatched_lengths() {
        let mut data = AdaptiveData::new();
        assert!(data.update(&strings(&["a", "b"]), &strings(&["x"])).is_err());
        assert!(data.is_empty());
    }

    #[test]
    fn extra_context_additional_lookup() {
        let additional = vec![strings(&["dict=yes"])];
        let extra = ExtraContext {
            additional: &additional,
            adaptive: None,
        };
        assert_eq!(extra.additional_at(0), ["dict=yes"]);
        assert!(extra.additional_at(5).is_empty());
    }
}
