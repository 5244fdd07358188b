use serde::{Deserialize, Serialize};

/// A (possibly partial) label sequence produced by beam search.
///
/// `outcomes` and `probs` always have one entry per processed position, and
/// `score` is the sum of the log probabilities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sequence {
    outcomes: Vec<String>,
    probs: Vec<f64>,
    score: f64,
}

impl Sequence {
    /// The empty sequence every search starts from.
    pub fn new() -> Self {
        Self::default()
    }

    /// Successor of `self` with `outcome` appended at probability `prob`.
    pub fn extend(&self, outcome: &str, prob: f64) -> Self {
        let mut outcomes = Vec::with_capacity(self.outcomes.len() + 1);
        outcomes.extend_from_slice(&self.outcomes);
        outcomes.push(outcome.to_string());

        let mut probs = Vec::with_capacity(self.probs.len() + 1);
        probs.extend_from_slice(&self.probs);
        probs.push(prob);

        Self {
            outcomes,
            probs,
            score: self.score + prob.ln(),
        }
    }

    /// Outcomes assigned so far.
    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    /// Probability of each assigned outcome.
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Cumulative log probability.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Number of positions processed.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True before the first position has been processed.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Consume the sequence, keeping only its outcomes.
    pub fn into_outcomes(self) -> Vec<String> {
        self.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_extend_accumulates_log_score() {
        let root = Sequence::new();
        assert!(root.is_empty());
        assert_eq!(root.score(), 0.0);

        let one = root.extend("DET", 0.5);
        let two = one.extend("NOUN", 0.25);

        assert_eq!(two.outcomes(), ["DET", "NOUN"]);
        assert_eq!(two.probs(), [0.5, 0.25]);
        assert_eq!(two.len(), 2);
        assert!((two.score() - (0.5f64.ln() + 0.25f64.ln())).abs() < 1e-12);
        // the parent is untouched
        assert_eq!(one.len(), 1);
    }
}
