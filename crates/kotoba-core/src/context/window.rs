//! Baseline token-window context generator.

use crate::context::{ContextGenerator, ExtraContext};

const BOS: &str = "*BOS*";
const EOS: &str = "*EOS*";

/// Emits lower-cased tokens inside a symmetric window, the two previous
/// outcomes, a capitalization flag, caller-supplied features and the
/// outcome previously given to the same token in this document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowContextGenerator {
    window: usize,
}

impl WindowContextGenerator {
    /// A generator looking one token to each side.
    pub fn new() -> Self {
        Self { window: 1 }
    }

    /// Set how many tokens to look at on each side.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Tokens looked at on each side.
    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for WindowContextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextGenerator for WindowContextGenerator {
    fn context(
        &self,
        index: usize,
        tokens: &[String],
        history: &[String],
        extra: ExtraContext<'_>,
    ) -> Vec<String> {
        let token = &tokens[index];
        let mut features = Vec::with_capacity(8 + 2 * self.window);

        features.push("bias".to_string());
        features.push(format!("w={}", token.to_lowercase()));
        if token.chars().next().is_some_and(char::is_uppercase) {
            features.push("cap".to_string());
        }

        for offset in 1..=self.window {
            let before = index
                .checked_sub(offset)
                .map_or(BOS.to_string(), |i| tokens[i].to_lowercase());
            features.push(format!("w[-{offset}]={before}"));

            let after = tokens
                .get(index + offset)
                .map_or(EOS.to_string(), |t| t.to_lowercase());
            features.push(format!("w[+{offset}]={after}"));
        }

        let prev = history.last().map_or(BOS, String::as_str);
        let prev2 = history
            .len()
            .checked_sub(2)
            .map_or(BOS, |i| history[i].as_str());
        features.push(format!("po={prev}"));
        features.push(format!("ppo={prev2},{prev}"));

        for feature in extra.additional_at(index) {
            features.push(format!("x={feature}"));
        }

        if let Some(outcome) = extra.adaptive.and_then(|data| data.previous_outcome(token)) {
            features.push(format!("pd={outcome}"));
        }

        features
    }
}
