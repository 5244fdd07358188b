/// Decides whether an outcome may follow a partial label sequence.
///
/// Implementations must always accept at least one outcome the model can
/// produce, otherwise beam search runs out of candidates. For span schemes
/// that outcome is "other" outside a span. Inside an open span a scheme may
/// refuse "other" as long as it accepts a label that closes the span, as
/// BILOU does with `{type}-last`.
pub trait SequenceValidator: Send + Sync {
    /// True when `outcome` is a legal label for `tokens[index]` given the
    /// labels already chosen in `history`.
    fn valid(&self, index: usize, tokens: &[String], history: &[String], outcome: &str) -> bool;
}

/// Accepts every outcome; used for unconstrained tag sets such as POS tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptAll;

impl SequenceValidator for AcceptAll {
    fn valid(&self, _index: usize, _tokens: &[String], _history: &[String], _outcome: &str) -> bool {
        true
    }
}
