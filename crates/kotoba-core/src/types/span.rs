use std::fmt;

use serde::{Deserialize, Serialize};

/// A half-open token interval `[start, end)` with an optional type label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// First token covered by the span.
    pub start: usize,
    /// One past the last token covered by the span.
    pub end: usize,
    /// Entity type, e.g. `"PER"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_type: Option<String>,
}

impl Span {
    /// An untyped span.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            span_type: None,
        }
    }

    /// A typed span.
    pub fn typed(start: usize, end: usize, span_type: impl Into<String>) -> Self {
        Self {
            start,
            end,
            span_type: Some(span_type.into()),
        }
    }

    /// Number of tokens covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True when the span covers no token.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when `index` lies inside the span.
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// True when the two spans share at least one token.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The type label, if any.
    pub fn span_type(&self) -> Option<&str> {
        self.span_type.as_deref()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)?;
        if let Some(span_type) = &self.span_type {
            write!(f, " {span_type}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        assert_eq!(Span::new(0, 2).to_string(), "[0..2)");
        assert_eq!(Span::typed(3, 5, "PER").to_string(), "[3..5) PER");
    }

    #[test]
    fn span_geometry() {
        let span = Span::typed(2, 5, "LOC");
        assert_eq!(span.len(), 3);
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
        assert!(span.overlaps(&Span::new(4, 6)));
        assert!(!span.overlaps(&Span::new(5, 6)));
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn span_serde_roundtrip() {
        let span = Span::typed(1, 4, "ORG");
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(json, r#"{"start":1,"end":4,"span_type":"ORG"}"#);
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);

        let untyped: Span = serde_json::from_str(r#"{"start":0,"end":1}"#).unwrap();
        assert_eq!(untyped, Span::new(0, 1));
    }
}
