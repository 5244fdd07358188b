pub mod sequence;
pub mod span;

pub use sequence::Sequence;
pub use span::Span;
