pub mod name_finder;
pub mod pos;

pub use name_finder::{Mention, NameFinder};
pub use pos::PosTagger;
