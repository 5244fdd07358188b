pub mod beam;
pub mod validator;

pub use beam::{BeamSearch, DEFAULT_BEAM_SIZE};
pub use validator::{AcceptAll, SequenceValidator};
