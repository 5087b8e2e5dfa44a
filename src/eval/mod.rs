//! Position evaluation: the N-tuple lookup-table estimator and the patterns
//! it reads the board through.

pub mod n_tuple;
pub mod pattern;

pub use n_tuple::{EpsilonSchedule, Experience, NTupleAgent};
pub use pattern::{default_patterns, Pattern};
