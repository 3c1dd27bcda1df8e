//! Strategy: alpha scoring and candidate selection.

pub mod alpha;
pub mod keywords;
pub mod ranker;

pub use alpha::{AlphaScorer, ScoringPolicy, ScoringWeights};
pub use ranker::{rank, select};
