// Core algorithm exports
pub mod detector;
pub mod ranking;
pub mod scoring;

pub use detector::{InteractionOutcome, MatchDetector, MatchError, PairLocks};
pub use ranking::{RankLimits, RankResult, Ranker};
pub use scoring::{CompatibilityScorer, Direction, ScoringWeights};
