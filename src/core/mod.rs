// Core relative-search exports
pub mod constraint;
pub mod error;
pub mod matcher;

pub use constraint::{
    Candidate, CandidateProvider, Condition, ConstraintEvaluator, FnCondition, MatchResult,
    PositionalDifference, StaticCandidates,
};
pub use error::{CollaboratorError, SearchError};
pub use matcher::{with_deadline, ProximityMatcher, RankedSubject, Subject, DEFAULT_MAX_CONCURRENCY};
