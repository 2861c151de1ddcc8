//! Proximity Search - multi-constraint proximity matcher
//!
//! Filters candidate elements down to those satisfying every relative
//! constraint ("near X", "above Y", ...) and ranks the survivors by the
//! summed distance to each constraint's closest anchor.

pub mod config;
pub mod core;
pub mod layout;
pub mod models;
pub mod routes;

// Re-export commonly used types
pub use crate::core::{
    CollaboratorError, ConstraintEvaluator, MatchResult, PositionalDifference, ProximityMatcher,
    RankedSubject, SearchError, Subject,
};
pub use layout::{relative_constraint, Element, ElementId, PageSession, PageSnapshot, Rect, Relation, Selector};
pub use models::{SearchRequest, SearchResponse};
