// Model exports
pub mod requests;
pub mod responses;

pub use requests::{build_constraints, ConstraintSpec, SearchRequest};
pub use responses::{ErrorResponse, HealthResponse, MatchedElement, SearchResponse};
