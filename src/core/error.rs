use thiserror::Error;

/// Failure reported by one of the collaborators a constraint depends on
///
/// The collaborator picks the variant and message; the core passes the
/// value through untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    #[error("condition check failed: {0}")]
    Condition(String),

    #[error("candidate provider failed: {0}")]
    CandidateProvider(String),

    #[error("positional difference failed: {0}")]
    PositionalDifference(String),
}

/// Errors that can abort a relative search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Constraint '{constraint}' failed: {source}")]
    Collaborator {
        constraint: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("Search timed out after {elapsed_ms}ms")]
    TimedOut { elapsed_ms: u64 },
}

impl SearchError {
    /// The collaborator failure behind this error, if any
    pub fn collaborator_error(&self) -> Option<&CollaboratorError> {
        match self {
            SearchError::Collaborator { source, .. } => Some(source),
            _ => None,
        }
    }
}
