use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::core::error::CollaboratorError;

/// One comparison target yielded by a candidate provider
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<I, D> {
    pub data: D,
    pub identity: I,
}

impl<I, D> Candidate<I, D> {
    pub fn new(identity: I, data: D) -> Self {
        Self { data, identity }
    }
}

/// Best candidate found by one constraint for one subject
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<I> {
    pub candidate: I,
    pub distance: f64,
}

/// Predicate deciding whether a candidate is usable for a subject
#[async_trait]
pub trait Condition<I, D>: Send + Sync {
    async fn holds(&self, subject: &I, candidate: &D) -> Result<bool, CollaboratorError>;
}

/// Produces the current comparison targets for a constraint
///
/// Called again on every evaluation; implementations must not assume
/// the result is cached by the caller.
#[async_trait]
pub trait CandidateProvider<I, D>: Send + Sync {
    async fn candidates(&self) -> Result<Vec<Candidate<I, D>>, CollaboratorError>;
}

/// Computes the non-negative positional difference between two entities
#[async_trait]
pub trait PositionalDifference<I>: Send + Sync {
    async fn difference(&self, a: &I, b: &I) -> Result<f64, CollaboratorError>;
}

/// Adapts a synchronous closure into a [`Condition`]
pub struct FnCondition<F>(pub F);

#[async_trait]
impl<I, D, F> Condition<I, D> for FnCondition<F>
where
    I: Sync,
    D: Sync,
    F: Fn(&I, &D) -> bool + Send + Sync,
{
    async fn holds(&self, subject: &I, candidate: &D) -> Result<bool, CollaboratorError> {
        Ok((self.0)(subject, candidate))
    }
}

/// Fixed candidate list, handed out fresh on every call
pub struct StaticCandidates<I, D>(pub Vec<Candidate<I, D>>);

#[async_trait]
impl<I, D> CandidateProvider<I, D> for StaticCandidates<I, D>
where
    I: Clone + Send + Sync,
    D: Clone + Send + Sync,
{
    async fn candidates(&self) -> Result<Vec<Candidate<I, D>>, CollaboratorError> {
        Ok(self.0.clone())
    }
}

/// A single relative-search predicate ("near X", "above Y", ...)
///
/// Immutable once built. `I` is the identity token shared by subjects and
/// candidates, `D` is the data the condition inspects for each candidate.
pub struct ConstraintEvaluator<I, D> {
    condition: Arc<dyn Condition<I, D>>,
    provider: Arc<dyn CandidateProvider<I, D>>,
    description: String,
}

impl<I, D> ConstraintEvaluator<I, D> {
    pub fn new(
        condition: impl Condition<I, D> + 'static,
        provider: impl CandidateProvider<I, D> + 'static,
        description: impl Into<String>,
    ) -> Self {
        Self {
            condition: Arc::new(condition),
            provider: Arc::new(provider),
            description: description.into(),
        }
    }

    /// Human-readable description, used for diagnostics only
    pub fn describe(&self) -> &str {
        &self.description
    }

    /// Find the closest candidate satisfying the condition for `subject`
    ///
    /// Candidates are examined in provider order. On equal distances the
    /// earliest candidate wins. `Ok(None)` means no candidate satisfied the
    /// condition; collaborator failures are returned as-is.
    pub async fn find_best_match<G>(
        &self,
        subject: &I,
        geometry: &G,
    ) -> Result<Option<MatchResult<I>>, CollaboratorError>
    where
        G: PositionalDifference<I> + ?Sized,
    {
        let candidates = self.provider.candidates().await?;
        let total = candidates.len();
        let mut best: Option<MatchResult<I>> = None;

        for candidate in candidates {
            if !self.condition.holds(subject, &candidate.data).await? {
                continue;
            }

            let distance = geometry.difference(subject, &candidate.identity).await?;
            if !distance.is_finite() || distance < 0.0 {
                return Err(CollaboratorError::PositionalDifference(format!(
                    "invalid distance {} for '{}'",
                    distance, self.description
                )));
            }

            // Strict comparison keeps the first candidate on ties
            if best.as_ref().map_or(true, |current| distance < current.distance) {
                best = Some(MatchResult {
                    candidate: candidate.identity,
                    distance,
                });
            }
        }

        tracing::trace!(
            constraint = %self.description,
            candidates = total,
            best_distance = ?best.as_ref().map(|m| m.distance),
            "Evaluated constraint"
        );

        Ok(best)
    }
}

impl<I, D> Clone for ConstraintEvaluator<I, D> {
    fn clone(&self) -> Self {
        Self {
            condition: Arc::clone(&self.condition),
            provider: Arc::clone(&self.provider),
            description: self.description.clone(),
        }
    }
}

impl<I, D> fmt::Debug for ConstraintEvaluator<I, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintEvaluator")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<I, D> fmt::Display for ConstraintEvaluator<I, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
