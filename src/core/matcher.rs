use futures::stream::{self, StreamExt, TryStreamExt};
use std::cmp::Ordering;
use std::future::Future;
use std::time::Duration;

use crate::core::constraint::{ConstraintEvaluator, PositionalDifference};
use crate::core::error::SearchError;

/// Default number of subjects evaluated at once by the concurrent search
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Identity accessor for anything that can be ranked
///
/// Plain id types are their own identity; richer handles expose the token
/// their collaborators understand.
pub trait Subject {
    type Id;

    fn identity(&self) -> Self::Id;
}

macro_rules! self_identified {
    ($($ty:ty),*) => {
        $(
            impl Subject for $ty {
                type Id = $ty;

                fn identity(&self) -> $ty {
                    self.clone()
                }
            }
        )*
    };
}

self_identified!(u32, u64, usize, String);

/// Subject that satisfied every constraint, with its ranking key
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSubject<S> {
    pub subject: S,
    pub total_distance: f64,
}

/// Why a subject dropped out of the evaluator fold
enum Rejection {
    NoMatch,
    Failed(SearchError),
}

/// Main relative-search orchestrator
///
/// Keeps only the subjects that satisfy every constraint and orders them
/// by the sum of their per-constraint best distances, closest first.
///
/// # Pipeline
/// 1. Resolve each subject's identity
/// 2. Fold over the constraints in order, stopping at the first miss
/// 3. Stable sort by total distance
#[derive(Debug, Clone)]
pub struct ProximityMatcher<G> {
    geometry: G,
    max_concurrency: usize,
}

impl<G> ProximityMatcher<G> {
    pub fn new(geometry: G) -> Self {
        Self {
            geometry,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Filter and rank `subjects` against `evaluators`
    ///
    /// With no evaluators the subjects come back untouched. Otherwise only
    /// subjects matching every evaluator are returned, closest first, with
    /// ties kept in input order.
    pub async fn search<S, D>(
        &self,
        subjects: Vec<S>,
        evaluators: &[ConstraintEvaluator<S::Id, D>],
    ) -> Result<Vec<S>, SearchError>
    where
        S: Subject,
        G: PositionalDifference<S::Id>,
    {
        if evaluators.is_empty() {
            return Ok(subjects);
        }

        let ranked = self.rank(subjects, evaluators).await?;
        Ok(ranked.into_iter().map(|r| r.subject).collect())
    }

    /// Same as [`search`](Self::search) but keeps the ranking keys
    ///
    /// With no evaluators every subject is returned with a total distance
    /// of zero, in input order.
    pub async fn rank<S, D>(
        &self,
        subjects: Vec<S>,
        evaluators: &[ConstraintEvaluator<S::Id, D>],
    ) -> Result<Vec<RankedSubject<S>>, SearchError>
    where
        S: Subject,
        G: PositionalDifference<S::Id>,
    {
        if evaluators.is_empty() {
            return Ok(unranked(subjects));
        }

        let total_subjects = subjects.len();
        let mut ranked = Vec::with_capacity(total_subjects);

        for subject in subjects {
            let identity = subject.identity();
            if let Some(total_distance) = self.total_distance(&identity, evaluators).await? {
                ranked.push(RankedSubject {
                    subject,
                    total_distance,
                });
            }
        }

        // Vec::sort_by is stable, so equal distances keep input order
        ranked.sort_by(|a, b| by_distance(a, b));

        tracing::debug!(
            subjects = total_subjects,
            constraints = evaluators.len(),
            matched = ranked.len(),
            "Relative search complete"
        );

        Ok(ranked)
    }

    /// [`search`](Self::search) with up to `max_concurrency` subjects in flight
    pub async fn search_concurrent<S, D>(
        &self,
        subjects: Vec<S>,
        evaluators: &[ConstraintEvaluator<S::Id, D>],
    ) -> Result<Vec<S>, SearchError>
    where
        S: Subject,
        G: PositionalDifference<S::Id>,
    {
        if evaluators.is_empty() {
            return Ok(subjects);
        }

        let ranked = self.rank_concurrent(subjects, evaluators).await?;
        Ok(ranked.into_iter().map(|r| r.subject).collect())
    }

    /// [`rank`](Self::rank) with up to `max_concurrency` subjects in flight
    ///
    /// Subjects finish in any order; ties are broken by original input
    /// position, never by completion order.
    pub async fn rank_concurrent<S, D>(
        &self,
        subjects: Vec<S>,
        evaluators: &[ConstraintEvaluator<S::Id, D>],
    ) -> Result<Vec<RankedSubject<S>>, SearchError>
    where
        S: Subject,
        G: PositionalDifference<S::Id>,
    {
        if evaluators.is_empty() {
            return Ok(unranked(subjects));
        }

        let total_subjects = subjects.len();

        let mut indexed: Vec<(usize, RankedSubject<S>)> = stream::iter(subjects.into_iter().enumerate())
            .map(|(index, subject)| async move {
                let identity = subject.identity();
                let total = self.total_distance(&identity, evaluators).await?;
                Ok::<_, SearchError>(total.map(|total_distance| {
                    (
                        index,
                        RankedSubject {
                            subject,
                            total_distance,
                        },
                    )
                }))
            })
            .buffer_unordered(self.max_concurrency)
            .try_filter_map(|matched| async move { Ok::<_, SearchError>(matched) })
            .try_collect()
            .await?;

        indexed.sort_by(|(ia, a), (ib, b)| by_distance(a, b).then_with(|| ia.cmp(ib)));

        tracing::debug!(
            subjects = total_subjects,
            constraints = evaluators.len(),
            matched = indexed.len(),
            max_concurrency = self.max_concurrency,
            "Concurrent relative search complete"
        );

        Ok(indexed.into_iter().map(|(_, ranked)| ranked).collect())
    }

    /// Sequential [`search`](Self::search) abandoned after `timeout`
    pub async fn search_with_timeout<S, D>(
        &self,
        subjects: Vec<S>,
        evaluators: &[ConstraintEvaluator<S::Id, D>],
        timeout: Duration,
    ) -> Result<Vec<S>, SearchError>
    where
        S: Subject,
        G: PositionalDifference<S::Id>,
    {
        with_deadline(timeout, self.search(subjects, evaluators)).await
    }

    /// Sum of best distances across all evaluators, or `None` on the first miss
    async fn total_distance<I, D>(
        &self,
        identity: &I,
        evaluators: &[ConstraintEvaluator<I, D>],
    ) -> Result<Option<f64>, SearchError>
    where
        G: PositionalDifference<I>,
    {
        let geometry = &self.geometry;

        let outcome = stream::iter(evaluators.iter().map(Ok::<_, Rejection>))
            .try_fold(0.0_f64, |total, evaluator| async move {
                let best = evaluator
                    .find_best_match(identity, geometry)
                    .await
                    .map_err(|source| {
                        tracing::warn!(
                            constraint = %evaluator,
                            error = %source,
                            "Collaborator failure aborted relative search"
                        );
                        Rejection::Failed(SearchError::Collaborator {
                            constraint: evaluator.describe().to_string(),
                            source,
                        })
                    })?
                    .ok_or_else(|| {
                        tracing::trace!(constraint = %evaluator, "Subject excluded, no matching candidate");
                        Rejection::NoMatch
                    })?;

                Ok::<f64, Rejection>(total + best.distance)
            })
            .await;

        match outcome {
            Ok(total) => Ok(Some(total)),
            Err(Rejection::NoMatch) => Ok(None),
            Err(Rejection::Failed(err)) => Err(err),
        }
    }
}

/// Run `search` but give up once `timeout` elapses
///
/// Dropping the search abandons any in-flight collaborator calls; no
/// partial result is produced. A zero timeout never starts the search.
pub async fn with_deadline<T, F>(timeout: Duration, search: F) -> Result<T, SearchError>
where
    F: Future<Output = Result<T, SearchError>>,
{
    if timeout.is_zero() {
        return Err(SearchError::TimedOut { elapsed_ms: 0 });
    }

    match tokio::time::timeout(timeout, search).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::TimedOut {
            elapsed_ms: timeout.as_millis() as u64,
        }),
    }
}

fn unranked<S>(subjects: Vec<S>) -> Vec<RankedSubject<S>> {
    subjects
        .into_iter()
        .map(|subject| RankedSubject {
            subject,
            total_distance: 0.0,
        })
        .collect()
}

fn by_distance<S>(a: &RankedSubject<S>, b: &RankedSubject<S>) -> Ordering {
    a.total_distance
        .partial_cmp(&b.total_distance)
        .unwrap_or(Ordering::Equal)
}
