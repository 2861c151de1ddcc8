use async_trait::async_trait;
use std::fmt;

use crate::core::constraint::{Candidate, CandidateProvider, Condition, ConstraintEvaluator};
use crate::core::error::{CollaboratorError, SearchError};
use crate::layout::geometry::{is_above, is_below, is_left_of, is_near, is_right_of, Rect};
use crate::layout::page::{ElementId, PageSession, Selector};

/// Directional relationship between a subject and an anchor element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relation {
    Near { offset: f64 },
    Above { offset: Option<f64> },
    Below { offset: Option<f64> },
    ToLeftOf { offset: Option<f64> },
    ToRightOf { offset: Option<f64> },
}

impl Relation {
    /// Parse a relation name as used by relative selectors
    ///
    /// `near` falls back to `near_offset` when no offset is given. Offsets
    /// must be finite and non-negative.
    pub fn parse(kind: &str, offset: Option<f64>, near_offset: f64) -> Result<Self, SearchError> {
        if let Some(value) = offset {
            if !value.is_finite() || value < 0.0 {
                return Err(SearchError::InvalidArgument(format!(
                    "offset for '{}' must be a non-negative number, got {}",
                    kind, value
                )));
            }
        }

        match kind {
            "near" => Ok(Relation::Near {
                offset: offset.unwrap_or(near_offset),
            }),
            "above" => Ok(Relation::Above { offset }),
            "below" => Ok(Relation::Below { offset }),
            "toLeftOf" => Ok(Relation::ToLeftOf { offset }),
            "toRightOf" => Ok(Relation::ToRightOf { offset }),
            other => Err(SearchError::InvalidArgument(format!(
                "unknown relative selector '{}', expected one of near, above, below, toLeftOf, toRightOf",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Relation::Near { .. } => "near",
            Relation::Above { .. } => "above",
            Relation::Below { .. } => "below",
            Relation::ToLeftOf { .. } => "toLeftOf",
            Relation::ToRightOf { .. } => "toRightOf",
        }
    }

    #[inline]
    pub fn holds(&self, subject: &Rect, anchor: &Rect) -> bool {
        match *self {
            Relation::Near { offset } => is_near(subject, anchor, offset),
            Relation::Above { offset } => is_above(subject, anchor, offset),
            Relation::Below { offset } => is_below(subject, anchor, offset),
            Relation::ToLeftOf { offset } => is_left_of(subject, anchor, offset),
            Relation::ToRightOf { offset } => is_right_of(subject, anchor, offset),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Checks a relation between the subject's current rect and an anchor rect
pub struct RelationCondition {
    page: PageSession,
    relation: Relation,
}

impl RelationCondition {
    pub fn new(page: PageSession, relation: Relation) -> Self {
        Self { page, relation }
    }
}

#[async_trait]
impl Condition<ElementId, Rect> for RelationCondition {
    async fn holds(&self, subject: &ElementId, anchor: &Rect) -> Result<bool, CollaboratorError> {
        let rect = self
            .page
            .rect_of(*subject)
            .await
            .ok_or_else(|| CollaboratorError::Condition(format!("element {} is detached", subject)))?;

        Ok(self.relation.holds(&rect, anchor))
    }
}

/// Visible anchors matching a selector, read from the live page each call
pub struct SelectorCandidates {
    page: PageSession,
    selector: Selector,
}

impl SelectorCandidates {
    pub fn new(page: PageSession, selector: Selector) -> Self {
        Self { page, selector }
    }
}

#[async_trait]
impl CandidateProvider<ElementId, Rect> for SelectorCandidates {
    async fn candidates(&self) -> Result<Vec<Candidate<ElementId, Rect>>, CollaboratorError> {
        Ok(self
            .page
            .select(&self.selector)
            .await
            .into_iter()
            .map(|e| Candidate::new(e.id, e.rect))
            .collect())
    }
}

/// Build the constraint "subject is `relation` some element matching `anchor`"
pub fn relative_constraint(
    page: &PageSession,
    relation: Relation,
    anchor: Selector,
) -> ConstraintEvaluator<ElementId, Rect> {
    let description = format!("{} {}", relation, anchor);
    ConstraintEvaluator::new(
        RelationCondition::new(page.clone(), relation),
        SelectorCandidates::new(page.clone(), anchor),
        description,
    )
}
