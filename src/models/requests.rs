use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

use crate::core::{ConstraintEvaluator, SearchError};
use crate::layout::{relative_constraint, Element, ElementId, PageSession, Rect, Relation, Selector};

/// Upper bound on relative constraints per request
pub const MAX_CONSTRAINTS: u64 = 16;

/// Request to rank elements of a page layout by relative constraints
///
/// ```json
/// {
///   "elements": [{ "id": 1, "tag": "input", "text": "", "rect": { ... } }],
///   "target": { "tag": "input" },
///   "constraints": [{ "kind": "below", "anchor": { "text": "Email" } }],
///   "concurrent": false
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_elements"))]
    pub elements: Vec<Element>,
    #[validate(custom(function = "validate_target"))]
    pub target: Selector,
    #[serde(default)]
    #[validate(length(max = MAX_CONSTRAINTS))]
    pub constraints: Vec<ConstraintSpec>,
    #[serde(default)]
    pub concurrent: bool,
}

fn validate_target(target: &Selector) -> Result<(), ValidationError> {
    if target.is_empty() {
        return Err(ValidationError::new("target_requires_tag_or_text"));
    }
    Ok(())
}

/// Element ids must be unique and every rect well formed; the page
/// session resolves ids to rects, so a repeated id would be judged by
/// the wrong geometry
fn validate_elements(elements: &Vec<Element>) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(elements.len());

    for element in elements {
        if !seen.insert(element.id) {
            let mut err = ValidationError::new("duplicate_element_id");
            err.message = Some(format!("element id {} appears more than once", element.id.0).into());
            return Err(err);
        }
        if !element.rect.is_well_formed() {
            let mut err = ValidationError::new("malformed_rect");
            err.message = Some(format!("element {} has a malformed rect", element.id.0).into());
            return Err(err);
        }
    }

    Ok(())
}

/// Relative selector as received over the wire, e.g. `below("Email")`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub kind: String,
    pub anchor: Selector,
    #[serde(default)]
    pub offset: Option<f64>,
}

impl ConstraintSpec {
    /// Turn the spec into a constraint bound to `page`
    pub fn build(
        &self,
        page: &PageSession,
        near_offset: f64,
    ) -> Result<ConstraintEvaluator<ElementId, Rect>, SearchError> {
        let relation = Relation::parse(&self.kind, self.offset, near_offset)?;
        if self.anchor.is_empty() {
            return Err(SearchError::InvalidArgument(format!(
                "'{}' needs an anchor with a tag or text",
                self.kind
            )));
        }
        Ok(relative_constraint(page, relation, self.anchor.clone()))
    }
}

/// Build every constraint up front; the first invalid spec rejects the
/// whole request before anything is evaluated
pub fn build_constraints(
    specs: &[ConstraintSpec],
    page: &PageSession,
    near_offset: f64,
) -> Result<Vec<ConstraintEvaluator<ElementId, Rect>>, SearchError> {
    specs.iter().map(|spec| spec.build(page, near_offset)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PageSnapshot;

    fn spec(kind: &str, anchor: Selector) -> ConstraintSpec {
        ConstraintSpec {
            kind: kind.to_string(),
            anchor,
            offset: None,
        }
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: SearchRequest = serde_json::from_str(
            r#"{ "target": { "tag": "input" },
                 "constraints": [{ "kind": "near", "anchor": { "text": "Email" } }] }"#,
        )
        .unwrap();

        assert!(req.elements.is_empty());
        assert!(!req.concurrent);
        assert_eq!(req.constraints.len(), 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_target_fails_validation() {
        let req = SearchRequest {
            elements: vec![],
            target: Selector::default(),
            constraints: vec![],
            concurrent: false,
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_too_many_constraints_fail_validation() {
        let req = SearchRequest {
            elements: vec![],
            target: Selector::tag("input"),
            constraints: (0..=MAX_CONSTRAINTS).map(|_| spec("near", Selector::tag("label"))).collect(),
            concurrent: false,
        };

        assert!(req.validate().is_err());
    }

    fn element(id: u64, rect: Rect) -> Element {
        Element {
            id: ElementId(id),
            tag: "input".to_string(),
            text: String::new(),
            rect,
            visible: true,
        }
    }

    #[test]
    fn test_duplicate_element_ids_fail_validation() {
        let req = SearchRequest {
            elements: vec![
                element(1, Rect::from_origin(0.0, 0.0, 10.0, 10.0)),
                element(1, Rect::from_origin(0.0, 900.0, 10.0, 10.0)),
            ],
            target: Selector::tag("input"),
            constraints: vec![],
            concurrent: false,
        };

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("elements"));
    }

    #[test]
    fn test_malformed_rect_fails_validation() {
        let req = SearchRequest {
            elements: vec![element(2, Rect::new(500.0, 0.0, 0.0, 20.0))],
            target: Selector::tag("input"),
            constraints: vec![],
            concurrent: false,
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_distinct_well_formed_elements_pass_validation() {
        let req = SearchRequest {
            elements: vec![
                element(1, Rect::from_origin(0.0, 0.0, 10.0, 10.0)),
                element(2, Rect::from_origin(0.0, 20.0, 10.0, 10.0)),
            ],
            target: Selector::tag("input"),
            constraints: vec![],
            concurrent: false,
        };

        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_build_constraints() {
        let page = PageSession::new(PageSnapshot::default());
        let specs = vec![spec("near", Selector::text("Email")), spec("toLeftOf", Selector::tag("button"))];

        let constraints = build_constraints(&specs, &page, 30.0).unwrap();

        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].describe(), "near text \"Email\"");
        assert_eq!(constraints[1].describe(), "toLeftOf button");
    }

    #[test]
    fn test_build_rejects_unknown_kind_and_empty_anchor() {
        let page = PageSession::new(PageSnapshot::default());

        let unknown = build_constraints(
            &[spec("near", Selector::tag("a")), spec("inside", Selector::tag("form"))],
            &page,
            30.0,
        );
        assert!(matches!(unknown, Err(SearchError::InvalidArgument(_))));

        let empty_anchor = build_constraints(&[spec("above", Selector::default())], &page, 30.0);
        assert!(matches!(empty_anchor, Err(SearchError::InvalidArgument(_))));
    }
}
