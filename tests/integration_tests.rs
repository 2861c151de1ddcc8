// Integration tests for Proximity Search

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use proximity_search::config::MatchingSettings;
use proximity_search::core::{
    Candidate, CollaboratorError, ConstraintEvaluator, FnCondition, PositionalDifference, ProximityMatcher,
    SearchError, StaticCandidates,
};
use proximity_search::layout::{relative_constraint, Element, ElementId, PageSession, PageSnapshot, Rect, Relation, Selector};
use proximity_search::models::{ErrorResponse, SearchResponse};
use proximity_search::routes::{configure_routes, search::AppState};
use std::collections::HashMap;
use std::time::Duration;

fn create_element(id: u64, tag: &str, text: &str, rect: Rect) -> Element {
    Element {
        id: ElementId(id),
        tag: tag.to_string(),
        text: text.to_string(),
        rect,
        visible: true,
    }
}

/// Sign-in form: two labelled inputs and two buttons on one row
fn create_login_page() -> PageSnapshot {
    PageSnapshot::new(vec![
        create_element(1, "label", "Email", Rect::from_origin(20.0, 20.0, 60.0, 20.0)),
        create_element(2, "input", "", Rect::from_origin(20.0, 45.0, 200.0, 24.0)),
        create_element(3, "label", "Password", Rect::from_origin(20.0, 90.0, 80.0, 20.0)),
        create_element(4, "input", "", Rect::from_origin(20.0, 115.0, 200.0, 24.0)),
        create_element(5, "button", "Sign in", Rect::from_origin(20.0, 170.0, 90.0, 30.0)),
        create_element(6, "button", "Cancel", Rect::from_origin(130.0, 170.0, 90.0, 30.0)),
    ])
}

struct Table(HashMap<(char, u8), f64>);

#[async_trait]
impl PositionalDifference<char> for Table {
    async fn difference(&self, a: &char, b: &char) -> Result<f64, CollaboratorError> {
        let key = (*a, *b as u8);
        self.0
            .get(&key)
            .copied()
            .ok_or_else(|| CollaboratorError::PositionalDifference(format!("{} detached", b)))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Handle(char);

impl proximity_search::Subject for Handle {
    type Id = char;

    fn identity(&self) -> char {
        self.0
    }
}

#[tokio::test]
async fn test_integration_reference_scenario() {
    // Subjects X, Y, Z; candidates c1 ('1') and c2 ('2')
    let geometry = Table(HashMap::from([(('X', b'1'), 2.0), (('X', b'2'), 5.0), (('Z', b'1'), 1.0)]));
    let evaluator = ConstraintEvaluator::new(
        FnCondition(|subject: &char, candidate: &char| match subject {
            'X' => true,
            'Z' => *candidate == '1',
            _ => false,
        }),
        StaticCandidates(vec![Candidate::new('1', '1'), Candidate::new('2', '2')]),
        "near c",
    );
    let matcher = ProximityMatcher::new(geometry);
    let subjects = vec![Handle('X'), Handle('Y'), Handle('Z')];

    let best_for_x = evaluator.find_best_match(&'X', matcher.geometry()).await.unwrap().unwrap();
    assert_eq!(best_for_x.candidate, '1');
    assert_eq!(best_for_x.distance, 2.0);

    let result = matcher.search(subjects, &[evaluator]).await.unwrap();
    assert_eq!(result, vec![Handle('Z'), Handle('X')]);
}

#[tokio::test]
async fn test_integration_input_below_label() {
    let page = PageSession::new(create_login_page());
    let matcher = ProximityMatcher::new(page.clone());
    let constraints = vec![relative_constraint(&page, Relation::Below { offset: None }, Selector::text("Password"))];

    let inputs = page.select(&Selector::tag("input")).await;
    let result = matcher.search(inputs, &constraints).await.unwrap();

    let ids: Vec<_> = result.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![ElementId(4)]);
}

#[tokio::test]
async fn test_integration_inputs_ranked_by_proximity() {
    let page = PageSession::new(create_login_page());
    let matcher = ProximityMatcher::new(page.clone());
    let constraints = vec![relative_constraint(&page, Relation::Above { offset: None }, Selector::text("Sign in"))];

    let inputs = page.select(&Selector::tag("input")).await;
    let ranked = matcher.rank(inputs, &constraints).await.unwrap();

    // Both inputs are above the button; the password input is closer
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].subject.id, ElementId(4));
    assert_eq!(ranked[1].subject.id, ElementId(2));
    assert!(ranked[0].total_distance < ranked[1].total_distance);
}

#[tokio::test]
async fn test_integration_multiple_constraints_must_all_hold() {
    let page = PageSession::new(create_login_page());
    let matcher = ProximityMatcher::new(page.clone());
    let constraints = vec![
        relative_constraint(&page, Relation::Below { offset: None }, Selector::tag("input")),
        relative_constraint(&page, Relation::ToRightOf { offset: None }, Selector::text("Sign in")),
    ];

    let buttons = page.select(&Selector::tag("button")).await;
    let result = matcher.search_concurrent(buttons, &constraints).await.unwrap();

    let ids: Vec<_> = result.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![ElementId(6)]);
}

#[tokio::test]
async fn test_integration_detached_anchor_aborts_search() {
    let page = PageSession::new(create_login_page());
    let constraints = vec![relative_constraint(&page, Relation::Near { offset: 30.0 }, Selector::tag("label"))];
    let inputs = page.select(&Selector::tag("input")).await;

    // Geometry reads a page where the labels no longer exist
    let stale = PageSession::new(PageSnapshot::new(
        create_login_page().elements.into_iter().filter(|e| e.tag == "input").collect(),
    ));
    let matcher = ProximityMatcher::new(stale);

    let err = matcher.search(inputs, &constraints).await.unwrap_err();

    match err {
        SearchError::Collaborator { constraint, source } => {
            assert_eq!(constraint, "near label");
            assert!(matches!(source, CollaboratorError::PositionalDifference(_)));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_integration_candidates_reflect_current_page() {
    let page = PageSession::new(create_login_page());
    let matcher = ProximityMatcher::new(page.clone());
    let constraints = vec![relative_constraint(&page, Relation::Near { offset: 30.0 }, Selector::text("Email"))];
    let inputs = page.select(&Selector::tag("input")).await;

    let before = matcher.search(inputs.clone(), &constraints).await.unwrap();
    assert_eq!(before.len(), 1);

    // Same constraint, new layout without the Email label
    let mut snapshot = create_login_page();
    snapshot.elements.retain(|e| e.text != "Email");
    page.replace(snapshot).await;

    let after = matcher.search(inputs, &constraints).await.unwrap();
    assert!(after.is_empty());
}

#[tokio::test]
async fn test_integration_timeout_returns_no_partial_result() {
    struct Slow;

    #[async_trait]
    impl PositionalDifference<u32> for Slow {
        async fn difference(&self, _a: &u32, _b: &u32) -> Result<f64, CollaboratorError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(0.0)
        }
    }

    let matcher = ProximityMatcher::new(Slow);
    let evaluators = vec![ConstraintEvaluator::new(
        FnCondition(|_: &u32, _: &()| true),
        StaticCandidates(vec![Candidate::new(0u32, ())]),
        "near slow",
    )];

    let result = matcher
        .search_with_timeout(vec![1u32, 2, 3], &evaluators, Duration::from_millis(20))
        .await;

    assert!(matches!(result, Err(SearchError::TimedOut { .. })));
}

fn app_state() -> AppState {
    AppState {
        matching: MatchingSettings::default(),
    }
}

#[actix_web::test]
async fn test_integration_search_endpoint() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/search")
        .set_json(serde_json::json!({
            "elements": create_login_page().elements,
            "target": { "tag": "input" },
            "constraints": [{ "kind": "below", "anchor": { "text": "Email", "exact": true } }]
        }))
        .to_request();

    let resp: SearchResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(resp.total_subjects, 2);
    let ids: Vec<_> = resp.matches.iter().map(|m| m.id).collect();
    // Both inputs are below the Email label, nearest first
    assert_eq!(ids, vec![ElementId(2), ElementId(4)]);
}

#[actix_web::test]
async fn test_integration_search_endpoint_without_constraints() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/search")
        .set_json(serde_json::json!({
            "elements": create_login_page().elements,
            "target": { "tag": "button" },
            "concurrent": true
        }))
        .to_request();

    let resp: SearchResponse = test::call_and_read_body_json(&app, req).await;

    let ids: Vec<_> = resp.matches.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![ElementId(5), ElementId(6)]);
}

#[actix_web::test]
async fn test_integration_search_endpoint_rejects_empty_target() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/search")
        .set_json(serde_json::json!({ "elements": [], "target": {} }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.status_code, 400);
}
