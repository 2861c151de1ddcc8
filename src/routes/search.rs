use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::{with_deadline, ProximityMatcher, SearchError};
use crate::layout::{PageSession, PageSnapshot};
use crate::models::{build_constraints, ErrorResponse, HealthResponse, MatchedElement, SearchRequest, SearchResponse};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matching: MatchingSettings,
}

/// Configure all search-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/search", web::post().to(relative_search));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Relative search endpoint
///
/// POST /api/v1/search
///
/// Ranks the elements selected by `target` that satisfy every constraint,
/// closest first. With no constraints the selected elements are returned
/// in document order.
async fn relative_search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: field_errors={:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let search_id = Uuid::new_v4();
    let settings = &state.matching;
    let page = PageSession::new(PageSnapshot::new(req.elements));

    // Reject bad constraints before touching any subject
    let constraints = match build_constraints(&req.constraints, &page, settings.near_offset_px) {
        Ok(constraints) => constraints,
        Err(e) => return search_error_response(search_id, &e),
    };

    let subjects = page.select(&req.target).await;
    let total_subjects = subjects.len();

    tracing::info!(
        %search_id,
        selector = %req.target,
        subjects = total_subjects,
        constraints = constraints.len(),
        concurrent = req.concurrent,
        "Running relative search"
    );

    let matcher = ProximityMatcher::new(page).with_max_concurrency(settings.max_concurrency);
    let timeout = settings.search_timeout();

    let result = if req.concurrent {
        with_deadline(timeout, matcher.search_concurrent(subjects, &constraints)).await
    } else {
        with_deadline(timeout, matcher.search(subjects, &constraints)).await
    };

    match result {
        Ok(matches) => {
            tracing::debug!(%search_id, matched = matches.len(), "Relative search finished");
            HttpResponse::Ok().json(SearchResponse {
                search_id,
                matches: matches.into_iter().map(MatchedElement::from).collect(),
                total_subjects,
            })
        }
        Err(e) => search_error_response(search_id, &e),
    }
}

fn search_error_response(search_id: Uuid, err: &SearchError) -> HttpResponse {
    let (mut builder, error, status_code) = match err {
        SearchError::InvalidArgument(_) => (HttpResponse::BadRequest(), "Invalid argument", 400),
        SearchError::TimedOut { .. } => (HttpResponse::GatewayTimeout(), "Search timed out", 504),
        SearchError::Collaborator { .. } => (HttpResponse::InternalServerError(), "Search failed", 500),
    };

    if status_code >= 500 {
        tracing::error!(%search_id, "Relative search failed: {}", err);
    } else {
        tracing::info!(%search_id, "Relative search rejected: {}", err);
    }

    builder.json(ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code,
    })
}
