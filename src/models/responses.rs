use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::layout::{Element, ElementId};

/// Response for the relative search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "searchId")]
    pub search_id: Uuid,
    /// Matching elements, closest first
    pub matches: Vec<MatchedElement>,
    /// Elements selected by the target before constraints were applied
    #[serde(rename = "totalSubjects")]
    pub total_subjects: usize,
}

/// One ranked element in a search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedElement {
    pub id: ElementId,
    pub tag: String,
    pub text: String,
}

impl From<Element> for MatchedElement {
    fn from(element: Element) -> Self {
        Self {
            id: element.id,
            tag: element.tag,
            text: element.text,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
