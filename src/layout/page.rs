use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::core::constraint::PositionalDifference;
use crate::core::error::CollaboratorError;
use crate::core::matcher::Subject;
use crate::layout::geometry::{center_distance, Rect};

/// Stable identity of an element within one page session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element as captured in a layout snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub tag: String,
    #[serde(default)]
    pub text: String,
    pub rect: Rect,
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool { true }

impl Subject for Element {
    type Id = ElementId;

    fn identity(&self) -> ElementId {
        self.id
    }
}

/// Layout of a page at one moment, elements in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub elements: Vec<Element>,
}

impl PageSnapshot {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn rect_of(&self, id: ElementId) -> Option<Rect> {
        self.get(id).map(|e| e.rect)
    }

    /// Elements matching `selector`, in document order
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| selector.matches(e))
    }
}

/// Element lookup by tag and/or text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Require the whole text to match instead of a substring
    #[serde(default)]
    pub exact: bool,
}

impl Selector {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    /// A selector with neither tag nor text would match everything
    pub fn is_empty(&self) -> bool {
        self.tag.as_deref().map_or(true, |t| t.trim().is_empty())
            && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }

    /// Tag compares case-insensitively; text is a case-insensitive
    /// substring match unless `exact` is set
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(text) = &self.text {
            let actual = element.text.trim();
            let wanted = text.trim();
            let hit = if self.exact {
                actual == wanted
            } else {
                actual.to_lowercase().contains(&wanted.to_lowercase())
            };
            if !hit {
                return false;
            }
        }

        true
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.tag, &self.text) {
            (Some(tag), Some(text)) => write!(f, "{} \"{}\"", tag, text),
            (Some(tag), None) => write!(f, "{}", tag),
            (None, Some(text)) => write!(f, "text \"{}\"", text),
            (None, None) => write!(f, "any element"),
        }
    }
}

/// Live view of a page layout shared by every collaborator of a search
///
/// Every read goes to the current snapshot; nothing is cached, so a
/// `replace` is visible to the next collaborator call.
#[derive(Debug, Clone, Default)]
pub struct PageSession {
    snapshot: Arc<RwLock<PageSnapshot>>,
}

impl PageSession {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Swap in a new layout, e.g. after the page re-rendered
    pub async fn replace(&self, snapshot: PageSnapshot) {
        let mut current = self.snapshot.write().await;
        *current = snapshot;
        tracing::trace!(elements = current.elements.len(), "Page snapshot replaced");
    }

    pub async fn rect_of(&self, id: ElementId) -> Option<Rect> {
        self.snapshot.read().await.rect_of(id)
    }

    /// Visible elements matching `selector`, in document order
    pub async fn select(&self, selector: &Selector) -> Vec<Element> {
        self.snapshot
            .read()
            .await
            .select(selector)
            .filter(|e| e.visible)
            .cloned()
            .collect()
    }

    pub async fn snapshot(&self) -> PageSnapshot {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl PositionalDifference<ElementId> for PageSession {
    async fn difference(&self, a: &ElementId, b: &ElementId) -> Result<f64, CollaboratorError> {
        let page = self.snapshot.read().await;
        let detached = |id: &ElementId| CollaboratorError::PositionalDifference(format!("element {} is detached", id));

        let ra = page.rect_of(*a).ok_or_else(|| detached(a))?;
        let rb = page.rect_of(*b).ok_or_else(|| detached(b))?;

        Ok(center_distance(&ra, &rb))
    }
}
