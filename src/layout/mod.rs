// Page layout collaborators for relative search
pub mod geometry;
pub mod page;
pub mod relative;

pub use geometry::{center_distance, Rect, DEFAULT_NEAR_OFFSET_PX};
pub use page::{Element, ElementId, PageSession, PageSnapshot, Selector};
pub use relative::{relative_constraint, Relation, RelationCondition, SelectorCandidates};
