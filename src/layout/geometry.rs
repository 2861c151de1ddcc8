use serde::{Deserialize, Serialize};

/// Default proximity offset for "near" in CSS pixels
pub const DEFAULT_NEAR_OFFSET_PX: f64 = 30.0;

/// Element bounding box in page coordinates (CSS pixels, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// Build a rect from its origin and size
    pub fn from_origin(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Grow the rect by `offset` on every side
    pub fn expand(&self, offset: f64) -> Rect {
        Rect {
            left: self.left - offset,
            top: self.top - offset,
            right: self.right + offset,
            bottom: self.bottom + offset,
        }
    }

    /// Whether the two rects overlap or touch
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left <= other.right
            && self.right >= other.left
            && self.top <= other.bottom
            && self.bottom >= other.top
    }

    /// All edges finite and right/bottom not before left/top
    pub fn is_well_formed(&self) -> bool {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.right >= self.left
            && self.bottom >= self.top
    }
}

/// Euclidean distance between the centers of two rects
///
/// This is the positional difference used to rank relative matches.
#[inline]
pub fn center_distance(a: &Rect, b: &Rect) -> f64 {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    (ax - bx).hypot(ay - by)
}

/// Gap is acceptable when no limit is set or it stays within the limit
#[inline]
fn within_gap(gap: f64, offset: Option<f64>) -> bool {
    offset.map_or(true, |max| gap <= max)
}

/// Subject lies entirely above the anchor
#[inline]
pub fn is_above(subject: &Rect, anchor: &Rect, offset: Option<f64>) -> bool {
    subject.bottom <= anchor.top && within_gap(anchor.top - subject.bottom, offset)
}

/// Subject lies entirely below the anchor
#[inline]
pub fn is_below(subject: &Rect, anchor: &Rect, offset: Option<f64>) -> bool {
    subject.top >= anchor.bottom && within_gap(subject.top - anchor.bottom, offset)
}

/// Subject lies entirely to the left of the anchor
#[inline]
pub fn is_left_of(subject: &Rect, anchor: &Rect, offset: Option<f64>) -> bool {
    subject.right <= anchor.left && within_gap(anchor.left - subject.right, offset)
}

/// Subject lies entirely to the right of the anchor
#[inline]
pub fn is_right_of(subject: &Rect, anchor: &Rect, offset: Option<f64>) -> bool {
    subject.left >= anchor.right && within_gap(subject.left - anchor.right, offset)
}

/// Subject touches the anchor grown by `offset` pixels on every side
#[inline]
pub fn is_near(subject: &Rect, anchor: &Rect, offset: f64) -> bool {
    subject.intersects(&anchor.expand(offset))
}
