use crate::dom::{NodeId, Rect};

/// Visible area of the window in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scroll_y: 0.0,
            width: 1024.0,
            height: 768.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scroll_y: 0.0,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.scroll_y + self.height
    }
}

/// True once the element's bottom edge is within `margin` pixels of the
/// viewport's bottom edge (or above it).
pub fn is_in_view(rect: Rect, viewport: Viewport, margin: f64) -> bool {
    rect.bottom() - margin <= viewport.bottom()
}

/// Starts an animation the first time its element scrolls into view.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VisibilityTrigger {
    pub(crate) element: NodeId,
    pub(crate) animation: usize,
    pub(crate) fired: bool,
}

impl VisibilityTrigger {
    pub(crate) fn new(element: NodeId, animation: usize) -> Self {
        Self {
            element,
            animation,
            fired: false,
        }
    }

    /// Marks the trigger fired when the element is in view. Returns `true`
    /// only on the call that fires it.
    pub(crate) fn check(&mut self, rect: Rect, viewport: Viewport, margin: f64) -> bool {
        if self.fired || !is_in_view(rect, viewport, margin) {
            return false;
        }
        self.fired = true;
        true
    }
}
