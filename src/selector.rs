//! Region-selection state machine for the capture overlay.
//!
//! Pure pointer/keyboard logic, no I/O and no window calls — the
//! overlay host feeds events in and renders from the state it reads
//! back. Coordinates are device pixels in the capture window's local
//! space.

/// A point in the overlay's local pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// The raw drag extent. `start`/`end` are in insertion order, not
/// spatial order — normalization happens in [`Selection::rect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub start: Point,
    pub end: Point,
}

impl Selection {
    /// Normalized rectangle: origin at the top-left corner of the drag
    /// extent, non-negative width and height regardless of direction.
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.start.x.min(self.end.x),
            y: self.start.y.min(self.end.y),
            w: (self.end.x - self.start.x).abs(),
            h: (self.end.y - self.start.y).abs(),
        }
    }
}

/// A normalized rectangle, always derived from a [`Selection`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Integer rectangle handed to the crop operation: rounded, clamped
/// at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn to_pixel(&self) -> PixelRect {
        PixelRect {
            x: self.x.round().max(0.0) as u32,
            y: self.y.round().max(0.0) as u32,
            width: self.w.round().max(0.0) as u32,
            height: self.h.round().max(0.0) as u32,
        }
    }
}

/// The viewport the overlay covers, in the same pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// What the overlay signals back to the orchestrator on a key event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectorAction {
    Commit(Rect),
    Cancel,
}

/// What the overlay should draw besides the selection itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hud {
    /// No selection, not dragging: the "click and drag" hint.
    Hint,
    /// Live dimension readout near the pointer while dragging.
    Readout { at: Point, width: f64, height: f64 },
    /// Floating confirm/dismiss controls next to a completed
    /// selection, clamped to the viewport.
    ActionBar { at: Point },
}

// Action-bar footprint used by the clamping math.
const BAR_WIDTH: f64 = 120.0;
const BAR_HEIGHT: f64 = 48.0;
const BAR_GAP: f64 = 16.0;
const VIEW_MARGIN: f64 = 10.0;

/// Pointer-driven rectangle selection.
///
/// A selection survives `pointer_up` so the user can review it before
/// committing; the next `pointer_down` on the canvas replaces it
/// unconditionally.
#[derive(Debug, Default)]
pub struct RegionSelector {
    selection: Option<Selection>,
    dragging: bool,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new selection at `p`. Ignored while a drag is already
    /// in progress and when the press lands on a control affordance
    /// (the action bar), so clicking "confirm" does not wipe the
    /// selection it confirms.
    pub fn pointer_down(&mut self, p: Point, over_control: bool) {
        if self.dragging || over_control {
            return;
        }
        self.selection = Some(Selection { start: p, end: p });
        self.dragging = true;
    }

    /// Extend the in-progress drag. No-op unless dragging.
    pub fn pointer_move(&mut self, p: Point) {
        if !self.dragging {
            return;
        }
        if let Some(sel) = &mut self.selection {
            sel.end = p;
        }
    }

    /// End the drag. The selection persists for review.
    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Escape: clear everything and tell the orchestrator to cancel.
    pub fn key_escape(&mut self) -> SelectorAction {
        self.selection = None;
        self.dragging = false;
        SelectorAction::Cancel
    }

    /// Enter: commit the current selection, if there is one. The
    /// minimum-size threshold is the orchestrator's call, not ours.
    pub fn key_enter(&self) -> Option<SelectorAction> {
        self.selection.map(|sel| SelectorAction::Commit(sel.rect()))
    }

    /// Dismiss the selection without ending the session (the action
    /// bar's "X" control).
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Overlay chrome for the current state.
    pub fn hud(&self, viewport: Viewport) -> Hud {
        match (self.selection, self.dragging) {
            (None, _) => Hud::Hint,
            (Some(sel), true) => Hud::Readout {
                at: sel.end,
                width: (sel.end.x - sel.start.x).abs(),
                height: (sel.end.y - sel.start.y).abs(),
            },
            (Some(sel), false) => Hud::ActionBar {
                at: action_bar_anchor(sel.rect(), viewport),
            },
        }
    }
}

/// Centers the action bar under the selection, flipping above it when
/// it would run off the bottom, and keeps it inside the viewport
/// margin either way.
fn action_bar_anchor(rect: Rect, viewport: Viewport) -> Point {
    let x = (rect.x + rect.w / 2.0 - BAR_WIDTH / 2.0)
        .min(viewport.width - BAR_WIDTH)
        .max(VIEW_MARGIN);
    let below = rect.y + rect.h + BAR_GAP;
    let y = if below + BAR_HEIGHT > viewport.height {
        rect.y - BAR_HEIGHT - VIEW_MARGIN
    } else {
        below
    };
    Point {
        x,
        y: y.max(VIEW_MARGIN),
    }
}
