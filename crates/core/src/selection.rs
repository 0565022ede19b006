//! The shared "current frame" and the cursor that follows it.
//!
//! [`SelectionStore`] owns the one authoritative selection that every
//! surface reads. [`CursorSync`] turns pointer and keyboard input on the
//! timeline strip into commits to that store, and places the cursor from the
//! strip's live layout rather than from `index / count` arithmetic, since
//! strip elements need not have uniform widths.

use std::fmt;

use gopview_protocol::Rect;

pub type SubscriptionId = usize;

type Subscriber = Box<dyn FnMut(usize)>;

/// Single-writer store for the current frame position.
///
/// Subscribers run synchronously inside [`commit`](Self::commit), so every
/// read made during one update cycle sees the same value.
#[derive(Default)]
pub struct SelectionStore {
    current: Option<usize>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: SubscriptionId,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Publish a new selection. Subscribers are notified only when the value
    /// actually changes; returns whether it did.
    pub fn commit(&mut self, index: usize) -> bool {
        if self.current == Some(index) {
            return false;
        }
        self.current = Some(index);
        tracing::trace!(index, "selection committed");
        for (_, subscriber) in &mut self.subscribers {
            subscriber(index);
        }
        true
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn subscribe(&mut self, callback: impl FnMut(usize) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }
}

impl fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionStore")
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Live measurement of rendered strip elements.
pub trait LayoutProvider {
    /// Bounds of the element for the frame at `index`, or `None` if no such
    /// element is rendered.
    fn element_bounds(&self, index: usize) -> Option<Rect>;

    /// Bounds of the strip container; cursor positions are relative to it.
    fn container_bounds(&self) -> Rect;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// An in-progress pointer drag. Exists only between press and release.
#[derive(Debug, Clone, Copy)]
struct DragSession {
    last_emitted: usize,
}

#[derive(Debug, Clone)]
pub struct CursorSync {
    frame_count: usize,
    highlighted: usize,
    drag: Option<DragSession>,
    cursor_x: f64,
    dirty: bool,
}

impl CursorSync {
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            highlighted: 0,
            drag: None,
            cursor_x: 0.0,
            dirty: true,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// The locally highlighted position. During a drag this runs ahead of
    /// the store; it may also be stale after the frame list shrinks.
    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Resolve a pointer position to a frame position: a direct hit wins,
    /// otherwise the fractional position along the strip decides.
    pub fn resolve_index(&self, hit: Option<usize>, x: f64, strip_width: f64) -> Option<usize> {
        if self.frame_count == 0 {
            return None;
        }
        if let Some(index) = hit
            && index < self.frame_count
        {
            return Some(index);
        }
        if strip_width.is_nan() || strip_width <= 0.0 || !x.is_finite() {
            return None;
        }
        let last = (self.frame_count - 1) as f64;
        let index = (x / strip_width * self.frame_count as f64).floor();
        Some(index.clamp(0.0, last) as usize)
    }

    /// Start a drag at the pressed position and highlight it.
    pub fn pointer_down(&mut self, hit: Option<usize>, x: f64, strip_width: f64) -> Option<usize> {
        let index = self.resolve_index(hit, x, strip_width)?;
        self.drag = Some(DragSession {
            last_emitted: index,
        });
        self.set_highlighted(index);
        Some(index)
    }

    /// Track a drag. Returns the new position only when it differs from the
    /// last one emitted; moves outside a drag are ignored.
    pub fn pointer_move(&mut self, hit: Option<usize>, x: f64, strip_width: f64) -> Option<usize> {
        let last = self.drag?.last_emitted;
        let index = self.resolve_index(hit, x, strip_width)?;
        if index == last {
            return None;
        }
        self.drag = Some(DragSession {
            last_emitted: index,
        });
        self.set_highlighted(index);
        Some(index)
    }

    /// End the drag and commit its final position to the shared store.
    pub fn pointer_up(&mut self, store: &mut SelectionStore) -> Option<usize> {
        let drag = self.drag.take()?;
        store.commit(drag.last_emitted);
        Some(drag.last_emitted)
    }

    /// Move one frame, clamped to the list, and commit immediately.
    pub fn step(&mut self, direction: Direction, store: &mut SelectionStore) -> Option<usize> {
        if self.frame_count == 0 {
            return None;
        }
        let from = self.highlighted.min(self.frame_count - 1);
        let index = match direction {
            Direction::Previous => from.saturating_sub(1),
            Direction::Next => (from + 1).min(self.frame_count - 1),
        };
        self.select(index, store)
    }

    /// Jump to `index` (clamped) and commit immediately.
    pub fn select(&mut self, index: usize, store: &mut SelectionStore) -> Option<usize> {
        if self.frame_count == 0 {
            return None;
        }
        let index = index.min(self.frame_count - 1);
        self.set_highlighted(index);
        store.commit(index);
        Some(index)
    }

    /// Adopt a selection made elsewhere (another surface, a search box).
    pub fn sync_from(&mut self, store: &SelectionStore) {
        if let Some(current) = store.current()
            && !self.is_dragging()
        {
            self.set_highlighted(current);
        }
    }

    pub fn set_frame_count(&mut self, frame_count: usize) {
        if frame_count != self.frame_count {
            self.frame_count = frame_count;
            self.dirty = true;
        }
    }

    /// The rendered elements were replaced or resized.
    pub fn notify_elements_changed(&mut self) {
        self.dirty = true;
    }

    /// Horizontal cursor position: the center of the highlighted element,
    /// relative to the container. Falls back to 0 when there is no such
    /// element. Re-measured only after a highlight, count, or element change.
    pub fn cursor_x(&mut self, layout: &dyn LayoutProvider) -> f64 {
        if self.dirty {
            self.cursor_x = self.measure(layout);
            self.dirty = false;
        }
        self.cursor_x
    }

    fn measure(&self, layout: &dyn LayoutProvider) -> f64 {
        if self.highlighted >= self.frame_count {
            return 0.0;
        }
        let container = layout.container_bounds();
        layout
            .element_bounds(self.highlighted)
            .map_or(0.0, |bounds| bounds.center_x() - container.x)
    }

    fn set_highlighted(&mut self, index: usize) {
        if index != self.highlighted {
            self.highlighted = index;
            self.dirty = true;
        }
    }
}
