use std::ops::Range;
use std::sync::Arc;

use gopview_protocol::{Frame, RenderCommand, Viewport};

use crate::analysis::{TemporalLevelAnalysis, analyze};
use crate::arrows::{ArrowGeometry, ArrowLayoutCache, FocusedArrows, FrameAnchors};
use crate::model::SurfaceKind;
use crate::references::{ReferenceSummary, summarize};
use crate::selection::{CursorSync, Direction, SelectionStore};
use crate::views::timeline::{STRIP_HEIGHT, StripLayout, StripSizing};
use crate::views::{filmstrip, minimap, overlay, pyramid, timeline};

/// Vertical space between the timeline strip and the arrow band below it.
const ARROW_BAND_GAP: f64 = 4.0;

/// One loaded frame list and everything derived from it.
///
/// Expensive derivations (temporal analysis, arrow geometry) are computed
/// once per frame-list identity; moving the current frame only touches the
/// selection and cursor.
#[derive(Debug)]
pub struct Session {
    frames: Arc<[Frame]>,
    analysis: TemporalLevelAnalysis,
    references: ReferenceSummary,
    arrows: ArrowLayoutCache,
    selection: SelectionStore,
    cursor: CursorSync,
    sizing: StripSizing,
    /// Viewport the strip was last laid out in; a change means the cursor
    /// must be re-measured.
    strip_viewport: Option<Viewport>,
    visible_range: Option<Range<usize>>,
    analysis_computations: usize,
}

impl Session {
    /// Create a new empty session.
    pub fn new() -> Self {
        let frames: Arc<[Frame]> = Arc::from(Vec::new());
        Self {
            frames,
            analysis: TemporalLevelAnalysis::default(),
            references: ReferenceSummary::default(),
            arrows: ArrowLayoutCache::new(),
            selection: SelectionStore::new(),
            cursor: CursorSync::new(0),
            sizing: StripSizing::default(),
            strip_viewport: None,
            visible_range: None,
            analysis_computations: 0,
        }
    }

    pub fn from_frames(frames: impl Into<Arc<[Frame]>>) -> Self {
        let mut session = Self::new();
        session.replace_frames(frames.into());
        session
    }

    /// Swap in a new frame-list snapshot. Re-analyzes only if the snapshot is
    /// a different list; a stale selection is kept and degrades at render
    /// time rather than being reset here.
    pub fn replace_frames(&mut self, frames: Arc<[Frame]>) {
        if Arc::ptr_eq(&self.frames, &frames) {
            return;
        }
        tracing::debug!(frames = frames.len(), "frame list replaced");
        self.analysis = analyze(&frames);
        self.references = summarize(&frames);
        self.analysis_computations += 1;
        self.cursor.set_frame_count(frames.len());
        self.cursor.notify_elements_changed();
        self.frames = frames;
    }

    pub fn frames(&self) -> &Arc<[Frame]> {
        &self.frames
    }

    pub fn analysis(&self) -> &TemporalLevelAnalysis {
        &self.analysis
    }

    pub fn references(&self) -> &ReferenceSummary {
        &self.references
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionStore {
        &mut self.selection
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn set_strip_sizing(&mut self, sizing: StripSizing) {
        if sizing != self.sizing {
            self.sizing = sizing;
            self.cursor.notify_elements_changed();
        }
    }

    /// Positions the main strip currently shows, outlined on the minimap.
    /// `None` means the whole list.
    pub fn set_visible_range(&mut self, range: Option<Range<usize>>) {
        self.visible_range = range;
    }

    /// The highlighted list position, or `None` when it is out of range.
    /// During a drag this is ahead of the committed selection.
    pub fn current_position(&self) -> Option<usize> {
        let position = self.cursor.highlighted();
        (position < self.frames.len()).then_some(position)
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.current_position().map(|p| &self.frames[p])
    }

    pub fn strip_layout(&self, viewport: &Viewport) -> StripLayout {
        StripLayout::compute(&self.frames, viewport, self.sizing)
    }

    pub fn arrow_geometry(&self, viewport: &Viewport) -> ArrowGeometry {
        let mut geometry = ArrowGeometry::for_viewport(viewport.width, self.frames.len());
        geometry.anchor_y = viewport.y + STRIP_HEIGHT.min(viewport.height) + ARROW_BAND_GAP;
        geometry
    }

    /// Memoized arrow layout for `viewport`, focused on the current frame.
    pub fn arrows(&mut self, viewport: &Viewport) -> FocusedArrows<'_> {
        let focus = self.current_frame().map(|f| f.frame_index);
        self.arrows_focused(viewport, focus)
    }

    /// Arrow anchors at the cell centers of the strip laid out in `viewport`.
    pub fn arrow_anchors(&self, viewport: &Viewport) -> FrameAnchors {
        let strip = self.strip_layout(viewport);
        FrameAnchors::from_centers(
            self.frames
                .iter()
                .zip(strip.elements())
                .map(|(frame, rect)| (frame.frame_index, rect.center_x())),
        )
    }

    /// Memoized arrow layout for `viewport` with an explicit focus frame
    /// index. Changing only the focus never recomputes geometry.
    pub fn arrows_focused(&mut self, viewport: &Viewport, focus: Option<u32>) -> FocusedArrows<'_> {
        let geometry = self.arrow_geometry(viewport);
        let anchors = self.arrow_anchors(viewport);
        self.arrows.layout_anchored(&self.frames, focus, &geometry, anchors)
    }

    pub fn pointer_down(&mut self, x: f64, viewport: &Viewport) -> Option<usize> {
        let layout = self.track_strip(viewport);
        let container = layout.container();
        self.cursor
            .pointer_down(layout.hit_test(x), x - container.x, container.w)
    }

    pub fn pointer_move(&mut self, x: f64, viewport: &Viewport) -> Option<usize> {
        if !self.cursor.is_dragging() {
            return None;
        }
        let layout = self.track_strip(viewport);
        let container = layout.container();
        self.cursor
            .pointer_move(layout.hit_test(x), x - container.x, container.w)
    }

    pub fn pointer_up(&mut self) -> Option<usize> {
        self.cursor.pointer_up(&mut self.selection)
    }

    pub fn step(&mut self, direction: Direction) -> Option<usize> {
        self.cursor.sync_from(&self.selection);
        self.cursor.step(direction, &mut self.selection)
    }

    pub fn select(&mut self, position: usize) -> Option<usize> {
        self.cursor.select(position, &mut self.selection)
    }

    /// Render one surface for the current selection.
    pub fn render(&mut self, surface: SurfaceKind, viewport: &Viewport) -> Vec<RenderCommand> {
        self.cursor.sync_from(&self.selection);
        let current = self.current_position();
        let current_frame = self.current_frame().map(|f| f.frame_index);

        match surface {
            SurfaceKind::Timeline => {
                let layout = self.track_strip(viewport);
                let cursor_x = self.cursor.cursor_x(&layout);
                let mut commands =
                    timeline::render_timeline(&self.frames, &self.analysis, &layout, current, cursor_x);
                commands.extend(overlay::render_arrow_overlay(self.arrows(viewport)));
                commands
            }
            SurfaceKind::Minimap => {
                let visible = self.visible_range.clone().unwrap_or(0..self.frames.len());
                minimap::render_minimap(&self.frames, &self.analysis, viewport, visible, current)
            }
            SurfaceKind::Pyramid => pyramid::render_pyramid(&self.analysis, viewport, current_frame),
            SurfaceKind::Filmstrip => {
                filmstrip::render_filmstrip(&self.frames, &self.analysis, viewport, current)
            }
        }
    }

    /// How many times the temporal analysis has been computed.
    pub fn analysis_computations(&self) -> usize {
        self.analysis_computations
    }

    /// How many times arrow geometry has been computed.
    pub fn arrow_computations(&self) -> usize {
        self.arrows.computations()
    }

    fn track_strip(&mut self, viewport: &Viewport) -> StripLayout {
        if self.strip_viewport.as_ref() != Some(viewport) {
            self.strip_viewport = Some(*viewport);
            self.cursor.notify_elements_changed();
        }
        self.strip_layout(viewport)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gopview_protocol::FrameType;

    fn frames() -> Vec<Frame> {
        vec![
            Frame::new(0, FrameType::Intra),
            Frame::new(1, FrameType::Bidirectional)
                .with_temporal_id(2)
                .with_refs([0, 2]),
            Frame::new(2, FrameType::Inter)
                .with_temporal_id(1)
                .with_refs([0]),
            Frame::new(3, FrameType::Intra),
        ]
    }

    fn visible_paths(commands: &[RenderCommand]) -> Vec<Option<u32>> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawPath {
                    source_frame,
                    visible: true,
                    ..
                } => Some(*source_frame),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn navigation_does_not_recompute_geometry() {
        let mut session = Session::from_frames(frames());
        let vp = Viewport::sized(400.0, 80.0);

        for _ in 0..3 {
            session.step(Direction::Next);
            session.render(SurfaceKind::Timeline, &vp);
            session.render(SurfaceKind::Pyramid, &vp);
        }
        assert_eq!(session.analysis_computations(), 1);
        assert_eq!(session.arrow_computations(), 1);

        session.render(SurfaceKind::Timeline, &Viewport::sized(600.0, 80.0));
        assert_eq!(session.arrow_computations(), 2);
        assert_eq!(session.analysis_computations(), 1);
    }

    #[test]
    fn timeline_shows_arrows_of_current_frame_only() {
        let mut session = Session::from_frames(frames());
        let vp = Viewport::sized(400.0, 80.0);

        session.select(1);
        let cmds = session.render(SurfaceKind::Timeline, &vp);
        assert_eq!(visible_paths(&cmds), vec![Some(1), Some(1)]);

        session.select(2);
        let cmds = session.render(SurfaceKind::Timeline, &vp);
        assert_eq!(visible_paths(&cmds), vec![Some(2)]);

        let total_paths = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawPath { .. }))
            .count();
        assert_eq!(total_paths, 3);
    }

    #[test]
    fn every_surface_marks_one_current_element() {
        let mut session = Session::from_frames(frames());
        session.select(2);
        let vp = Viewport::sized(400.0, 80.0);
        for surface in SurfaceKind::ALL {
            let cmds = session.render(surface, &vp);
            let current = cmds
                .iter()
                .filter(|c| matches!(c, RenderCommand::DrawRect { current: true, .. }))
                .count();
            assert_eq!(current, 1, "{surface}");
        }
    }

    #[test]
    fn stale_selection_after_truncation_degrades() {
        let mut session = Session::from_frames(frames());
        session.select(3);
        session.replace_frames(frames()[..2].to_vec().into());

        assert_eq!(session.current_position(), None);
        let vp = Viewport::sized(400.0, 80.0);
        for surface in SurfaceKind::ALL {
            let cmds = session.render(surface, &vp);
            assert!(
                !cmds
                    .iter()
                    .any(|c| matches!(c, RenderCommand::DrawRect { current: true, .. })),
                "{surface}"
            );
        }
        // Cursor line sits at the strip origin.
        let cmds = session.render(SurfaceKind::Timeline, &vp);
        let cursor_x = cmds.iter().find_map(|c| match c {
            RenderCommand::DrawLine {
                from,
                color: gopview_protocol::ThemeToken::Cursor,
                ..
            } => Some(from.x),
            _ => None,
        });
        assert_eq!(cursor_x, Some(0.0));

        // Stepping recovers into range.
        assert_eq!(session.step(Direction::Previous), Some(0));
    }

    #[test]
    fn pointer_drag_commits_on_release() {
        let mut session = Session::from_frames(frames());
        let vp = Viewport::sized(400.0, 80.0);

        assert_eq!(session.pointer_down(10.0, &vp), Some(0));
        assert_eq!(session.pointer_move(120.0, &vp), Some(1));
        assert_eq!(session.pointer_move(130.0, &vp), None);
        assert_eq!(session.pointer_move(390.0, &vp), Some(3));
        assert_eq!(session.selection().current(), None);
        assert_eq!(session.pointer_up(), Some(3));
        assert_eq!(session.selection().current(), Some(3));
        assert_eq!(session.pointer_move(10.0, &vp), None);
    }

    #[test]
    fn same_snapshot_is_not_reanalyzed() {
        let frames: Arc<[Frame]> = frames().into();
        let mut session = Session::new();
        session.replace_frames(Arc::clone(&frames));
        session.replace_frames(Arc::clone(&frames));
        assert_eq!(session.analysis_computations(), 1);
        assert_eq!(session.analysis().gop_boundaries, vec![0, 3]);
        assert_eq!(session.references().outgoing_total, 3);
    }

    #[test]
    fn empty_session_renders_nothing() {
        let mut session = Session::new();
        let vp = Viewport::sized(400.0, 80.0);
        for surface in SurfaceKind::ALL {
            assert!(session.render(surface, &vp).is_empty(), "{surface}");
        }
        assert_eq!(session.step(Direction::Next), None);
    }
}
