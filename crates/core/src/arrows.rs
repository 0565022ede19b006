//! Reference arrow layout: one directed edge per reference, packed into
//! non-overlapping slots so stacked arrows stay distinguishable.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use gopview_protocol::{Frame, ThemeToken};
use serde::{Deserialize, Serialize};

/// Narrowest frame pitch `for_viewport` will produce.
pub const MIN_FRAME_PITCH: f64 = 12.0;

/// Geometry parameters for the arrow overlay, in logical pixels.
///
/// Arrows hang below an anchor line at `anchor_y`. Without [`FrameAnchors`],
/// frame `i` anchors at `i * frame_pitch + frame_pitch / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrowGeometry {
    pub frame_pitch: f64,
    pub anchor_y: f64,
    /// Arc depth of slot 0.
    pub base_arc: f64,
    /// Extra arc depth per slot.
    pub slot_spacing: f64,
    pub label_gap: f64,
    /// Estimated glyph width used to size labels.
    pub label_char_width: f64,
    pub margin: f64,
}

impl Default for ArrowGeometry {
    fn default() -> Self {
        Self {
            frame_pitch: 24.0,
            anchor_y: 4.0,
            base_arc: 16.0,
            slot_spacing: 10.0,
            label_gap: 10.0,
            label_char_width: 6.0,
            margin: 8.0,
        }
    }
}

impl ArrowGeometry {
    /// Default geometry with the pitch stretched to fill `width`.
    pub fn for_viewport(width: f64, frame_count: usize) -> Self {
        let mut geometry = Self::default();
        if frame_count > 0 && width > 0.0 {
            geometry.frame_pitch = (width / frame_count as f64).max(MIN_FRAME_PITCH);
        }
        geometry
    }

    pub fn anchor_x(&self, frame_index: u32) -> f64 {
        frame_index as f64 * self.frame_pitch + self.frame_pitch / 2.0
    }

    /// Arc depth for a slot; strictly increasing in `slot`.
    pub fn arc_depth(&self, slot: usize) -> f64 {
        self.base_arc + slot as f64 * self.slot_spacing.max(1.0)
    }
}

/// Horizontal anchor of each frame, keyed by frame index, usually the cell
/// centers of a laid-out strip.
///
/// Indices without an entry (dangling targets) are extrapolated from the
/// nearest known frame by `frame_pitch` per index. An empty map falls back to
/// [`ArrowGeometry::anchor_x`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameAnchors {
    centers: BTreeMap<u32, f64>,
}

impl FrameAnchors {
    /// The first center given for an index wins.
    pub fn from_centers(centers: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let mut map = BTreeMap::new();
        for (frame_index, x) in centers {
            map.entry(frame_index).or_insert(x);
        }
        Self { centers: map }
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn x(&self, frame_index: u32, geometry: &ArrowGeometry) -> f64 {
        if let Some(&x) = self.centers.get(&frame_index) {
            return x;
        }
        let below = self.centers.range(..frame_index).next_back();
        let above = self.centers.range(frame_index..).next();
        match (below, above) {
            (Some((&known, &x)), _) => x + f64::from(frame_index - known) * geometry.frame_pitch,
            (None, Some((&known, &x))) => x - f64::from(known - frame_index) * geometry.frame_pitch,
            (None, None) => geometry.anchor_x(frame_index),
        }
    }
}

/// One renderable reference edge: `source` references `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowDescriptor {
    pub source_frame_index: u32,
    pub target_frame_index: u32,
    pub slot_index: usize,
    /// Reference list and position, e.g. `L0[0]`.
    pub label: String,
    pub color: ThemeToken,
    /// SVG path syntax.
    pub path_data: String,
    pub source_x: f64,
    pub source_y: f64,
    pub label_x: f64,
    pub label_y: f64,
    /// False when the target is not part of the frame list; the arrow then
    /// points at the target's nominal position.
    pub target_resolved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowLayoutResult {
    pub all_arrow_data: Vec<ArrowDescriptor>,
    /// Minimum overlay width that clips nothing; 0 when there are no arrows.
    pub svg_width: f64,
    pub svg_height: f64,
    pub slot_count: usize,
}

impl ArrowLayoutResult {
    /// Whether an overlay should exist at all. An empty layout means "no
    /// overlay element", not an empty one.
    pub fn is_renderable(&self) -> bool {
        !self.all_arrow_data.is_empty() && self.svg_width > 0.0
    }
}

/// Assign each inclusive span `(start, end)` to a slot such that spans
/// sharing any point never share a slot.
///
/// Greedy interval partitioning: spans are visited by start, then end, and
/// each goes to the lowest slot whose last span ended strictly before it
/// starts. Returned slots are in input order.
pub fn assign_slots(spans: &[(u32, u32)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by_key(|&i| spans[i]);

    let mut slot_ends: Vec<u32> = Vec::new();
    let mut slots = vec![0; spans.len()];
    for i in order {
        let (start, end) = spans[i];
        slots[i] = match slot_ends.iter().position(|&last_end| last_end < start) {
            Some(slot) => {
                slot_ends[slot] = end;
                slot
            }
            None => {
                slot_ends.push(end);
                slot_ends.len() - 1
            }
        };
    }
    slots
}

struct Edge {
    source: u32,
    target: u32,
    label: String,
}

fn collect_edges(frames: &[Frame]) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(frames.iter().map(|f| f.ref_frames.len()).sum());
    for frame in frames {
        let (mut past, mut future) = (0usize, 0usize);
        for &target in &frame.ref_frames {
            let label = if target <= frame.frame_index {
                past += 1;
                format!("L0[{}]", past - 1)
            } else {
                future += 1;
                format!("L1[{}]", future - 1)
            };
            edges.push(Edge {
                source: frame.frame_index,
                target,
                label,
            });
        }
    }
    edges
}

/// Lay out every reference of `frames` as an arrow, anchored at the nominal
/// frame-index positions of `geometry`.
pub fn compute_layout(frames: &[Frame], geometry: &ArrowGeometry) -> ArrowLayoutResult {
    compute_layout_anchored(frames, geometry, &FrameAnchors::default())
}

/// Lay out every reference of `frames` as an arrow between `anchors`.
///
/// Dangling references still produce an arrow so the arrow count always
/// equals the total reference count.
#[tracing::instrument(skip(frames, geometry, anchors), fields(frames = frames.len()))]
pub fn compute_layout_anchored(
    frames: &[Frame],
    geometry: &ArrowGeometry,
    anchors: &FrameAnchors,
) -> ArrowLayoutResult {
    let edges = collect_edges(frames);
    if edges.is_empty() {
        return ArrowLayoutResult::default();
    }

    let levels: HashMap<u32, u32> = frames.iter().map(|f| (f.frame_index, f.level())).collect();
    let spans: Vec<(u32, u32)> = edges
        .iter()
        .map(|e| (e.source.min(e.target), e.source.max(e.target)))
        .collect();
    let slots = assign_slots(&spans);

    let mut max_x: f64 = 0.0;
    let mut max_y: f64 = 0.0;
    let mut dangling = 0usize;
    let mut all_arrow_data = Vec::with_capacity(edges.len());

    for (edge, &slot) in edges.into_iter().zip(&slots) {
        let ay = geometry.anchor_y;
        let sx = anchors.x(edge.source, geometry);
        let tx = anchors.x(edge.target, geometry);
        let depth = geometry.arc_depth(slot);
        let cy = ay + depth;
        let path_data = format!("M {sx:.1},{ay:.1} C {sx:.1},{cy:.1} {tx:.1},{cy:.1} {tx:.1},{ay:.1}");

        // A cubic with both control points at `cy` peaks at 3/4 of the depth.
        // Labels never start left of x = 0.
        let label_half_width = edge.label.chars().count() as f64 * geometry.label_char_width / 2.0;
        let label_x = ((sx + tx) / 2.0).max(label_half_width);
        let label_y = ay + depth * 0.75 + geometry.label_gap;

        max_x = max_x.max(sx).max(tx).max(label_x + label_half_width);
        max_y = max_y.max(label_y);

        let target_level = levels.get(&edge.target).copied();
        if target_level.is_none() {
            dangling += 1;
        }

        all_arrow_data.push(ArrowDescriptor {
            source_frame_index: edge.source,
            target_frame_index: edge.target,
            slot_index: slot,
            label: edge.label,
            color: target_level.map_or(ThemeToken::ArrowDangling, ThemeToken::for_level),
            path_data,
            source_x: sx,
            source_y: ay,
            label_x,
            label_y,
            target_resolved: target_level.is_some(),
        });
    }

    let slot_count = slots.iter().max().map_or(0, |&s| s + 1);
    tracing::debug!(
        arrows = all_arrow_data.len(),
        slots = slot_count,
        dangling,
        "arrow layout computed"
    );

    ArrowLayoutResult {
        all_arrow_data,
        svg_width: max_x + geometry.margin,
        svg_height: max_y + geometry.margin,
        slot_count,
    }
}

/// A cached layout viewed from one focus frame. Only arrows leaving the
/// focus frame are visible; the others exist but are hidden.
#[derive(Debug, Clone, Copy)]
pub struct FocusedArrows<'a> {
    pub result: &'a ArrowLayoutResult,
    pub focus: Option<u32>,
}

impl<'a> FocusedArrows<'a> {
    pub fn is_visible(&self, arrow: &ArrowDescriptor) -> bool {
        self.focus == Some(arrow.source_frame_index)
    }

    pub fn visible(self) -> impl Iterator<Item = &'a ArrowDescriptor> {
        self.result
            .all_arrow_data
            .iter()
            .filter(move |a| self.is_visible(a))
    }

    /// One flag per arrow, in layout order.
    pub fn visibility(&self) -> Vec<bool> {
        self.result
            .all_arrow_data
            .iter()
            .map(|a| self.is_visible(a))
            .collect()
    }
}

#[derive(Debug)]
struct CacheEntry {
    frames: Arc<[Frame]>,
    geometry: ArrowGeometry,
    anchors: FrameAnchors,
    result: ArrowLayoutResult,
}

/// Single-entry memo for [`compute_layout_anchored`], keyed by frame-list
/// identity, geometry and anchors. The focus frame is not part of the key.
#[derive(Debug, Default)]
pub struct ArrowLayoutCache {
    entry: Option<CacheEntry>,
    computations: usize,
}

impl ArrowLayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(
        &mut self,
        frames: &Arc<[Frame]>,
        focus: Option<u32>,
        geometry: &ArrowGeometry,
    ) -> FocusedArrows<'_> {
        self.layout_anchored(frames, focus, geometry, FrameAnchors::default())
    }

    pub fn layout_anchored(
        &mut self,
        frames: &Arc<[Frame]>,
        focus: Option<u32>,
        geometry: &ArrowGeometry,
        anchors: FrameAnchors,
    ) -> FocusedArrows<'_> {
        let entry = match self.entry.take() {
            Some(entry)
                if Arc::ptr_eq(&entry.frames, frames)
                    && entry.geometry == *geometry
                    && entry.anchors == anchors =>
            {
                tracing::trace!("arrow layout cache hit");
                entry
            }
            _ => {
                tracing::debug!(frames = frames.len(), "arrow layout cache miss");
                self.computations += 1;
                let result = compute_layout_anchored(frames, geometry, &anchors);
                CacheEntry {
                    frames: Arc::clone(frames),
                    geometry: *geometry,
                    anchors,
                    result,
                }
            }
        };
        let entry = self.entry.insert(entry);
        FocusedArrows {
            result: &entry.result,
            focus,
        }
    }

    /// Number of times geometry has actually been computed.
    pub fn computations(&self) -> usize {
        self.computations
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gopview_protocol::FrameType;

    fn scenario() -> Vec<Frame> {
        vec![
            Frame::new(0, FrameType::Intra),
            Frame::new(1, FrameType::Bidirectional)
                .with_temporal_id(2)
                .with_refs([0, 8]),
            Frame::new(2, FrameType::Bidirectional)
                .with_temporal_id(1)
                .with_refs([0, 4]),
            Frame::new(8, FrameType::Intra),
        ]
    }

    fn overlaps(a: (u32, u32), b: (u32, u32)) -> bool {
        a.0 <= b.1 && b.0 <= a.1
    }

    #[test]
    fn empty_input_has_no_overlay() {
        let result = compute_layout(&[], &ArrowGeometry::default());
        assert!(result.all_arrow_data.is_empty());
        assert_eq!(result.svg_width, 0.0);
        assert!(!result.is_renderable());

        let unreferenced = vec![Frame::new(0, FrameType::Intra)];
        let result = compute_layout(&unreferenced, &ArrowGeometry::default());
        assert!(result.all_arrow_data.is_empty());
        assert_eq!(result.svg_width, 0.0);
    }

    #[test]
    fn one_arrow_per_reference() {
        let frames = scenario();
        let result = compute_layout(&frames, &ArrowGeometry::default());
        assert_eq!(result.all_arrow_data.len(), 4);

        let from_one: Vec<u32> = result
            .all_arrow_data
            .iter()
            .filter(|a| a.source_frame_index == 1)
            .map(|a| a.target_frame_index)
            .collect();
        assert_eq!(from_one, vec![0, 8]);
    }

    #[test]
    fn focus_frame_arrows_get_distinct_slots() {
        let frames = scenario();
        let result = compute_layout(&frames, &ArrowGeometry::default());
        let slots: Vec<usize> = result
            .all_arrow_data
            .iter()
            .filter(|a| a.source_frame_index == 1)
            .map(|a| a.slot_index)
            .collect();
        assert_eq!(slots.len(), 2);
        assert_ne!(slots[0], slots[1]);
    }

    #[test]
    fn spanning_edge_gets_its_own_slot() {
        // [0,1] and [1,8] touch at 1; a third edge spans [0,8].
        let slots = assign_slots(&[(0, 1), (1, 8), (0, 8)]);
        assert_ne!(slots[0], slots[1]);
        assert_ne!(slots[2], slots[0]);
        assert_ne!(slots[2], slots[1]);
    }

    #[test]
    fn disjoint_spans_reuse_slot_zero() {
        let slots = assign_slots(&[(0, 2), (3, 5), (6, 9)]);
        assert_eq!(slots, vec![0, 0, 0]);
    }

    #[test]
    fn overlapping_spans_never_share_a_slot() {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move |bound: u32| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) % bound as u64) as u32
        };
        for _ in 0..50 {
            let spans: Vec<(u32, u32)> = (0..30)
                .map(|_| {
                    let a = next(64);
                    let b = next(64);
                    (a.min(b), a.max(b))
                })
                .collect();
            let slots = assign_slots(&spans);
            for i in 0..spans.len() {
                for j in (i + 1)..spans.len() {
                    if overlaps(spans[i], spans[j]) {
                        assert_ne!(slots[i], slots[j], "{:?} vs {:?}", spans[i], spans[j]);
                    }
                }
            }
        }
    }

    #[test]
    fn dangling_reference_is_counted_and_degraded() {
        let frames = vec![
            Frame::new(0, FrameType::Intra),
            Frame::new(1, FrameType::Inter).with_refs([0, 99]),
        ];
        let result = compute_layout(&frames, &ArrowGeometry::default());
        assert_eq!(result.all_arrow_data.len(), 2);

        let dangling = &result.all_arrow_data[1];
        assert_eq!(dangling.target_frame_index, 99);
        assert!(!dangling.target_resolved);
        assert_eq!(dangling.color, ThemeToken::ArrowDangling);
        assert!(result.all_arrow_data[0].target_resolved);

        // Width still covers the nominal position of frame 99.
        let geometry = ArrowGeometry::default();
        assert!(result.svg_width >= geometry.anchor_x(99));
    }

    #[test]
    fn labels_name_list_and_position() {
        let frames = vec![Frame::new(4, FrameType::Bidirectional).with_refs([0, 2, 8, 6])];
        let result = compute_layout(&frames, &ArrowGeometry::default());
        let labels: Vec<&str> = result.all_arrow_data.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["L0[0]", "L0[1]", "L1[0]", "L1[1]"]);
    }

    #[test]
    fn higher_slots_arc_further() {
        let geometry = ArrowGeometry::default();
        assert!(geometry.arc_depth(1) > geometry.arc_depth(0));
        assert!(geometry.arc_depth(5) > geometry.arc_depth(4));

        let frames = scenario();
        let result = compute_layout(&frames, &geometry);
        for a in &result.all_arrow_data {
            for b in &result.all_arrow_data {
                if a.slot_index > b.slot_index {
                    assert!(a.label_y > b.label_y);
                }
            }
        }
    }

    #[test]
    fn width_covers_every_anchor() {
        let geometry = ArrowGeometry::default();
        let frames = scenario();
        let result = compute_layout(&frames, &geometry);
        assert!(result.svg_width > geometry.anchor_x(8));
        assert!(result.svg_height > geometry.anchor_y);
        assert!(result.is_renderable());
        assert!(result.all_arrow_data[0].path_data.starts_with("M "));
    }

    #[test]
    fn cache_skips_recompute_on_focus_change() {
        let frames: Arc<[Frame]> = scenario().into();
        let geometry = ArrowGeometry::default();
        let mut cache = ArrowLayoutCache::new();

        let first = cache.layout(&frames, Some(1), &geometry).result.clone();
        assert_eq!(cache.computations(), 1);

        let visible_two = cache.layout(&frames, Some(2), &geometry).visible().count();
        assert_eq!(visible_two, 2);
        assert_eq!(cache.computations(), 1);

        let again = cache.layout(&frames, None, &geometry);
        assert_eq!(*again.result, first);
        assert_eq!(again.visible().count(), 0);
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn cache_recomputes_on_new_identity_or_geometry() {
        let frames: Arc<[Frame]> = scenario().into();
        let same_content: Arc<[Frame]> = scenario().into();
        let mut cache = ArrowLayoutCache::new();
        let geometry = ArrowGeometry::default();

        cache.layout(&frames, None, &geometry);
        cache.layout(&same_content, None, &geometry);
        assert_eq!(cache.computations(), 2);

        let wider = ArrowGeometry::for_viewport(2000.0, same_content.len());
        cache.layout(&same_content, None, &wider);
        assert_eq!(cache.computations(), 3);

        cache.invalidate();
        cache.layout(&same_content, None, &wider);
        assert_eq!(cache.computations(), 4);
    }

    #[test]
    fn cache_recomputes_when_anchors_move() {
        let frames: Arc<[Frame]> = scenario().into();
        let geometry = ArrowGeometry::default();
        let mut cache = ArrowLayoutCache::new();
        let at = |offset: f64| {
            FrameAnchors::from_centers(frames.iter().enumerate().map(|(i, f)| {
                (f.frame_index, offset + i as f64 * 40.0)
            }))
        };

        cache.layout_anchored(&frames, Some(1), &geometry, at(0.0));
        cache.layout_anchored(&frames, Some(2), &geometry, at(0.0));
        assert_eq!(cache.computations(), 1);

        let shifted = cache.layout_anchored(&frames, None, &geometry, at(100.0));
        assert_eq!(shifted.result.all_arrow_data[0].source_x, 140.0);
        assert_eq!(cache.computations(), 2);
    }

    #[test]
    fn anchors_place_arrows_at_given_centers() {
        // Sparse indices: frame 8 sits in the fourth cell, not at 8 * pitch.
        let frames = scenario();
        let geometry = ArrowGeometry::default();
        let anchors = FrameAnchors::from_centers([(0, 50.0), (1, 150.0), (2, 250.0), (8, 350.0)]);
        let result = compute_layout_anchored(&frames, &geometry, &anchors);

        let to_eight = result
            .all_arrow_data
            .iter()
            .find(|a| a.source_frame_index == 1 && a.target_frame_index == 8)
            .map(|a| a.path_data.clone())
            .unwrap_or_default();
        assert!(to_eight.starts_with("M 150.0,"));
        assert!(to_eight.ends_with(&format!("350.0,{:.1}", geometry.anchor_y)));
        assert!(result.svg_width < 350.0 + 100.0);
    }

    #[test]
    fn unknown_indices_extrapolate_from_nearest_anchor() {
        let geometry = ArrowGeometry::default();
        let anchors = FrameAnchors::from_centers([(5, 200.0), (6, 260.0)]);
        assert_eq!(anchors.x(6, &geometry), 260.0);
        assert_eq!(anchors.x(9, &geometry), 260.0 + 3.0 * geometry.frame_pitch);
        assert_eq!(anchors.x(2, &geometry), 200.0 - 3.0 * geometry.frame_pitch);
        assert_eq!(FrameAnchors::default().x(3, &geometry), geometry.anchor_x(3));

        let frames = vec![
            Frame::new(5, FrameType::Intra),
            Frame::new(6, FrameType::Inter).with_refs([5, 99]),
        ];
        let result = compute_layout_anchored(&frames, &geometry, &anchors);
        assert!(!result.all_arrow_data[1].target_resolved);
        assert!(result.svg_width >= anchors.x(99, &geometry));
    }

    #[test]
    fn first_center_wins_for_repeated_index() {
        let geometry = ArrowGeometry::default();
        let anchors = FrameAnchors::from_centers([(3, 10.0), (3, 90.0)]);
        assert_eq!(anchors.x(3, &geometry), 10.0);
        assert!(!anchors.is_empty());
    }

    #[test]
    fn labels_never_start_left_of_origin() {
        let geometry = ArrowGeometry {
            frame_pitch: 12.0,
            ..ArrowGeometry::default()
        };
        let frames = vec![
            Frame::new(0, FrameType::Intra),
            Frame::new(1, FrameType::Inter).with_refs([0]),
        ];
        let result = compute_layout(&frames, &geometry);
        let arrow = &result.all_arrow_data[0];
        let half_width = arrow.label.chars().count() as f64 * geometry.label_char_width / 2.0;
        assert!(arrow.label_x - half_width >= 0.0);
        assert!(result.svg_width >= arrow.label_x + half_width);
    }

    #[test]
    fn visibility_does_not_touch_geometry() {
        let frames: Arc<[Frame]> = scenario().into();
        let geometry = ArrowGeometry::default();
        let mut cache = ArrowLayoutCache::new();

        let snapshot = cache.layout(&frames, Some(1), &geometry).result.clone();
        for focus in [None, Some(0), Some(1), Some(2), Some(8), Some(42)] {
            let focused = cache.layout(&frames, focus, &geometry);
            assert_eq!(*focused.result, snapshot);
            let flags = focused.visibility();
            assert_eq!(flags.len(), snapshot.all_arrow_data.len());
            for (arrow, shown) in snapshot.all_arrow_data.iter().zip(flags) {
                assert_eq!(shown, focus == Some(arrow.source_frame_index));
            }
        }
    }

    #[test]
    fn viewport_pitch_has_a_floor() {
        assert_eq!(ArrowGeometry::for_viewport(100.0, 100).frame_pitch, MIN_FRAME_PITCH);
        assert_eq!(ArrowGeometry::for_viewport(800.0, 10).frame_pitch, 80.0);
        assert_eq!(
            ArrowGeometry::for_viewport(800.0, 0).frame_pitch,
            ArrowGeometry::default().frame_pitch
        );
    }
}
