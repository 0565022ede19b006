//! Temporal pyramid classification and GOP boundary detection.

use std::collections::BTreeMap;

use gopview_protocol::Frame;
use serde::{Deserialize, Serialize};

/// A frame as it appears inside one pyramid level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelFrame {
    pub frame_index: u32,
    pub is_keyframe: bool,
    pub ref_frames: Vec<u32>,
}

/// All frames sharing one temporal level, ascending by frame index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalLevel {
    pub level: u32,
    pub frames: Vec<LevelFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelEntry {
    pub level: u32,
    pub is_keyframe: bool,
    pub ref_frames: Vec<u32>,
}

/// A group of pictures: `[start, end)` in frame-index space. The last GOP of
/// a sequence is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GopSpan {
    pub start: u32,
    pub end: Option<u32>,
}

impl GopSpan {
    pub fn contains(&self, frame_index: u32) -> bool {
        frame_index >= self.start && self.end.is_none_or(|end| frame_index < end)
    }
}

/// Result of [`analyze`]. Never patched; a new frame list gets a new analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalLevelAnalysis {
    /// Highest temporal layer first, base layer last.
    pub levels: Vec<TemporalLevel>,
    pub frame_map: BTreeMap<u32, LevelEntry>,
    /// Strictly ascending. Starts at the first frame whenever there is one.
    pub gop_boundaries: Vec<u32>,
    /// Filled in by renderers that lay frames out; empty after analysis.
    pub frame_positions: BTreeMap<u32, f64>,
}

impl TemporalLevelAnalysis {
    pub fn is_empty(&self) -> bool {
        self.frame_map.is_empty()
    }

    pub fn level_of(&self, frame_index: u32) -> Option<u32> {
        self.frame_map.get(&frame_index).map(|e| e.level)
    }

    pub fn max_level(&self) -> Option<u32> {
        self.levels.first().map(|l| l.level)
    }

    pub fn is_boundary(&self, frame_index: u32) -> bool {
        self.gop_boundaries.binary_search(&frame_index).is_ok()
    }

    /// The GOP enclosing `frame_index`, or `None` if it precedes the first
    /// boundary (or the analysis is empty).
    pub fn gop_of(&self, frame_index: u32) -> Option<GopSpan> {
        let pos = match self.gop_boundaries.binary_search(&frame_index) {
            Ok(pos) => pos,
            Err(0) => return None,
            Err(pos) => pos - 1,
        };
        Some(GopSpan {
            start: self.gop_boundaries[pos],
            end: self.gop_boundaries.get(pos + 1).copied(),
        })
    }

    /// Every GOP in order.
    pub fn gops(&self) -> Vec<GopSpan> {
        self.gop_boundaries
            .iter()
            .enumerate()
            .map(|(i, &start)| GopSpan {
                start,
                end: self.gop_boundaries.get(i + 1).copied(),
            })
            .collect()
    }
}

/// Classify frames into temporal levels and find GOP boundaries.
///
/// Missing fields are defaulted (no temporal id is the base layer, no
/// references is an empty list), so this never fails. Input order does not
/// matter: every level is sorted by frame index.
#[tracing::instrument(skip(frames), fields(frames = frames.len()))]
pub fn analyze(frames: &[Frame]) -> TemporalLevelAnalysis {
    let Some(first_index) = frames.iter().map(|f| f.frame_index).min() else {
        return TemporalLevelAnalysis::default();
    };

    let mut frame_map = BTreeMap::new();
    let mut buckets: BTreeMap<u32, Vec<LevelFrame>> = BTreeMap::new();
    let mut gop_boundaries = vec![first_index];

    for frame in frames {
        let level = frame.level();
        let is_keyframe = frame.is_keyframe();

        frame_map.insert(
            frame.frame_index,
            LevelEntry {
                level,
                is_keyframe,
                ref_frames: frame.ref_frames.clone(),
            },
        );
        buckets.entry(level).or_default().push(LevelFrame {
            frame_index: frame.frame_index,
            is_keyframe,
            ref_frames: frame.ref_frames.clone(),
        });
        if is_keyframe {
            gop_boundaries.push(frame.frame_index);
        }
    }

    gop_boundaries.sort_unstable();
    gop_boundaries.dedup();

    // Stable sort: equal indices keep input order.
    let levels: Vec<TemporalLevel> = buckets
        .into_iter()
        .rev()
        .map(|(level, mut frames)| {
            frames.sort_by_key(|f| f.frame_index);
            TemporalLevel { level, frames }
        })
        .collect();

    tracing::debug!(
        levels = levels.len(),
        gops = gop_boundaries.len(),
        "temporal analysis complete"
    );

    TemporalLevelAnalysis {
        levels,
        frame_map,
        gop_boundaries,
        frame_positions: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gopview_protocol::FrameType;

    fn scenario() -> Vec<Frame> {
        vec![
            Frame::new(0, FrameType::Intra).with_temporal_id(0),
            Frame::new(1, FrameType::Bidirectional)
                .with_temporal_id(2)
                .with_refs([0, 8]),
            Frame::new(2, FrameType::Bidirectional)
                .with_temporal_id(1)
                .with_refs([0, 4]),
            Frame::new(8, FrameType::Intra).with_temporal_id(0),
        ]
    }

    #[test]
    fn empty_input_yields_empty_analysis() {
        let analysis = analyze(&[]);
        assert!(analysis.levels.is_empty());
        assert!(analysis.gop_boundaries.is_empty());
        assert!(analysis.frame_map.is_empty());
        assert!(analysis.frame_positions.is_empty());
        assert_eq!(analysis.gop_of(0), None);
        assert_eq!(analysis.max_level(), None);
    }

    #[test]
    fn pyramid_scenario() {
        let analysis = analyze(&scenario());
        let order: Vec<u32> = analysis.levels.iter().map(|l| l.level).collect();
        assert_eq!(order, vec![2, 1, 0]);
        assert_eq!(analysis.gop_boundaries, vec![0, 8]);
        assert_eq!(analysis.frame_map.len(), 4);

        let base: Vec<u32> = analysis.levels[2].frames.iter().map(|f| f.frame_index).collect();
        assert_eq!(base, vec![0, 8]);
        assert!(analysis.levels[2].frames.iter().all(|f| f.is_keyframe));
        assert_eq!(analysis.level_of(1), Some(2));
        assert_eq!(analysis.level_of(5), None);
        assert!(analysis.frame_positions.is_empty());
    }

    #[test]
    fn missing_temporal_id_lands_in_base_layer() {
        let frames = vec![
            Frame::new(0, FrameType::Inter),
            Frame::new(1, FrameType::Inter).with_temporal_id(0),
            Frame::new(2, FrameType::Inter).with_temporal_id(1),
        ];
        let analysis = analyze(&frames);
        assert_eq!(analysis.levels.len(), 2);
        assert_eq!(analysis.levels[1].level, 0);
        assert_eq!(analysis.levels[1].frames.len(), 2);
    }

    #[test]
    fn first_frame_starts_a_gop_even_when_not_intra() {
        let frames = vec![
            Frame::new(0, FrameType::Inter),
            Frame::new(1, FrameType::Inter).with_refs([0]),
        ];
        let analysis = analyze(&frames);
        assert_eq!(analysis.gop_boundaries, vec![0]);
        assert_eq!(
            analysis.gop_of(1),
            Some(GopSpan {
                start: 0,
                end: None
            })
        );
        assert!(!analysis.frame_map[&0].is_keyframe);
    }

    #[test]
    fn out_of_order_input_is_sorted_within_levels() {
        let frames = vec![
            Frame::new(4, FrameType::Inter),
            Frame::new(2, FrameType::Inter),
            Frame::new(3, FrameType::Intra),
        ];
        let analysis = analyze(&frames);
        let base: Vec<u32> = analysis.levels[0].frames.iter().map(|f| f.frame_index).collect();
        assert_eq!(base, vec![2, 3, 4]);
        assert_eq!(analysis.gop_boundaries, vec![2, 3]);
    }

    #[test]
    fn explicit_keyframe_flag_marks_boundary() {
        let mut flagged = Frame::new(5, FrameType::Unknown);
        flagged.key_frame = Some(true);
        let frames = vec![Frame::new(0, FrameType::Intra), flagged];
        assert_eq!(analyze(&frames).gop_boundaries, vec![0, 5]);
    }

    #[test]
    fn single_unreferenced_frame() {
        let analysis = analyze(&[Frame::new(0, FrameType::Inter)]);
        assert_eq!(analysis.levels.len(), 1);
        assert_eq!(analysis.levels[0].frames.len(), 1);
        assert!(analysis.levels[0].frames[0].ref_frames.is_empty());
        assert_eq!(analysis.gop_boundaries, vec![0]);
    }

    #[test]
    fn gop_queries() {
        let analysis = analyze(&scenario());
        assert_eq!(
            analysis.gop_of(2),
            Some(GopSpan {
                start: 0,
                end: Some(8)
            })
        );
        assert_eq!(analysis.gop_of(8).map(|g| g.start), Some(8));
        assert_eq!(analysis.gops().len(), 2);
        assert!(analysis.gops()[0].contains(7));
        assert!(!analysis.gops()[0].contains(8));
        assert!(analysis.is_boundary(8));
        assert!(!analysis.is_boundary(2));
    }

    #[test]
    fn analysis_is_idempotent() {
        let frames = scenario();
        assert_eq!(analyze(&frames), analyze(&frames));
    }
}
