//! Reference bookkeeping for debug displays: who references whom, and which
//! references point outside the loaded frame list.

use std::collections::{BTreeMap, HashSet};

use gopview_protocol::Frame;
use serde::{Deserialize, Serialize};

/// A reference whose target is not part of the frame list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingRef {
    pub source: u32,
    pub target: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSummary {
    /// Target frame index → frames referencing it, in input order. Dangling
    /// targets are included so their referrers can still be listed.
    pub incoming: BTreeMap<u32, Vec<u32>>,
    pub outgoing_total: usize,
    pub dangling: Vec<DanglingRef>,
}

impl ReferenceSummary {
    pub fn referenced_by(&self, target: u32) -> &[u32] {
        self.incoming
            .get(&target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_dangling(&self, source: u32, target: u32) -> bool {
        self.dangling
            .iter()
            .any(|d| d.source == source && d.target == target)
    }
}

pub fn summarize(frames: &[Frame]) -> ReferenceSummary {
    let known: HashSet<u32> = frames.iter().map(|f| f.frame_index).collect();
    let mut summary = ReferenceSummary::default();

    for frame in frames {
        for &target in &frame.ref_frames {
            summary.outgoing_total += 1;
            summary
                .incoming
                .entry(target)
                .or_default()
                .push(frame.frame_index);
            if !known.contains(&target) {
                summary.dangling.push(DanglingRef {
                    source: frame.frame_index,
                    target,
                });
            }
        }
    }

    if !summary.dangling.is_empty() {
        tracing::debug!(dangling = summary.dangling.len(), "frame list has dangling references");
    }
    summary
}
