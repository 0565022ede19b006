use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One decoded frame as reported by the bitstream parser.
///
/// This is the single input type shared by every analysis and view:
///
/// ```text
///   parser ──▶ [Frame] ──┬─▶ temporal analysis ──▶ pyramid grid
///                        ├─▶ arrow layout ──────▶ timeline overlay
///                        └─▶ strip layout ──────▶ cursor, minimap, filmstrip
/// ```
///
/// Frames are read-only. Lists of them are shared as `Arc<[Frame]>` and
/// replaced wholesale when the parser produces a new snapshot. Every optional
/// field is normalized by defaulting; nothing here is ever rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Position in coding order, unique within a sequence.
    pub frame_index: u32,
    #[serde(default)]
    pub frame_type: FrameType,
    /// Temporal layer. Absent means the base layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_id: Option<u32>,
    /// Explicit keyframe flag, OR'd with an intra frame type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_frame: Option<bool>,
    /// Indices of the frames this one references. Entries may name frames
    /// that are not part of the current list.
    #[serde(default)]
    pub ref_frames: Vec<u32>,

    // Display-only metadata, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poc: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_id: Option<u32>,
}

impl Frame {
    /// A frame with the given index and type and every optional field unset.
    pub fn new(frame_index: u32, frame_type: FrameType) -> Self {
        Self {
            frame_index,
            frame_type,
            temporal_id: None,
            key_frame: None,
            ref_frames: Vec::new(),
            size: None,
            poc: None,
            pts: None,
            display_order: None,
            coding_order: None,
            spatial_id: None,
        }
    }

    pub fn with_temporal_id(mut self, temporal_id: u32) -> Self {
        self.temporal_id = Some(temporal_id);
        self
    }

    pub fn with_refs(mut self, refs: impl Into<Vec<u32>>) -> Self {
        self.ref_frames = refs.into();
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Temporal level, defaulting to the base layer.
    pub fn level(&self) -> u32 {
        self.temporal_id.unwrap_or(0)
    }

    pub fn is_keyframe(&self) -> bool {
        self.frame_type == FrameType::Intra || self.key_frame == Some(true)
    }

    pub fn has_references(&self) -> bool {
        !self.ref_frames.is_empty()
    }
}

/// Coding type of a frame, converted once from the parser's free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameType {
    /// Decodable on its own (I, KEY, IDR, INTRA_ONLY, ...).
    Intra,
    /// Single-direction prediction (P, INTER, SWITCH, ...).
    Inter,
    /// Bi- or multi-directional prediction.
    Bidirectional,
    #[default]
    Unknown,
}

impl FrameType {
    /// Classify a parser-supplied type name. Never fails; anything
    /// unrecognized becomes `Unknown`.
    pub fn parse(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "I" | "KEY" | "INTRA" | "INTRA_ONLY" | "IDR" | "CRA" | "BLA" | "GDR" | "IRAP" => {
                Self::Intra
            }
            // INTER must win over the `I` prefix below.
            "P" | "INTER" | "NON_KEY" | "SWITCH" | "S" => Self::Inter,
            "B" => Self::Bidirectional,
            s if s.starts_with('I') => Self::Intra,
            s if s.starts_with('P') => Self::Inter,
            s if s.starts_with('B') => Self::Bidirectional,
            _ => Self::Unknown,
        }
    }

    /// Short display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intra => "I",
            Self::Inter => "P",
            Self::Bidirectional => "B",
            Self::Unknown => "?",
        }
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Serde: strings in, canonical short names out ---

impl Serialize for FrameType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FrameType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FrameType::parse(&name))
    }
}
