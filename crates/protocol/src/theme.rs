use serde::{Deserialize, Serialize};

use crate::frame::FrameType;

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Frame types
    FrameIntra,
    FrameInter,
    FrameBidir,
    FrameUnknown,

    // Temporal layers, base first
    LevelBase,
    Level1,
    Level2,
    Level3,
    LevelHigh,

    GopBoundary,
    CurrentFrame,
    Cursor,
    ArrowDangling,

    LaneBackground,
    LaneBorder,

    TextPrimary,
    TextSecondary,
    TextMuted,

    Background,
    Border,

    // Minimap
    MinimapBackground,
    MinimapViewport,

    // Filmstrip
    ThumbnailBackground,
}

impl ThemeToken {
    /// Color for a temporal layer. Layers above 3 share one token.
    pub fn for_level(level: u32) -> Self {
        match level {
            0 => Self::LevelBase,
            1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            _ => Self::LevelHigh,
        }
    }

    pub fn for_frame_type(frame_type: FrameType) -> Self {
        match frame_type {
            FrameType::Intra => Self::FrameIntra,
            FrameType::Inter => Self::FrameInter,
            FrameType::Bidirectional => Self::FrameBidir,
            FrameType::Unknown => Self::FrameUnknown,
        }
    }
}
