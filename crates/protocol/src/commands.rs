use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The core emits a `Vec<RenderCommand>` for each surface. Renderers consume
/// this list sequentially; each command carries all the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle, optionally with a text label and the index
    /// of the frame it stands for (for hit-testing / selection).
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        label: Option<String>,
        frame_index: Option<u32>,
        /// Set on the one element that represents the current frame.
        current: bool,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: String,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
    },

    /// Stroke an SVG-syntax path, optionally labelled at `label_position`.
    ///
    /// Hidden paths stay in the list so that a focus change only flips
    /// `visible` instead of rebuilding geometry.
    DrawPath {
        path: String,
        color: ThemeToken,
        width: f64,
        dashed: bool,
        label: Option<String>,
        label_position: Point,
        /// Frame the path originates from; visibility follows this frame.
        source_frame: Option<u32>,
        visible: bool,
    },

    /// Begin a logical group (e.g. a surface). Renderers may use this for
    /// batching, layer separation, or accessibility.
    BeginGroup { id: String, label: Option<String> },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
