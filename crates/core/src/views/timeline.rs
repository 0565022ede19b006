use gopview_protocol::{Frame, Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};
use serde::{Deserialize, Serialize};

use crate::analysis::TemporalLevelAnalysis;
use crate::selection::LayoutProvider;

pub const STRIP_HEIGHT: f64 = 28.0;
const MIN_ELEMENT_WIDTH: f64 = 2.0;
const MIN_LABEL_WIDTH: f64 = 14.0;
const FONT_SIZE: f64 = 9.0;
const CURSOR_WIDTH: f64 = 2.0;

/// How timeline elements share the strip width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StripSizing {
    /// Every frame gets the same width.
    #[default]
    Uniform,
    /// Width proportional to coded size. Frames without a size get the mean
    /// of the known sizes.
    BySize,
}

/// Element bounds of one laid-out timeline strip, left to right in list
/// order. This is the live layout the cursor is measured against.
#[derive(Debug, Clone, PartialEq)]
pub struct StripLayout {
    container: Rect,
    elements: Vec<Rect>,
}

impl StripLayout {
    pub fn compute(frames: &[Frame], viewport: &Viewport, sizing: StripSizing) -> Self {
        let height = STRIP_HEIGHT.min(viewport.height);
        let container = Rect::new(viewport.x, viewport.y, viewport.width.max(0.0), height);
        if frames.is_empty() {
            return Self {
                container,
                elements: Vec::new(),
            };
        }

        let weights = element_weights(frames, sizing);
        let total: f64 = weights.iter().sum();
        let floor_total = MIN_ELEMENT_WIDTH * frames.len() as f64;
        let spare = (container.w - floor_total).max(0.0);

        let mut x = container.x;
        let elements = weights
            .iter()
            .map(|w| {
                let width = MIN_ELEMENT_WIDTH + spare * w / total;
                let rect = Rect::new(x, container.y, width, height);
                x += width;
                rect
            })
            .collect();

        Self {
            container,
            elements,
        }
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    pub fn elements(&self) -> &[Rect] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Position of the element under `x`, if any.
    pub fn hit_test(&self, x: f64) -> Option<usize> {
        let index = self.elements.partition_point(|r| r.right() <= x);
        self.elements
            .get(index)
            .filter(|r| r.contains_x(x))
            .map(|_| index)
    }
}

impl LayoutProvider for StripLayout {
    fn element_bounds(&self, index: usize) -> Option<Rect> {
        self.elements.get(index).copied()
    }

    fn container_bounds(&self) -> Rect {
        self.container
    }
}

fn element_weights(frames: &[Frame], sizing: StripSizing) -> Vec<f64> {
    match sizing {
        StripSizing::Uniform => vec![1.0; frames.len()],
        StripSizing::BySize => {
            let known: Vec<f64> = frames.iter().filter_map(|f| f.size).map(|s| s as f64).collect();
            let fallback = if known.is_empty() {
                1.0
            } else {
                known.iter().sum::<f64>() / known.len() as f64
            };
            frames
                .iter()
                .map(|f| f.size.map_or(fallback, |s| s as f64).max(1.0))
                .collect()
        }
    }
}

/// Render the timeline strip: one cell per frame colored by coding type,
/// GOP boundary markers, and the cursor line.
///
/// `current` is a list position; out-of-range values highlight nothing.
/// `cursor_x` is relative to the strip container.
pub fn render_timeline(
    frames: &[Frame],
    analysis: &TemporalLevelAnalysis,
    layout: &StripLayout,
    current: Option<usize>,
    cursor_x: f64,
) -> Vec<RenderCommand> {
    if frames.is_empty() || layout.is_empty() {
        return Vec::new();
    }

    let container = layout.container();
    let mut commands = Vec::with_capacity(frames.len() * 2 + 6);

    commands.push(RenderCommand::BeginGroup {
        id: "timeline".into(),
        label: Some("Timeline".into()),
    });

    commands.push(RenderCommand::DrawRect {
        rect: container,
        color: ThemeToken::LaneBackground,
        border_color: Some(ThemeToken::LaneBorder),
        label: None,
        frame_index: None,
        current: false,
    });

    for (position, (frame, rect)) in frames.iter().zip(layout.elements()).enumerate() {
        let is_current = current == Some(position);
        commands.push(RenderCommand::DrawRect {
            rect: *rect,
            color: ThemeToken::for_frame_type(frame.frame_type),
            border_color: Some(if is_current {
                ThemeToken::CurrentFrame
            } else {
                ThemeToken::Border
            }),
            label: Some(format!("{} #{}", frame.frame_type, frame.frame_index)),
            frame_index: Some(frame.frame_index),
            current: is_current,
        });

        if analysis.is_boundary(frame.frame_index) {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(rect.x, rect.y),
                to: Point::new(rect.x, rect.y + rect.h),
                color: ThemeToken::GopBoundary,
                width: 2.0,
            });
        }

        if rect.w >= MIN_LABEL_WIDTH {
            commands.push(RenderCommand::DrawText {
                position: Point::new(rect.center_x(), rect.y + rect.h / 2.0 + FONT_SIZE / 3.0),
                text: frame.frame_type.as_str().into(),
                color: ThemeToken::TextPrimary,
                font_size: FONT_SIZE,
                align: TextAlign::Center,
            });
        }
    }

    let x = container.x + cursor_x;
    commands.push(RenderCommand::DrawLine {
        from: Point::new(x, container.y),
        to: Point::new(x, container.y + container.h),
        color: ThemeToken::Cursor,
        width: CURSOR_WIDTH,
    });

    commands.push(RenderCommand::EndGroup);
    commands
}
