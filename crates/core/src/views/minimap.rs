use std::ops::Range;

use gopview_protocol::{Frame, Point, Rect, RenderCommand, ThemeToken, Viewport};

use crate::analysis::TemporalLevelAnalysis;

const CELL_WIDTH: f64 = 3.0;
const TICK_HEIGHT: f64 = 4.0;
const MARKER_WIDTH: f64 = 2.0;
const MIN_BAR_FRACTION: f64 = 0.15;

struct Bucket {
    range: Range<usize>,
    bytes: f64,
    has_keyframe: bool,
    max_level: u32,
}

/// Render a compressed overview of the whole sequence.
///
/// Frames are bucketed into columns; bar height follows the coded bytes in
/// each column (or is full when sizes are unknown), keyframe columns are
/// drawn in the intra color, GOP boundaries get a tick along the top, and
/// the region shown by the main strip is outlined. `visible` and `current`
/// are list positions.
pub fn render_minimap(
    frames: &[Frame],
    analysis: &TemporalLevelAnalysis,
    viewport: &Viewport,
    visible: Range<usize>,
    current: Option<usize>,
) -> Vec<RenderCommand> {
    let count = frames.len();
    if count == 0 || viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Vec::new();
    }

    let cols = ((viewport.width / CELL_WIDTH).floor() as usize).clamp(1, count);
    let col_width = viewport.width / cols as f64;
    let frame_width = viewport.width / count as f64;
    let x_of = |position: usize| viewport.x + position as f64 * frame_width;

    let buckets: Vec<Bucket> = (0..cols)
        .map(|c| {
            let range = (c * count / cols)..((c + 1) * count / cols);
            let slice = &frames[range.clone()];
            Bucket {
                bytes: slice.iter().filter_map(|f| f.size).map(|s| s as f64).sum(),
                has_keyframe: slice.iter().any(Frame::is_keyframe),
                max_level: slice.iter().map(Frame::level).max().unwrap_or(0),
                range,
            }
        })
        .collect();
    let max_bytes = buckets.iter().map(|b| b.bytes).fold(0.0_f64, f64::max);

    let mut commands = Vec::with_capacity(cols + analysis.gop_boundaries.len() + 8);
    commands.push(RenderCommand::BeginGroup {
        id: "minimap".into(),
        label: Some("Minimap".into()),
    });

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(viewport.x, viewport.y, viewport.width, viewport.height),
        color: ThemeToken::MinimapBackground,
        border_color: None,
        label: None,
        frame_index: None,
        current: false,
    });

    let bar_area = viewport.height - TICK_HEIGHT;
    for (c, bucket) in buckets.iter().enumerate() {
        if bucket.range.is_empty() {
            continue;
        }
        let fraction = if max_bytes > 0.0 {
            (bucket.bytes / max_bytes).max(MIN_BAR_FRACTION)
        } else {
            1.0
        };
        let h = bar_area * fraction;
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(
                viewport.x + c as f64 * col_width,
                viewport.y + viewport.height - h,
                col_width,
                h,
            ),
            color: if bucket.has_keyframe {
                ThemeToken::FrameIntra
            } else {
                ThemeToken::for_level(bucket.max_level)
            },
            border_color: None,
            label: None,
            frame_index: None,
            current: false,
        });
    }

    for (position, frame) in frames.iter().enumerate() {
        if analysis.is_boundary(frame.frame_index) {
            let x = x_of(position);
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, viewport.y),
                to: Point::new(x, viewport.y + TICK_HEIGHT),
                color: ThemeToken::GopBoundary,
                width: 1.0,
            });
        }
    }

    let start = visible.start.min(count);
    let end = visible.end.clamp(start, count);
    if end > start {
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x_of(start), viewport.y, x_of(end) - x_of(start), viewport.height),
            color: ThemeToken::MinimapViewport,
            border_color: Some(ThemeToken::Border),
            label: None,
            frame_index: None,
            current: false,
        });
    }

    if let Some(position) = current.filter(|&p| p < count) {
        let center = x_of(position) + frame_width / 2.0;
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(center - MARKER_WIDTH / 2.0, viewport.y, MARKER_WIDTH, viewport.height),
            color: ThemeToken::CurrentFrame,
            border_color: None,
            label: None,
            frame_index: Some(frames[position].frame_index),
            current: true,
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}
