use std::collections::BTreeMap;

use gopview_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::analysis::TemporalLevelAnalysis;

const LABEL_WIDTH: f64 = 28.0;
const MIN_ROW_HEIGHT: f64 = 8.0;
const MAX_ROW_HEIGHT: f64 = 24.0;
const MIN_COLUMN_WIDTH: f64 = 4.0;
const CELL_GAP: f64 = 1.0;
const FONT_SIZE: f64 = 9.0;

/// Grid geometry of the B-pyramid: one row per temporal level (highest
/// first), one column per frame index.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidLayout {
    origin: Point,
    row_height: f64,
    column_width: f64,
    columns: BTreeMap<u32, usize>,
}

impl PyramidLayout {
    pub fn compute(analysis: &TemporalLevelAnalysis, viewport: &Viewport) -> Self {
        let rows = analysis.levels.len().max(1) as f64;
        let columns: BTreeMap<u32, usize> = analysis
            .frame_map
            .keys()
            .enumerate()
            .map(|(column, &frame_index)| (frame_index, column))
            .collect();
        let grid_width = (viewport.width - LABEL_WIDTH).max(0.0);

        Self {
            origin: Point::new(viewport.x + LABEL_WIDTH, viewport.y),
            row_height: (viewport.height / rows).clamp(MIN_ROW_HEIGHT, MAX_ROW_HEIGHT),
            column_width: (grid_width / columns.len().max(1) as f64).max(MIN_COLUMN_WIDTH),
            columns,
        }
    }

    pub fn cell(&self, row: usize, frame_index: u32) -> Option<Rect> {
        let column = *self.columns.get(&frame_index)?;
        Some(Rect::new(
            self.origin.x + column as f64 * self.column_width,
            self.origin.y + row as f64 * self.row_height,
            self.column_width - CELL_GAP,
            self.row_height - CELL_GAP,
        ))
    }

    /// Column center of every frame, keyed by frame index.
    pub fn frame_positions(&self) -> BTreeMap<u32, f64> {
        self.columns
            .iter()
            .map(|(&frame_index, &column)| {
                (
                    frame_index,
                    self.origin.x + (column as f64 + 0.5) * self.column_width,
                )
            })
            .collect()
    }
}

/// Render the temporal pyramid grid. `current_frame` is a frame index.
pub fn render_pyramid(
    analysis: &TemporalLevelAnalysis,
    viewport: &Viewport,
    current_frame: Option<u32>,
) -> Vec<RenderCommand> {
    if analysis.is_empty() {
        return Vec::new();
    }

    let layout = PyramidLayout::compute(analysis, viewport);
    let grid_height = analysis.levels.len() as f64 * layout.row_height;
    let mut commands = Vec::with_capacity(analysis.frame_map.len() + analysis.levels.len() * 2 + 8);

    commands.push(RenderCommand::BeginGroup {
        id: "pyramid".into(),
        label: Some("Temporal Layers".into()),
    });

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(viewport.x, viewport.y, viewport.width, grid_height),
        color: ThemeToken::LaneBackground,
        border_color: Some(ThemeToken::LaneBorder),
        label: None,
        frame_index: None,
        current: false,
    });

    for (row, level) in analysis.levels.iter().enumerate() {
        let y = viewport.y + row as f64 * layout.row_height;
        commands.push(RenderCommand::DrawText {
            position: Point::new(viewport.x + 4.0, y + layout.row_height / 2.0 + FONT_SIZE / 3.0),
            text: format!("T{}", level.level),
            color: ThemeToken::TextSecondary,
            font_size: FONT_SIZE,
            align: TextAlign::Left,
        });

        for frame in &level.frames {
            let Some(rect) = layout.cell(row, frame.frame_index) else {
                continue;
            };
            let is_current = current_frame == Some(frame.frame_index);
            let refs = frame.ref_frames.len();
            commands.push(RenderCommand::DrawRect {
                rect,
                color: if frame.is_keyframe {
                    ThemeToken::FrameIntra
                } else {
                    ThemeToken::for_level(level.level)
                },
                border_color: is_current.then_some(ThemeToken::CurrentFrame),
                label: Some(format!("#{} T{} refs:{refs}", frame.frame_index, level.level)),
                frame_index: Some(frame.frame_index),
                current: is_current,
            });
        }
    }

    for &boundary in &analysis.gop_boundaries {
        if let Some(rect) = layout.cell(0, boundary) {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(rect.x, viewport.y),
                to: Point::new(rect.x, viewport.y + grid_height),
                color: ThemeToken::GopBoundary,
                width: 1.0,
            });
        }
    }

    commands.push(RenderCommand::EndGroup);
    commands
}
