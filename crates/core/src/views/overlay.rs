use gopview_protocol::{Point, RenderCommand};

use crate::arrows::FocusedArrows;

const ARROW_WIDTH: f64 = 1.5;

/// Render every laid-out reference arrow as a path.
///
/// All arrows are emitted; only those leaving the focus frame are visible.
/// An empty layout produces no commands at all, not an empty group.
pub fn render_arrow_overlay(arrows: FocusedArrows<'_>) -> Vec<RenderCommand> {
    if !arrows.result.is_renderable() {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(arrows.result.all_arrow_data.len() + 2);
    commands.push(RenderCommand::BeginGroup {
        id: "arrows".into(),
        label: Some("References".into()),
    });

    for arrow in &arrows.result.all_arrow_data {
        commands.push(RenderCommand::DrawPath {
            path: arrow.path_data.clone(),
            color: arrow.color,
            width: ARROW_WIDTH,
            dashed: !arrow.target_resolved,
            label: Some(arrow.label.clone()),
            label_position: Point::new(arrow.label_x, arrow.label_y),
            source_frame: Some(arrow.source_frame_index),
            visible: arrows.is_visible(arrow),
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

/// Re-point an already rendered overlay at a new focus frame by flipping
/// visibility flags in place. Returns how many paths changed.
pub fn apply_focus(commands: &mut [RenderCommand], focus: Option<u32>) -> usize {
    let mut changed = 0;
    for command in commands {
        if let RenderCommand::DrawPath {
            source_frame,
            visible,
            ..
        } = command
        {
            let shown = source_frame.is_some() && *source_frame == focus;
            if *visible != shown {
                *visible = shown;
                changed += 1;
            }
        }
    }
    changed
}
