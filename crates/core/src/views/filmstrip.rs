use std::ops::Range;

use gopview_protocol::{Frame, Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

use crate::analysis::TemporalLevelAnalysis;

const THUMB_WIDTH: f64 = 64.0;
const THUMB_HEIGHT: f64 = 36.0;
const THUMB_GAP: f64 = 4.0;
const CAPTION_HEIGHT: f64 = 12.0;
const FONT_SIZE: f64 = 9.0;

/// Positions shown by a filmstrip with room for `capacity` cards, kept
/// centered on `current` where the ends of the list allow.
pub fn filmstrip_window(count: usize, capacity: usize, current: Option<usize>) -> Range<usize> {
    if count == 0 || capacity == 0 {
        return 0..0;
    }
    let capacity = capacity.min(count);
    let center = current.filter(|&c| c < count).unwrap_or(0);
    let start = center.saturating_sub(capacity / 2).min(count - capacity);
    start..start + capacity
}

/// Render thumbnail placeholder cards around the current frame.
///
/// Decoded thumbnails are drawn by the host on top of the cards; each card
/// carries its frame index for that purpose.
pub fn render_filmstrip(
    frames: &[Frame],
    analysis: &TemporalLevelAnalysis,
    viewport: &Viewport,
    current: Option<usize>,
) -> Vec<RenderCommand> {
    let capacity = ((viewport.width + THUMB_GAP) / (THUMB_WIDTH + THUMB_GAP)).floor() as usize;
    let window = filmstrip_window(frames.len(), capacity.max(1), current);
    if window.is_empty() {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(window.len() * 4 + 2);
    commands.push(RenderCommand::BeginGroup {
        id: "filmstrip".into(),
        label: Some("Filmstrip".into()),
    });

    for (slot, position) in window.enumerate() {
        let frame = &frames[position];
        let x = viewport.x + slot as f64 * (THUMB_WIDTH + THUMB_GAP);
        let y = viewport.y;
        let is_current = current == Some(position);

        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x, y, THUMB_WIDTH, THUMB_HEIGHT),
            color: ThemeToken::ThumbnailBackground,
            border_color: Some(if is_current {
                ThemeToken::CurrentFrame
            } else {
                ThemeToken::for_frame_type(frame.frame_type)
            }),
            label: Some(format!("Frame {}", frame.frame_index)),
            frame_index: Some(frame.frame_index),
            current: is_current,
        });

        if analysis.is_boundary(frame.frame_index) {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x - THUMB_GAP / 2.0, y),
                to: Point::new(x - THUMB_GAP / 2.0, y + THUMB_HEIGHT + CAPTION_HEIGHT),
                color: ThemeToken::GopBoundary,
                width: 2.0,
            });
        }

        commands.push(RenderCommand::DrawText {
            position: Point::new(x + THUMB_WIDTH / 2.0, y + THUMB_HEIGHT + CAPTION_HEIGHT - 2.0),
            text: format!("{} #{} T{}", frame.frame_type, frame.frame_index, frame.level()),
            color: if is_current {
                ThemeToken::TextPrimary
            } else {
                ThemeToken::TextMuted
            },
            font_size: FONT_SIZE,
            align: TextAlign::Center,
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use gopview_protocol::FrameType;

    #[test]
    fn window_stays_centered_and_in_bounds() {
        assert_eq!(filmstrip_window(100, 5, Some(50)), 48..53);
        assert_eq!(filmstrip_window(100, 5, Some(0)), 0..5);
        assert_eq!(filmstrip_window(100, 5, Some(99)), 95..100);
        assert_eq!(filmstrip_window(3, 5, Some(1)), 0..3);
        assert_eq!(filmstrip_window(100, 5, Some(500)), 0..5);
        assert_eq!(filmstrip_window(0, 5, Some(0)), 0..0);
    }

    #[test]
    fn marks_current_card() {
        let frames: Vec<Frame> = (0..20)
            .map(|i| Frame::new(i, if i % 10 == 0 { FrameType::Intra } else { FrameType::Inter }))
            .collect();
        let analysis = analyze(&frames);
        let cmds = render_filmstrip(&frames, &analysis, &Viewport::sized(340.0, 60.0), Some(12));

        let cards: Vec<(u32, bool)> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    frame_index: Some(i),
                    current,
                    ..
                } => Some((*i, *current)),
                _ => None,
            })
            .collect();
        // 340px fits 5 cards.
        assert_eq!(cards.len(), 5);
        assert_eq!(cards.iter().filter(|(_, c)| *c).count(), 1);
        assert!(cards.contains(&(12, true)));
        // Frame 10 starts a GOP inside the window.
        let boundaries = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawLine { .. }))
            .count();
        assert_eq!(boundaries, 1);
    }

    #[test]
    fn empty_frames_returns_empty() {
        let cmds = render_filmstrip(&[], &analyze(&[]), &Viewport::sized(340.0, 60.0), None);
        assert!(cmds.is_empty());
    }
}
