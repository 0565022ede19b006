//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use std::fmt::Write as _;

use gopview_protocol::{RenderCommand, TextAlign, ThemeToken};

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions.
/// `dark` selects the color palette. Hidden paths are kept in the document
/// with `visibility="hidden"` so a host can toggle them without re-rendering.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 160);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:system-ui,-apple-system,sans-serif;font-size:10px">"#,
    );

    let bg = resolve_color(ThemeToken::Background, dark);
    let _ = write!(svg, r#"<rect width="{width}" height="{height}" fill="{bg}"/>"#);

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                frame_index,
                current,
            } => {
                let fill = resolve_color(*color, dark);
                let _ = write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}""#,
                    rect.x, rect.y, rect.w, rect.h,
                );
                if let Some(border) = border_color {
                    let stroke_width = if *current { 2.0 } else { 0.5 };
                    let _ = write!(
                        svg,
                        r#" stroke="{}" stroke-width="{stroke_width}""#,
                        resolve_color(*border, dark)
                    );
                }
                if let Some(index) = frame_index {
                    let _ = write!(svg, r#" data-frame="{index}""#);
                }
                if *current {
                    svg.push_str(r#" data-current="true""#);
                }
                svg.push('>');
                if let Some(label) = label {
                    let _ = write!(svg, "<title>{}</title>", escape_xml(label));
                }
                svg.push_str("</rect>");
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let stroke = resolve_color(*color, dark);
                let _ = write!(
                    svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{line_width}"/>"#,
                    from.x, from.y, to.x, to.y,
                );
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let fill = resolve_color(*color, dark);
                let _ = write!(
                    svg,
                    r#"<text x="{}" y="{}" fill="{fill}" font-size="{font_size}" text-anchor="{}">{}</text>"#,
                    position.x,
                    position.y,
                    text_anchor(*align),
                    escape_xml(text),
                );
            }
            RenderCommand::DrawPath {
                path,
                color,
                width: line_width,
                dashed,
                label,
                label_position,
                source_frame,
                visible,
            } => {
                let stroke = resolve_color(*color, dark);
                let hidden = if *visible { "" } else { r#" visibility="hidden""# };
                let source = source_frame
                    .map(|s| format!(r#" data-source="{s}""#))
                    .unwrap_or_default();
                let _ = write!(svg, "<g{source}{hidden}>");
                let dash = if *dashed { r#" stroke-dasharray="3 2""# } else { "" };
                let _ = write!(
                    svg,
                    r#"<path d="{}" fill="none" stroke="{stroke}" stroke-width="{line_width}"{dash}/>"#,
                    escape_xml(path),
                );
                if let Some(label) = label {
                    let _ = write!(
                        svg,
                        r#"<text x="{}" y="{}" fill="{stroke}" text-anchor="middle">{}</text>"#,
                        label_position.x,
                        label_position.y,
                        escape_xml(label),
                    );
                }
                svg.push_str("</g>");
            }
            RenderCommand::BeginGroup { id, .. } => {
                let _ = write!(svg, r#"<g id="{}">"#, escape_xml(id));
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn text_anchor(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "start",
        TextAlign::Center => "middle",
        TextAlign::Right => "end",
    }
}

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if dark {
        match token {
            ThemeToken::FrameIntra => "#ef5350",
            ThemeToken::FrameInter => "#42a5f5",
            ThemeToken::FrameBidir => "#66bb6a",
            ThemeToken::FrameUnknown => "#757575",
            ThemeToken::LevelBase => "#ffa726",
            ThemeToken::Level1 => "#ab47bc",
            ThemeToken::Level2 => "#26c6da",
            ThemeToken::Level3 => "#9ccc65",
            ThemeToken::LevelHigh => "#8d6e63",
            ThemeToken::GopBoundary => "#ffd600",
            ThemeToken::CurrentFrame | ThemeToken::Cursor => "#ffffff",
            ThemeToken::ArrowDangling => "#9e9e9e",
            ThemeToken::TextPrimary => "#ececec",
            ThemeToken::TextSecondary | ThemeToken::TextMuted => "#9e9e9e",
            ThemeToken::Background | ThemeToken::LaneBackground => "#181818",
            ThemeToken::MinimapBackground | ThemeToken::ThumbnailBackground => "#222222",
            ThemeToken::MinimapViewport => "#448aff",
            ThemeToken::Border | ThemeToken::LaneBorder => "#303030",
        }
    } else {
        match token {
            ThemeToken::FrameIntra => "#e63946",
            ThemeToken::FrameInter => "#457b9d",
            ThemeToken::FrameBidir => "#2a9d8f",
            ThemeToken::FrameUnknown => "#adb5bd",
            ThemeToken::LevelBase => "#f4845f",
            ThemeToken::Level1 => "#8e44ad",
            ThemeToken::Level2 => "#0096c7",
            ThemeToken::Level3 => "#6a994e",
            ThemeToken::LevelHigh => "#7f5539",
            ThemeToken::GopBoundary => "#e67e22",
            ThemeToken::CurrentFrame | ThemeToken::Cursor => "#1a1a2e",
            ThemeToken::ArrowDangling => "#999999",
            ThemeToken::TextPrimary => "#1a1a2e",
            ThemeToken::TextSecondary | ThemeToken::TextMuted => "#666677",
            ThemeToken::Background | ThemeToken::LaneBackground => "#f8f9fa",
            ThemeToken::MinimapBackground | ThemeToken::ThumbnailBackground => "#e9ecef",
            ThemeToken::MinimapViewport => "#ffd60a",
            ThemeToken::Border | ThemeToken::LaneBorder => "#dee2e6",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
