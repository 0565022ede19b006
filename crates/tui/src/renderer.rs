use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use gopview_core::Session;
use gopview_core::model::SurfaceKind;
use gopview_core::selection::Direction;
use gopview_protocol::{RenderCommand, TextAlign, ThemeToken, Viewport};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders},
};

/// Render units per terminal cell.
const CELL_W: f64 = 8.0;
const CELL_H: f64 = 16.0;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::FrameIntra => Color::Red,
        ThemeToken::FrameInter => Color::Blue,
        ThemeToken::FrameBidir => Color::Green,
        ThemeToken::FrameUnknown => Color::Gray,
        ThemeToken::LevelBase => Color::Rgb(255, 167, 38),
        ThemeToken::Level1 => Color::Magenta,
        ThemeToken::Level2 => Color::Cyan,
        ThemeToken::Level3 => Color::LightGreen,
        ThemeToken::LevelHigh => Color::Rgb(141, 110, 99),
        ThemeToken::GopBoundary => Color::Yellow,
        ThemeToken::CurrentFrame => Color::White,
        ThemeToken::Cursor => Color::White,
        ThemeToken::ArrowDangling => Color::DarkGray,
        ThemeToken::LaneBackground => Color::Black,
        ThemeToken::LaneBorder => Color::DarkGray,
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextSecondary => Color::Gray,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::Background => Color::Black,
        ThemeToken::Border => Color::DarkGray,
        ThemeToken::MinimapBackground => Color::Rgb(34, 34, 34),
        ThemeToken::MinimapViewport => Color::LightBlue,
        ThemeToken::ThumbnailBackground => Color::Rgb(34, 34, 34),
    }
}

/// Maps render-unit coordinates onto the cells of one terminal area.
struct Raster {
    area: Rect,
}

impl Raster {
    fn viewport(&self) -> Viewport {
        Viewport::sized(
            f64::from(self.area.width) * CELL_W,
            f64::from(self.area.height) * CELL_H,
        )
    }

    fn col(&self, x: f64) -> Option<u16> {
        let col = (x / CELL_W).floor();
        (col >= 0.0 && col < f64::from(self.area.width)).then(|| self.area.x + col as u16)
    }

    fn row(&self, y: f64) -> Option<u16> {
        let row = (y / CELL_H).floor();
        (row >= 0.0 && row < f64::from(self.area.height)).then(|| self.area.y + row as u16)
    }

    /// Render-unit x at the center of terminal column `column`.
    fn unit_x(&self, column: u16) -> f64 {
        (f64::from(column.saturating_sub(self.area.x)) + 0.5) * CELL_W
    }

    fn put(&self, buf: &mut Buffer, x: f64, y: f64, ch: char, style: Style) {
        if let (Some(col), Some(row)) = (self.col(x), self.row(y)) {
            buf[(col, row)].set_char(ch).set_style(style);
        }
    }

    fn draw(&self, buf: &mut Buffer, commands: &[RenderCommand]) {
        for cmd in commands {
            match cmd {
                RenderCommand::DrawRect {
                    rect,
                    color,
                    label,
                    current,
                    ..
                } => {
                    let mut style = Style::default().fg(theme_to_color(*color));
                    if *current {
                        style = style.bg(Color::White).add_modifier(Modifier::BOLD);
                    }
                    let cols = ((rect.w / CELL_W).round() as usize).max(1);
                    let rows = ((rect.h / CELL_H).round() as usize).max(1);
                    let label = label.as_deref().unwrap_or("");
                    for r in 0..rows {
                        let y = rect.y + r as f64 * CELL_H;
                        let text: Vec<char> = if r == 0 && cols >= label.len() + 2 {
                            format!(" {label:<w$}", w = cols - 1).chars().collect()
                        } else {
                            vec!['█'; cols]
                        };
                        for (c, ch) in text.into_iter().take(cols).enumerate() {
                            self.put(buf, rect.x + c as f64 * CELL_W, y, ch, style);
                        }
                    }
                }
                RenderCommand::DrawLine {
                    from, to, color, ..
                } => {
                    let style = Style::default().fg(theme_to_color(*color));
                    if (from.x - to.x).abs() < CELL_W / 2.0 {
                        let (top, bottom) = (from.y.min(to.y), from.y.max(to.y));
                        let mut y = top;
                        while y < bottom {
                            self.put(buf, from.x, y, '│', style);
                            y += CELL_H;
                        }
                    } else {
                        let (left, right) = (from.x.min(to.x), from.x.max(to.x));
                        let mut x = left;
                        while x < right {
                            self.put(buf, x, from.y, '─', style);
                            x += CELL_W;
                        }
                    }
                }
                RenderCommand::DrawText {
                    position,
                    text,
                    color,
                    align,
                    ..
                } => {
                    let style = Style::default().fg(theme_to_color(*color));
                    let width = text.chars().count() as f64 * CELL_W;
                    let start = match align {
                        TextAlign::Left => position.x,
                        TextAlign::Center => position.x - width / 2.0,
                        TextAlign::Right => position.x - width,
                    };
                    // Text baselines sit near the bottom of their row.
                    let y = position.y - CELL_H / 4.0;
                    for (i, ch) in text.chars().enumerate() {
                        self.put(buf, start + i as f64 * CELL_W, y, ch, style);
                    }
                }
                RenderCommand::DrawPath {
                    path,
                    color,
                    dashed,
                    label,
                    label_position,
                    visible: true,
                    ..
                } => {
                    let Some(arc) = ArcBracket::parse(path) else {
                        continue;
                    };
                    let style = Style::default().fg(theme_to_color(*color));
                    let horizontal = if *dashed { '╌' } else { '─' };
                    let (left, right) = (arc.source_x.min(arc.target_x), arc.source_x.max(arc.target_x));
                    let mut y = arc.anchor_y;
                    while y < arc.peak_y {
                        self.put(buf, left, y, '│', style);
                        self.put(buf, right, y, '│', style);
                        y += CELL_H;
                    }
                    let mut x = left + CELL_W;
                    while x < right {
                        self.put(buf, x, arc.peak_y, horizontal, style);
                        x += CELL_W;
                    }
                    self.put(buf, left, arc.peak_y, '╰', style);
                    self.put(buf, right, arc.peak_y, '╯', style);
                    if let Some(label) = label {
                        let start = label_position.x - label.len() as f64 * CELL_W / 2.0;
                        for (i, ch) in label.chars().enumerate() {
                            self.put(buf, start + i as f64 * CELL_W, label_position.y, ch, style);
                        }
                    }
                }
                RenderCommand::DrawPath { .. }
                | RenderCommand::BeginGroup { .. }
                | RenderCommand::EndGroup => {}
            }
        }
    }
}

/// The cell-resolution outline of an arrow path `M sx,ay C sx,cy tx,cy tx,ay`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ArcBracket {
    source_x: f64,
    target_x: f64,
    anchor_y: f64,
    /// Lowest point the curve actually reaches.
    peak_y: f64,
}

impl ArcBracket {
    fn parse(path: &str) -> Option<Self> {
        let numbers: Vec<f64> = path
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter_map(|token| token.parse().ok())
            .collect();
        let [source_x, anchor_y, _, control_y, target_x, ..] = numbers[..] else {
            return None;
        };
        Some(Self {
            source_x,
            target_x,
            anchor_y,
            peak_y: anchor_y + (control_y - anchor_y) * 0.75,
        })
    }
}

fn status_line(session: &Session, surface: SurfaceKind) -> String {
    let Some(frame) = session.current_frame() else {
        return format!(" gopview: {} frames | {surface} | no frame selected ", session.len());
    };
    let dangling = frame
        .ref_frames
        .iter()
        .filter(|&&target| session.references().is_dangling(frame.frame_index, target))
        .count();
    let mut line = format!(
        " gopview: {} frames | {surface} | #{} {} T{} refs {:?} | used by {:?} ",
        session.len(),
        frame.frame_index,
        frame.frame_type,
        frame.level(),
        frame.ref_frames,
        session.references().referenced_by(frame.frame_index),
    );
    if dangling > 0 {
        line.push_str(&format!("| {dangling} missing ref(s) "));
    }
    line
}

/// Run the interactive viewer until the user quits.
pub fn run(session: &mut Session, surface: SurfaceKind) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, session, surface);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: &mut Session,
    mut surface: SurfaceKind,
) -> Result<()> {
    loop {
        let term_size = terminal.size()?;
        let raster = Raster {
            area: Rect::new(0, 1, term_size.width, term_size.height.saturating_sub(2)),
        };
        let viewport = raster.viewport();
        let cmds = session.render(surface, &viewport);
        let status = status_line(session, surface);

        terminal.draw(|frame| {
            let area = frame.area();

            let header = Block::default()
                .title(status.as_str())
                .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(header, Rect::new(0, 0, area.width, 1));

            let block = Block::default()
                .borders(Borders::NONE)
                .style(Style::default().bg(Color::Black));
            frame.render_widget(block, raster.area);
            raster.draw(frame.buffer_mut(), &cmds);

            let footer = Block::default()
                .title(" ←→/hl step | Home/End | click/drag strip | Tab surface | q quit ")
                .style(Style::default().fg(Color::Gray).bg(Color::Black));
            frame.render_widget(
                footer,
                Rect::new(0, area.height.saturating_sub(1), area.width, 1),
            );
        })?;

        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Left | KeyCode::Char('h') => {
                    session.step(Direction::Previous);
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    session.step(Direction::Next);
                }
                KeyCode::Home => {
                    session.select(0);
                }
                KeyCode::End => {
                    session.select(session.len().saturating_sub(1));
                }
                KeyCode::Tab => surface = surface.next(),
                _ => {}
            },
            Event::Mouse(mouse) if surface == SurfaceKind::Timeline => {
                let x = raster.unit_x(mouse.column);
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) if mouse.row >= raster.area.y => {
                        session.pointer_down(x, &viewport);
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        session.pointer_move(x, &viewport);
                    }
                    MouseEventKind::Up(MouseButton::Left) => {
                        session.pointer_up();
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    Ok(())
}
