mod renderer;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use gopview_core::Session;
use gopview_core::model::SurfaceKind;
use gopview_core::views::timeline::StripSizing;
use gopview_protocol::Viewport;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gopview", version, about = "Frame dependency and temporal layer viewer")]
struct Cli {
    /// Frame list JSON: a bare array or an object with a `frames` array.
    frames: PathBuf,

    /// Write one surface as SVG instead of starting the viewer.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Surface to show first (or to export).
    #[arg(long, value_parser = parse_surface, default_value = "timeline")]
    surface: SurfaceKind,

    /// Initially selected list position.
    #[arg(long)]
    frame: Option<usize>,

    /// Export width in SVG units.
    #[arg(long, default_value_t = 1200.0)]
    width: f64,

    /// Export height in SVG units.
    #[arg(long, default_value_t = 240.0)]
    height: f64,

    /// Use the dark palette for SVG output.
    #[arg(long, default_value_t = false)]
    dark: bool,

    /// Size timeline elements by coded bytes instead of uniformly.
    #[arg(long, default_value_t = false)]
    by_size: bool,
}

fn parse_surface(name: &str) -> Result<SurfaceKind, String> {
    SurfaceKind::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = SurfaceKind::ALL.iter().map(SurfaceKind::name).collect();
        format!("unknown surface `{name}` (expected one of: {})", known.join(", "))
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data = std::fs::read(&cli.frames)
        .with_context(|| format!("failed to read {}", cli.frames.display()))?;
    let frames = gopview_core::load_frames(&data)
        .with_context(|| format!("failed to load frames from {}", cli.frames.display()))?;

    let mut session = Session::from_frames(frames);
    if cli.by_size {
        session.set_strip_sizing(StripSizing::BySize);
    }
    if let Some(position) = cli.frame {
        session.select(position);
    }

    match &cli.svg {
        Some(out) => export_svg(&mut session, &cli, out),
        None => renderer::run(&mut session, cli.surface),
    }
}

fn export_svg(session: &mut Session, cli: &Cli, out: &Path) -> anyhow::Result<()> {
    // Only export mode logs; the interactive viewer owns the terminal.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GOPVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let viewport = Viewport::sized(cli.width, cli.height);
    let commands = session.render(cli.surface, &viewport);
    let svg = gopview_core::svg::render_svg(&commands, cli.width, cli.height, cli.dark);
    std::fs::write(out, svg).with_context(|| format!("failed to write {}", out.display()))?;

    tracing::info!(
        surface = %cli.surface,
        frames = session.len(),
        commands = commands.len(),
        path = %out.display(),
        "svg written"
    );
    Ok(())
}
