//! Frame dependency and temporal-layer analysis for coded video streams,
//! with render surfaces that emit backend-agnostic [`RenderCommand`]s.
//!
//! [`RenderCommand`]: gopview_protocol::RenderCommand

pub mod analysis;
pub mod arrows;
pub mod loader;
pub mod model;
pub mod references;
pub mod selection;
pub mod svg;
pub mod views;

pub use analysis::{TemporalLevelAnalysis, analyze};
pub use arrows::{ArrowGeometry, ArrowLayoutCache, ArrowLayoutResult, compute_layout};
pub use loader::{LoadError, load_frames};
pub use model::{Session, SurfaceKind};
pub use selection::{CursorSync, Direction, LayoutProvider, SelectionStore};
