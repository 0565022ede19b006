pub mod commands;
pub mod frame;
pub mod theme;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use frame::{Frame, FrameType};
pub use theme::ThemeToken;
pub use types::{Point, Rect, Viewport};
