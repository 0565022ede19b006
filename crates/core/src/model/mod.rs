pub mod session;
pub mod surface;

pub use session::Session;
pub use surface::SurfaceKind;
