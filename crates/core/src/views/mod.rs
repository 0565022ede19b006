pub mod filmstrip;
pub mod minimap;
pub mod overlay;
pub mod pyramid;
pub mod timeline;
