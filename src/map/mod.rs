mod geometry;
mod projection;
mod renderer;
mod shape;

pub use projection::{Viewport, MAX_ZOOM, MIN_ZOOM};
pub use renderer::{fade, MapLayers, MapRenderer};
pub use shape::{CountryShape, LineString, Polygon};
