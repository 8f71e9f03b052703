mod choropleth;
mod country;
mod geometry;
mod projection;
mod raster;
mod renderer;

pub use choropleth::{Choropleth, ColorRange, ColorScale, Rgb, ANNUAL, CUMULATIVE, ORANGE_RED};
pub use country::{Bounds, Country, Polygon, Ring};
pub use projection::Viewport;
pub use raster::{rasterize, OwnerRaster};
pub use renderer::{MapLayers, MapRenderer};
