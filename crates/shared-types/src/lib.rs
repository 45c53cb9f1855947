pub mod geometry;
pub mod page;
pub mod raster;

pub use geometry::{Point, Rect, Size};
pub use page::{PageDimensions, RenderedPage};
pub use raster::{ImageError, RasterImage};
