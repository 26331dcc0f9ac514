//! Media optimization for the upload pipeline.
//!
//! Raster images are re-encoded to WebP with EXIF orientation applied and all
//! other metadata stripped. Videos and GIFs pass through untouched: video
//! re-encoding is out of scope, and re-encoding a GIF would lose animation.

pub mod optimizer;
pub mod orientation;
pub mod sanitize;

pub use optimizer::{MediaOptimizer, OptimizeError, OptimizedMedia};
pub use sanitize::sanitize_file_name;
