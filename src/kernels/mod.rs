//! Native raster kernels behind the dispatchable ops.

pub mod color;
pub mod components;
pub mod denoise;
pub mod edge;
pub mod fill;
pub mod morphology;
pub mod pdf;
pub mod resize;
pub mod stack;
pub mod svg;
pub mod threshold;
