//! Image side of the pipeline: decode a source, lay it on a canvas, encode PNG

mod composite;
mod decode;
mod encode;

// Re-export public API
pub use composite::{
    blank_canvas, check_canvas_size, composite, composite_onto_canvas, CompositeJob, Overflow,
    MAX_CANVAS_PIXELS,
};
pub use decode::{decode, open};
pub use encode::{compress_to_png, save_png, PngCompression};
