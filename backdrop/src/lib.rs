pub mod batch;
pub mod color;
pub mod config;
pub mod error;
pub mod image;
pub mod listing;
pub mod paths;

// Re-export commonly used types
pub use batch::{run, BatchReport, RunOptions};
pub use color::Color;
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use image::{CompositeJob, Overflow, PngCompression};
