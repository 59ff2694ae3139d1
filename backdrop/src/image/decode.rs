//! Image decoding

use imageproc::image::{load_from_memory, DynamicImage};

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Read and decode a source image, guessing its format from the bytes rather than
/// the extension.
pub fn open(path: &Path) -> Result<DynamicImage> {
    let data = fs::read(path).map_err(|source| Error::ReadImage {
        path: path.to_path_buf(),
        source,
    })?;

    decode(&data).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode image from memory
pub fn decode(data: &[u8]) -> Result<DynamicImage, imageproc::image::ImageError> {
    load_from_memory(data)
}
