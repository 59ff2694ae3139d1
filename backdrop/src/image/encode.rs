//! PNG encoding

use imageproc::image::codecs::png::{CompressionType, FilterType, PngEncoder};
use imageproc::image::{ExtendedColorType, ImageEncoder, ImageError, ImageResult, RgbImage};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl From<PngCompression> for CompressionType {
    fn from(compression: PngCompression) -> Self {
        match compression {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

/// Compress an RGB image to PNG with the specified compression level
pub fn compress_to_png<W>(img: &RgbImage, writer: W, compression: PngCompression) -> ImageResult<()>
where
    W: Write,
{
    let encoder = PngEncoder::new_with_quality(writer, compression.into(), FilterType::Adaptive);

    encoder.write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgb8,
    )
}

/// Encode `img` as PNG into `path`, creating or truncating the file.
pub fn save_png(img: &RgbImage, path: &Path, compression: PngCompression) -> Result<()> {
    let write_err = |source: ImageError| Error::WriteImage {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|e| write_err(e.into()))?;
    let mut writer = BufWriter::new(file);

    compress_to_png(img, &mut writer, compression).map_err(write_err)?;
    writer.flush().map_err(|e| write_err(e.into()))?;

    log::trace!("Encoded {}", path.display());
    Ok(())
}
