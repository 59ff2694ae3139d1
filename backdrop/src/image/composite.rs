//! Canvas construction and compositing

use imageproc::image::{imageops, DynamicImage, GenericImageView, RgbImage};

use std::path::{Path, PathBuf};

use super::{decode, encode, PngCompression};
use crate::color::Color;
use crate::error::{Error, Result};

/// What to do with a source image that does not fit inside the canvas.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    /// Place the source at the origin and discard whatever falls outside the canvas.
    #[default]
    Clip,
    /// Refuse to composite.
    Error,
}

/// Everything needed to produce one output file.
#[derive(Debug, Clone)]
pub struct CompositeJob<'a> {
    pub source: &'a Path,
    pub dest: &'a Path,
    pub background: Color,
    pub width: u32,
    pub height: u32,
    pub overflow: Overflow,
    pub compression: PngCompression,
}

impl CompositeJob<'_> {
    /// Checked before touching the filesystem.
    fn validate(&self) -> Result<()> {
        if self.source.as_os_str().is_empty() {
            return Err(Error::validation("src", "is required"));
        }
        if self.dest.as_os_str().is_empty() {
            return Err(Error::validation("dest", "is required"));
        }
        if self.width == 0 {
            return Err(Error::validation("width", "must be greater than zero"));
        }
        if self.height == 0 {
            return Err(Error::validation("height", "must be greater than zero"));
        }
        check_canvas_size(self.width, self.height)
    }
}

/// Largest canvas we agree to allocate, 16383 × 16383 pixels.
pub const MAX_CANVAS_PIXELS: u64 = 0x3FFF * 0x3FFF;

/// Reject canvases whose pixel buffer would be unreasonably large or would not
/// fit in memory at all.
pub fn check_canvas_size(width: u32, height: u32) -> Result<()> {
    let pixels = u64::from(width) * u64::from(height);
    let fits_in_memory = pixels
        .checked_mul(4)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .is_some();

    if pixels > MAX_CANVAS_PIXELS || !fits_in_memory {
        return Err(Error::validation(
            "width",
            format!("canvas of {width}x{height} exceeds the {MAX_CANVAS_PIXELS} pixel limit"),
        ));
    }
    Ok(())
}

/// Composite `job.source` onto a fresh canvas and write the result to `job.dest` as PNG.
#[tracing::instrument(level = "debug", skip_all, fields(source = %job.source.display()))]
pub fn composite(job: &CompositeJob) -> Result<PathBuf> {
    job.validate()?;

    let source = decode::open(job.source)?;
    log::trace!(
        "Decoded {} ({}x{})",
        job.source.display(),
        source.width(),
        source.height()
    );

    if job.overflow == Overflow::Error && !fits(&source, job.width, job.height) {
        return Err(Error::Overflow {
            path: job.source.to_path_buf(),
            image: source.dimensions(),
            canvas: (job.width, job.height),
        });
    }

    let output = composite_onto_canvas(&source, job.background, job.width, job.height);
    encode::save_png(&output, job.dest, job.compression)?;

    log::debug!("Wrote {}", job.dest.display());
    Ok(job.dest.to_path_buf())
}

/// A `width` x `height` canvas filled with `background`, with `source` blended over it
/// at (0, 0). Parts of the source beyond the canvas are dropped; alpha is flattened
/// against the background, so the result is always 3 channels.
pub fn composite_onto_canvas(
    source: &DynamicImage,
    background: Color,
    width: u32,
    height: u32,
) -> RgbImage {
    let mut canvas = DynamicImage::ImageRgb8(blank_canvas(background, width, height)).into_rgba8();
    imageops::overlay(&mut canvas, &source.to_rgba8(), 0, 0);

    DynamicImage::ImageRgba8(canvas).into_rgb8()
}

/// The base layer: a solid 3-channel canvas.
pub fn blank_canvas(background: Color, width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, background.to_rgb())
}

fn fits(source: &DynamicImage, width: u32, height: u32) -> bool {
    source.width() <= width && source.height() <= height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use imageproc::image::{ImageFormat, Rgb, Rgba, RgbaImage};

    const WHITE: Color = Color::new(255, 255, 255);

    fn save_rgba(path: &Path, img: &RgbaImage, format: ImageFormat) {
        DynamicImage::ImageRgba8(img.clone())
            .save_with_format(path, format)
            .unwrap();
    }

    #[test]
    fn blank_canvas_is_filled() {
        let canvas = blank_canvas(Color::new(1, 2, 3), 3, 2);
        assert_eq!(canvas.dimensions(), (3, 2));
        assert!(canvas.pixels().all(|p| *p == Rgb([1, 2, 3])));
    }

    #[test]
    fn source_lands_at_top_left() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])));
        let out = composite_onto_canvas(&source, WHITE, 4, 3);

        assert_eq!(out.dimensions(), (4, 3));
        assert_eq!(*out.get_pixel(0, 0), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(1, 1), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(2, 0), Rgb([255, 255, 255]));
        assert_eq!(*out.get_pixel(0, 2), Rgb([255, 255, 255]));
        assert_eq!(*out.get_pixel(3, 2), Rgb([255, 255, 255]));
    }

    #[test]
    fn transparency_shows_the_background() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let out = composite_onto_canvas(&DynamicImage::ImageRgba8(img), Color::new(0, 0, 255), 2, 1);

        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(1, 0), Rgb([0, 0, 255]));
    }

    #[test]
    fn oversized_source_is_clipped() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])));
        let out = composite_onto_canvas(&source, WHITE, 4, 3);

        assert_eq!(out.dimensions(), (4, 3));
        assert!(out.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn composite_writes_png_even_with_jpg_name() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("b.png");
        let dest = tmp.path().join("b.jpg");
        save_rgba(&source, &RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255])), ImageFormat::Png);

        let job = CompositeJob {
            source: &source,
            dest: &dest,
            background: WHITE,
            width: 8,
            height: 6,
            overflow: Overflow::Clip,
            compression: PngCompression::Fast,
        };
        assert_eq!(composite(&job).unwrap(), dest);

        let bytes = std::fs::read(&dest).unwrap();
        assert_eq!(imageproc::image::guess_format(&bytes).unwrap(), ImageFormat::Png);

        let written = decode::decode(&bytes).unwrap();
        assert_eq!(written.color(), imageproc::image::ColorType::Rgb8);
        let written = written.into_rgb8();
        assert_eq!(written.dimensions(), (8, 6));
        assert_eq!(*written.get_pixel(1, 1), Rgb([0, 255, 0]));
        assert_eq!(*written.get_pixel(7, 5), Rgb([255, 255, 255]));
    }

    #[test]
    fn overflow_error_policy_refuses_large_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("big.png");
        let dest = tmp.path().join("out.png");
        save_rgba(&source, &RgbaImage::new(5, 5), ImageFormat::Png);

        let job = CompositeJob {
            source: &source,
            dest: &dest,
            background: WHITE,
            width: 4,
            height: 8,
            overflow: Overflow::Error,
            compression: PngCompression::Default,
        };
        let err = composite(&job).unwrap_err();

        assert!(matches!(err, Error::Overflow { image: (5, 5), canvas: (4, 8), .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn invalid_parameters_fail_before_io() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.png");
        let job = CompositeJob {
            // does not exist; validation must trip first
            source: Path::new("nowhere.png"),
            dest: &dest,
            background: WHITE,
            width: 0,
            height: 6,
            overflow: Overflow::Clip,
            compression: PngCompression::Default,
        };

        let err = composite(&job).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "width", .. }));

        let job = CompositeJob {
            source: Path::new(""),
            width: 1,
            ..job
        };
        let err = composite(&job).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "src", .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn huge_canvas_is_rejected_before_allocating() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.png");
        let job = CompositeJob {
            source: Path::new("nowhere.png"),
            dest: &dest,
            background: WHITE,
            width: u32::MAX,
            height: u32::MAX,
            overflow: Overflow::Clip,
            compression: PngCompression::Default,
        };

        let err = composite(&job).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "width", .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!dest.exists());

        assert!(check_canvas_size(0x3FFF, 0x3FFF).is_ok());
        assert!(check_canvas_size(0x3FFF, 0x4000).is_err());
        assert!(check_canvas_size(u32::MAX, 1).is_err());
    }

    #[test]
    fn undecodable_source_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("notes.txt");
        std::fs::write(&source, "not an image").unwrap();
        let dest = tmp.path().join("notes.png");

        let job = CompositeJob {
            source: &source,
            dest: &dest,
            background: WHITE,
            width: 4,
            height: 4,
            overflow: Overflow::Clip,
            compression: PngCompression::Default,
        };
        let err = composite(&job).unwrap_err();

        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn directory_source_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.png");
        let job = CompositeJob {
            source: tmp.path(),
            dest: &dest,
            background: WHITE,
            width: 4,
            height: 4,
            overflow: Overflow::Clip,
            compression: PngCompression::Default,
        };

        let err = composite(&job).unwrap_err();
        assert!(matches!(err, Error::ReadImage { .. }));
    }
}
