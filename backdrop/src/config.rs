use serde::{de, Deserialize, Deserializer};

use std::fs;
use std::path::{Path, PathBuf};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::image::{self, Overflow, PngCompression};

/// A validated run configuration. Paths are still relative to the config file;
/// see [`crate::paths::ResolvedPaths`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub image_dir: PathBuf,
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    /// Worker pool size; `None` means one worker per logical CPU.
    pub concurrency: Option<usize>,
    pub overflow: Overflow,
    pub compression: PngCompression,
}

// Required keys are optional here so that a missing key is reported as a
// validation failure rather than a JSON error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    image_dir: Option<String>,
    out_dir: Option<String>,
    #[serde(default, deserialize_with = "whole_number")]
    width: Option<u32>,
    #[serde(default, deserialize_with = "whole_number")]
    height: Option<u32>,
    background_color: Option<String>,
    concurrency: Option<usize>,
    #[serde(default)]
    overflow: Overflow,
    #[serde(default)]
    compression: PngCompression,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading config from {}", path.display());

        let contents = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(contents)?;
        raw.validate()
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config> {
        let image_dir = required_path("imageDir", self.image_dir)?;
        let out_dir = required_path("outDir", self.out_dir)?;
        let width = required_dimension("width", self.width)?;
        let height = required_dimension("height", self.height)?;
        image::check_canvas_size(width, height)?;

        let background = match self.background_color.as_deref().map(str::trim) {
            None | Some("") => return Err(Error::validation("backgroundColor", "is required")),
            Some(s) => s
                .parse::<Color>()
                .map_err(|e| Error::validation("backgroundColor", e.to_string()))?,
        };

        if self.concurrency == Some(0) {
            return Err(Error::validation(
                "concurrency",
                "must be greater than zero",
            ));
        }

        Ok(Config {
            image_dir,
            out_dir,
            width,
            height,
            background,
            concurrency: self.concurrency,
            overflow: self.overflow,
            compression: self.compression,
        })
    }
}

fn required_path(field: &'static str, value: Option<String>) -> Result<PathBuf> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(PathBuf::from(s)),
        _ => Err(Error::validation(field, "is required")),
    }
}

fn required_dimension(field: &'static str, value: Option<u32>) -> Result<u32> {
    match value {
        None => Err(Error::validation(field, "is required")),
        Some(0) => Err(Error::validation(field, "must be greater than zero")),
        Some(n) => Ok(n),
    }
}

/// JSON has no integer type, so `800.0` is accepted as `800`. Fractions,
/// negatives and values past `u32::MAX` are rejected.
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(n) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) {
        Ok(Some(n as u32))
    } else {
        Err(de::Error::custom(format!(
            "expected a non-negative whole number, found {n}"
        )))
    }
}
