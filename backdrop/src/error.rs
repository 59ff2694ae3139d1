use std::path::PathBuf;

use imageproc::image::ImageError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad failure categories, used by callers that only care about what went wrong
/// rather than where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The config file is missing or is not the JSON we expect.
    Parse,
    /// A required value is absent, empty, zero or malformed.
    Validation,
    /// Filesystem or image codec failure.
    Io,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read config {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] serde_json::Error),

    #[error("invalid `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("failed to resolve working directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    #[error("failed to list {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    WriteImage {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error(
        "{} is {}x{}, larger than the {}x{} canvas",
        .path.display(),
        .image.0,
        .image.1,
        .canvas.0,
        .canvas.1
    )]
    Overflow {
        path: PathBuf,
        image: (u32, u32),
        canvas: (u32, u32),
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ReadConfig { .. } | Error::ParseConfig(_) => ErrorKind::Parse,
            Error::Validation { .. } | Error::Overflow { .. } => ErrorKind::Validation,
            Error::WorkingDir(_)
            | Error::ListDir { .. }
            | Error::CreateDir { .. }
            | Error::ReadImage { .. }
            | Error::Decode { .. }
            | Error::WriteImage { .. }
            | Error::WorkerPool(_) => ErrorKind::Io,
        }
    }
}
