use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};

/// Absolute locations for a run, anchored at the directory holding the config file
/// so that a config behaves the same regardless of where the tool is invoked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub config_file: PathBuf,
    pub base_dir: PathBuf,
    pub image_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl ResolvedPaths {
    pub fn resolve(config_path: &Path, config: &Config) -> Result<Self> {
        let config_file = std::path::absolute(config_path).map_err(Error::WorkingDir)?;
        let base_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self::from_base(config_file, base_dir, config))
    }

    fn from_base(config_file: PathBuf, base_dir: PathBuf, config: &Config) -> Self {
        // `join` keeps absolute `imageDir`/`outDir` values as they are
        let image_dir = base_dir.join(&config.image_dir);
        let out_dir = base_dir.join(&config.out_dir);

        Self {
            config_file,
            base_dir,
            image_dir,
            out_dir,
        }
    }
}

/// Create `dir` and any missing parents. An existing directory is fine.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
