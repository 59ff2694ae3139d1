use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rayon::ThreadPool;

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Result;
use crate::image::{self, CompositeJob};
use crate::listing::{self, ImageEntry};
use crate::paths::{self, ResolvedPaths};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Worker pool size. Takes precedence over the config's `concurrency`.
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub composited: usize,
    pub out_dir: PathBuf,
}

/// Load the config at `config_path` and composite every entry of its image
/// directory into its output directory.
///
/// Nothing is written unless the config is valid and the image directory can be
/// listed. Once compositing starts every entry is attempted; if any fail, the
/// first failure in listing order is returned and the successful outputs stay
/// on disk.
pub fn run(config_path: &Path, options: &RunOptions) -> Result<BatchReport> {
    let config = Config::load(config_path)?;
    let resolved = ResolvedPaths::resolve(config_path, &config)?;

    log::info!(
        "Compositing {} onto {}x{} {} canvases into {}",
        resolved.image_dir.display(),
        config.width,
        config.height,
        config.background,
        resolved.out_dir.display()
    );

    let entries = listing::list_entries(&resolved.image_dir, &resolved.out_dir)?;
    paths::prepare_output_dir(&resolved.out_dir)?;

    let composited = process_entries(&entries, &config, pool_size(options, &config))?;

    log::info!("Composited {composited} images");

    Ok(BatchReport {
        composited,
        out_dir: resolved.out_dir,
    })
}

/// Composite `entries` on a pool of `jobs` workers (one per logical CPU when `None`)
/// and wait for all of them.
pub fn process_entries(
    entries: &[ImageEntry],
    config: &Config,
    jobs: Option<usize>,
) -> Result<usize> {
    if entries.is_empty() {
        return Ok(0);
    }

    let pool = build_pool(jobs)?;
    log::debug!(
        "Processing {} entries with {} threads",
        entries.len(),
        pool.current_num_threads()
    );

    // collecting into a Vec, not a Result, so one failure doesn't stop the rest
    let results: Vec<Result<PathBuf>> = pool.install(|| {
        entries
            .par_iter()
            .map(|entry| image::composite(&job_for(entry, config)))
            .collect()
    });

    let mut composited = 0;
    let mut first_error = None;

    for (entry, result) in entries.iter().zip(results) {
        match result {
            Ok(_) => composited += 1,
            Err(e) => {
                log::error!("Failed to composite {}: {e}", entry.source.display());
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(composited),
    }
}

/// `--jobs` wins over the config's `concurrency`; `None` leaves it to rayon.
fn pool_size(options: &RunOptions, config: &Config) -> Option<usize> {
    options.jobs.or(config.concurrency)
}

fn job_for<'a>(entry: &'a ImageEntry, config: &Config) -> CompositeJob<'a> {
    CompositeJob {
        source: &entry.source,
        dest: &entry.dest,
        background: config.background,
        width: config.width,
        height: config.height,
        overflow: config.overflow,
        compression: config.compression,
    }
}

fn build_pool(jobs: Option<usize>) -> Result<ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        // 0 lets rayon pick the number of logical CPUs
        .num_threads(jobs.unwrap_or(0))
        .thread_name(|i| format!("backdrop-worker-{i}"))
        .build()?;
    Ok(pool)
}
