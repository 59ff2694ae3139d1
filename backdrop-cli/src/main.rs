use anyhow::{Context, Result};
use clap::builder::styling::AnsiColor;
use clap::{CommandFactory, Parser};
use supports_color::Stream;

use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use backdrop::RunOptions;

const MISSING_CONFIG: &str = "Missing <config_file>. See --help for help";

#[derive(Parser, Debug)]
#[command(name = "backdrop")]
#[command(about = "Composite a directory of images onto fixed-size solid canvases", long_about = None)]
#[command(version)]
#[command(after_help = "Examples:\n  backdrop ./my_project.json\n  backdrop -j 4 ./my_project.json")]
struct Args {
    /// JSON config with imageDir, outDir, width, height and backgroundColor
    #[arg(value_name = "CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Number of images to composite in parallel (defaults to the config's
    /// concurrency, then the number of logical CPUs)
    #[arg(short, long, value_name = "N")]
    jobs: Option<NonZeroUsize>,

    /// Verbose output (-v for progress, -vv for per-file detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, default_value_t, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    let color = supports_color::on(Stream::Stderr).is_some();
    let status = run(&args, &mut std::io::stderr(), color)?;

    Ok(ExitCode::from(status))
}

/// Returns the process exit status. Usage errors are written to `stderr` and
/// reported as status 1 before anything touches the filesystem.
fn run(args: &Args, stderr: &mut impl Write, color: bool) -> Result<u8> {
    let Some(config_file) = args.config_file.as_deref() else {
        writeln!(stderr, "{}", paint_red(MISSING_CONFIG, color))?;
        writeln!(stderr, "\n{}", Args::command().render_usage())?;
        return Ok(1);
    };

    let options = RunOptions {
        jobs: args.jobs.map(NonZeroUsize::get),
    };

    let report = backdrop::run(config_file, &options)
        .with_context(|| format!("Failed to process `{}`", config_file.display()))?;

    log::info!(
        "Done: {} images in {}",
        report.composited,
        report.out_dir.display()
    );

    Ok(0)
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, _) => log::LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn paint_red(message: &str, color: bool) -> String {
    if color {
        let red = AnsiColor::Red.on_default();
        format!("{}{message}{}", red.render(), red.render_reset())
    } else {
        message.to_string()
    }
}
