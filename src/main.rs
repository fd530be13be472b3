use anyhow::Result;
use clap::Parser;
use crossbeam_channel::unbounded;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use dmi_dirfix::config::Config;
use dmi_dirfix::event::BatchMsg;
use dmi_dirfix::pipeline_worker::BatchWorker;

/// Turns single-direction smoothing states in DMI icon sheets into
/// four-direction states.
#[derive(Parser, Debug)]
#[command(name = "dmi-dirfix", version)]
struct Cli {
    /// Directory scanned for input icons.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory the fixed icons are written to, under the same names.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file. Defaults to the user config directory when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads (1 = sequential, 0 = one per core).
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// File extension to pick up.
    #[arg(long)]
    extension: Option<String>,

    /// Keep attributes other than dirs/frames/delay in the written descriptor.
    #[arg(long)]
    preserve_attributes: bool,

    /// Print the effective config as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(0) => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(input) = &cli.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if let Some(threads) = cli.threads {
        config.thread_count = threads;
    }
    if let Some(extension) = &cli.extension {
        config.extension = extension.clone();
    }
    if cli.preserve_attributes {
        config.preserve_extra_attributes = true;
    }

    Ok(config)
}

/// Runs the batch and returns the number of files that failed.
fn run(cli: Cli) -> Result<usize> {
    let config = build_config(&cli)?;

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(0);
    }

    debug!(?config, "effective config");

    let (tx, rx) = unbounded();
    let worker = BatchWorker::new(tx);
    let handle = worker.start(config);
    // Only the worker's clones keep the channel open now
    drop(worker);

    let mut failed = 0;
    for msg in rx {
        match msg {
            BatchMsg::Started { input_dir, total } => {
                info!("Found {} icons in {}", total, input_dir.display());
            }
            BatchMsg::NoInput(dir) => {
                warn!("No matching files found in {}", dir.display());
            }
            BatchMsg::FileStarted(name) => info!("Fixing {}...", name),
            BatchMsg::FileFixed { name, elapsed } => {
                info!("Fixed {} in {:.2}s", name, elapsed.as_secs_f64());
            }
            BatchMsg::FileFailed { name, error } => {
                error!("Failed to fix {}: {}", name, error);
            }
            BatchMsg::Progress(done, total) => debug!("{}/{}", done, total),
            BatchMsg::Completed { fixed, failed: count } => {
                info!("Completed with {} fixed and {} failed", fixed, count);
                failed = count;
            }
            BatchMsg::Failed(e) => {
                error!("{}", e);
                failed += 1;
            }
        }
    }

    if handle.join().is_err() {
        anyhow::bail!("Batch worker panicked");
    }

    Ok(failed)
}
