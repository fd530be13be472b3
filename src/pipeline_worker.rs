// Batch worker: fixes every DMI in a directory, reporting progress over a channel

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::config::Config;
use crate::event::BatchMsg;
use crate::pipeline::fs_ops::{ensure_dir, find_input_files};
use crate::pipeline::{FixOptions, fix_dmi_file};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub fixed: usize,
    pub failed: usize,
}

pub struct BatchWorker {
    tx: Sender<BatchMsg>,
}

impl BatchWorker {
    pub fn new(tx: Sender<BatchMsg>) -> Self {
        Self { tx }
    }

    pub fn start(&self, config: Config) -> JoinHandle<Option<BatchSummary>> {
        let tx = self.tx.clone();

        thread::spawn(move || match Self::run_batch(&config, &tx) {
            Ok(summary) => Some(summary),
            Err(e) => {
                let _ = tx.send(BatchMsg::Failed(format!("{:#}", e)));
                None
            }
        })
    }

    /// Processes the whole input directory on the calling thread (or the
    /// rayon pool when `thread_count != 1`). A failing file is reported and
    /// counted; it never stops the batch.
    pub fn run_batch(config: &Config, tx: &Sender<BatchMsg>) -> Result<BatchSummary> {
        let files = find_input_files(&config.input_dir, &config.extension).with_context(|| {
            format!("Failed to scan input directory {}", config.input_dir.display())
        })?;

        let total = files.len();
        if total == 0 {
            let _ = tx.send(BatchMsg::NoInput(config.input_dir.clone()));
            return Ok(BatchSummary::default());
        }

        ensure_dir(&config.output_dir).with_context(|| {
            format!("Failed to create output directory {}", config.output_dir.display())
        })?;

        let _ = tx.send(BatchMsg::Started {
            input_dir: config.input_dir.clone(),
            total,
        });

        let options = config.fix_options();
        let done = AtomicUsize::new(0);
        let fixed = AtomicUsize::new(0);

        let process = |path: &PathBuf| {
            if Self::process_file(path, &config.output_dir, &options, tx) {
                fixed.fetch_add(1, Ordering::Relaxed);
            }
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            let _ = tx.send(BatchMsg::Progress(finished, total));
        };

        if config.thread_count == 1 {
            files.iter().for_each(&process);
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.thread_count)
                .build()
                .context("Failed to build worker pool")?;
            pool.install(|| files.par_iter().for_each(&process));
        }

        let fixed = fixed.into_inner();
        let summary = BatchSummary {
            total,
            fixed,
            failed: total - fixed,
        };

        let _ = tx.send(BatchMsg::Completed {
            fixed: summary.fixed,
            failed: summary.failed,
        });
        Ok(summary)
    }

    fn process_file(
        input: &Path,
        output_dir: &Path,
        options: &FixOptions,
        tx: &Sender<BatchMsg>,
    ) -> bool {
        let Some(file_name) = input.file_name() else {
            return false;
        };
        let name = file_name.to_string_lossy().into_owned();
        let _ = tx.send(BatchMsg::FileStarted(name.clone()));

        let start = Instant::now();
        match fix_dmi_file(input, &output_dir.join(file_name), options) {
            Ok(_) => {
                let _ = tx.send(BatchMsg::FileFixed {
                    name,
                    elapsed: start.elapsed(),
                });
                true
            }
            Err(e) => {
                let _ = tx.send(BatchMsg::FileFailed {
                    name,
                    error: e.to_string(),
                });
                false
            }
        }
    }
}
