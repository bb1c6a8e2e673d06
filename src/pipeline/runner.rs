use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::event::{EventSink, RipEvent};
use crate::pipeline::batch::{self, Scope};
use crate::pipeline::external::BinBatchDecoder;
use crate::pipeline::formats::{self, DispatchOptions};

/// Runs one category's stages (external passes, decode, cleanup) on a
/// bounded pool. `install` + `par_iter` joins every task before the next
/// stage reads the directory.
pub struct BatchJobRunner {
    pool: rayon::ThreadPool,
    sink: EventSink,
    options: DispatchOptions,
}

// Scratch extensions swept once a category's PNGs exist.
pub const SCRATCH_EXTENSIONS: &[&str] = &["meta", "dec", "bak", "clut", "rgba"];

impl BatchJobRunner {
    pub fn new(threads: usize, sink: EventSink, options: DispatchOptions) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()
            .context("Failed to build worker pool")?;
        Ok(Self {
            pool,
            sink,
            options,
        })
    }

    pub fn run_external_pass(
        &self,
        decoder: &dyn BinBatchDecoder,
        dir: &Path,
        batch_size: usize,
        scope: Scope,
    ) {
        let files = batch::enumerate(dir, &["bin"], scope);
        if files.is_empty() {
            return;
        }
        let batches = batch::batch(files, batch_size);
        self.dispatch_external(decoder, &batches);
    }

    pub fn dispatch_external(&self, decoder: &dyn BinBatchDecoder, batches: &[Vec<PathBuf>]) {
        self.pool.install(|| {
            // a failed batch is reported and never stops its siblings
            batches.par_iter().for_each(|group| {
                let label = group
                    .first()
                    .cloned()
                    .unwrap_or_default();
                self.sink.emit(RipEvent::JobStarted(label.clone()));
                match decoder.decode_bin_batch(group) {
                    Ok(()) => self.sink.emit(RipEvent::JobSucceeded(label)),
                    Err(e) => self.sink.emit(RipEvent::JobFailed {
                        path: label,
                        error: format!("{e:#}"),
                    }),
                }
            });
        });
    }

    /// Decode every `.clut`/`.rgba` under `dir`, deleting each
    /// intermediate once its PNG exists.
    pub fn decode_stage(&self, dir: &Path) {
        let files = batch::enumerate(dir, &["clut", "rgba"], Scope::Recursive);

        self.pool.install(|| {
            files.par_iter().for_each(|path| {
                let png_path = path.with_extension("png");
                if png_path.exists() {
                    // already decoded on a previous run
                    self.sink.emit(RipEvent::JobSkipped(path.clone()));
                    let _ = fs::remove_file(path);
                    return;
                }

                self.sink.emit(RipEvent::JobStarted(path.clone()));
                match formats::dispatch(path, &self.options) {
                    Ok(Some(png)) => {
                        if png.exists() {
                            let _ = fs::remove_file(path);
                        }
                        self.sink.emit(RipEvent::JobSucceeded(path.clone()));
                    }
                    Ok(None) => {}
                    Err(e) => self.sink.emit(RipEvent::JobFailed {
                        path: path.clone(),
                        error: format!("{e:#}"),
                    }),
                }
            });
        });
    }

    pub fn cleanup(&self, dir: &Path, extensions: &[&str]) {
        for path in batch::enumerate(dir, extensions, Scope::Recursive) {
            if let Err(e) = fs::remove_file(&path) {
                self.sink
                    .log(format!("Failed to delete {}: {}", path.display(), e));
            }
        }
    }
}
