use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RipConfig;
use crate::event::{EventSink, RipEvent};
use crate::pipeline::batch::Scope;
use crate::pipeline::external::{BinBatchDecoder, ScriptDecoder, check_tool_available};
use crate::pipeline::formats::{DispatchOptions, TransparencyMode};
use crate::pipeline::fs_ops::ensure_dir;
use crate::pipeline::normalize::{DirectoryNormalizer, KEEP_SECTORS, SECTOR_MAPPING};
use crate::pipeline::runner::BatchJobRunner;

struct ExternalPass {
    script: &'static str,
    batch_size: usize,
    scope: Scope,
}

// How a category's per-source output directories are gathered up before
// normalization.
enum Collect {
    Flatten(&'static str),
    Move(&'static str),
}

struct SpriteCategory {
    name: &'static str,
    sectors: &'static [&'static str],
    passes: &'static [ExternalPass],
    collect: Option<Collect>,
    scratch: &'static [&'static str],
    // relative to the extracted root; present means already finished
    marker: Option<&'static str>,
}

const CATEGORIES: &[SpriteCategory] = &[
    SpriteCategory {
        name: "battle sprites",
        sectors: &["3921", "3938", "3380", "2925", "2617"],
        passes: &[ExternalPass {
            script: "xeno_battle_2d.php",
            batch_size: 1,
            scope: Scope::TopLevel,
        }],
        collect: None,
        scratch: &["meta", "clut", "rgba"],
        marker: None,
    },
    SpriteCategory {
        name: "field NPC sprites",
        sectors: &["605"],
        passes: &[
            ExternalPass {
                script: "xeno_map2battle.php",
                batch_size: 500,
                scope: Scope::TopLevel,
            },
            ExternalPass {
                script: "xeno_battle_2d.php",
                batch_size: 500,
                scope: Scope::Nested,
            },
        ],
        collect: Some(Collect::Flatten("FieldNPCSprites")),
        scratch: &["meta", "dec", "clut", "rgba"],
        marker: Some("605/FieldNPCSprites"),
    },
    SpriteCategory {
        name: "map textures",
        sectors: &["605"],
        passes: &[ExternalPass {
            script: "xeno_1201_vram.php",
            batch_size: 200,
            scope: Scope::TopLevel,
        }],
        collect: Some(Collect::Move("MapTextures")),
        scratch: &["clut", "rgba"],
        marker: Some("605/MapTextures"),
    },
    SpriteCategory {
        name: "field player sprites",
        sectors: &["426"],
        passes: &[
            ExternalPass {
                script: "xeno_decode.php",
                batch_size: 200,
                scope: Scope::TopLevel,
            },
            ExternalPass {
                script: "xeno_battle_2d.php",
                batch_size: 1,
                scope: Scope::TopLevel,
            },
        ],
        collect: None,
        scratch: &["bak", "meta", "clut", "rgba"],
        marker: None,
    },
];

const ISO_CONVERT_SCRIPT: &str = "psxbin2iso.php";
const ISO_UNPACK_SCRIPT: &str = "psxiso_hidden.php";

/// Sequences the whole rip: ISO extraction, per-category sprite decode,
/// directory normalization.
pub struct PipelineDriver {
    config: RipConfig,
    sink: EventSink,
}

impl PipelineDriver {
    pub fn new(config: RipConfig, sink: EventSink) -> Self {
        Self { config, sink }
    }

    pub fn run(&self, disc_image: Option<&Path>) -> Result<()> {
        let root = self.config.extracted_root();

        // The only fatal checks: everything past this point degrades to
        // missing output, never an abort.
        if !root.is_dir() {
            let Some(image) = disc_image else {
                bail!(
                    "No extracted data at {} and no disc image given",
                    root.display()
                );
            };
            if !image.is_file() {
                bail!("Disc image not found: {}", image.display());
            }
            check_tool_available(&self.config.interpreter)?;
            self.extract_iso(image)?;
        } else {
            self.sink.emit(RipEvent::StageSkipped {
                stage: "extract".to_string(),
                marker: root.clone(),
            });
        }

        if self.config.final_dir.is_dir() {
            self.sink.emit(RipEvent::StageSkipped {
                stage: "rip".to_string(),
                marker: self.config.final_dir.clone(),
            });
            return Ok(());
        }

        let options = DispatchOptions::new()
            .with_transparency(if self.config.legacy_corner_key {
                TransparencyMode::CornerKey
            } else {
                TransparencyMode::PreserveAlpha
            })
            .with_keep_bmp(self.config.keep_bmp);
        let runner =
            BatchJobRunner::new(self.config.worker_threads(), self.sink.clone(), options)?;
        let normalizer = DirectoryNormalizer::new(self.sink.clone());

        for category in CATEGORIES {
            self.run_category(category, &root, &runner, &normalizer);
        }

        self.normalize(&root, &normalizer)?;
        Ok(())
    }

    fn extract_iso(&self, disc_image: &Path) -> Result<()> {
        self.sink.emit(RipEvent::StageStarted("extract".to_string()));
        ensure_dir(&self.config.output_dir)?;

        let local_bin = self.config.output_dir.join("XG.bin");
        fs::copy(disc_image, &local_bin).with_context(|| {
            format!("Failed to copy disc image {}", disc_image.display())
        })?;

        self.sink.log("Converting bin file to iso file");
        self.run_script(ISO_CONVERT_SCRIPT, &local_bin)?;

        let iso = self.config.output_dir.join("XG.bin.iso");
        if !iso.is_file() {
            bail!(
                "{} was not produced; check the external tooling",
                iso.display()
            );
        }
        let _ = fs::remove_file(&local_bin);

        self.sink.log("Extracting ISO contents");
        self.run_script(ISO_UNPACK_SCRIPT, &iso)?;
        let _ = fs::remove_file(&iso);

        self.sink
            .emit(RipEvent::StageCompleted("extract".to_string()));
        Ok(())
    }

    fn run_script(&self, script: &str, path: &Path) -> Result<()> {
        let decoder = ScriptDecoder::new(
            self.config.interpreter.clone(),
            self.config.tools_dir.join(script),
        );
        decoder.decode_bin_batch(&[path.to_path_buf()])
    }

    fn run_category(
        &self,
        category: &SpriteCategory,
        root: &Path,
        runner: &BatchJobRunner,
        normalizer: &DirectoryNormalizer,
    ) {
        if let Some(marker) = category.marker {
            let marker_path = root.join(marker);
            if marker_path.is_dir() {
                self.sink.emit(RipEvent::StageSkipped {
                    stage: category.name.to_string(),
                    marker: marker_path,
                });
                return;
            }
        }

        self.sink
            .emit(RipEvent::StageStarted(category.name.to_string()));

        for sector in category.sectors {
            let dir = root.join(sector);
            if !dir.is_dir() {
                // the extraction produced nothing for this sector
                continue;
            }

            for pass in category.passes {
                let decoder = ScriptDecoder::new(
                    self.config.interpreter.clone(),
                    self.config.tools_dir.join(pass.script),
                );
                runner.run_external_pass(&decoder, &dir, pass.batch_size, pass.scope);
            }

            runner.decode_stage(&dir);

            if let Err(e) = self.collect(category, &dir, normalizer) {
                self.sink.emit(RipEvent::JobFailed {
                    path: dir.clone(),
                    error: format!("{e:#}"),
                });
            }

            runner.cleanup(&dir, category.scratch);
        }

        self.sink
            .emit(RipEvent::StageCompleted(category.name.to_string()));
    }

    fn collect(
        &self,
        category: &SpriteCategory,
        dir: &Path,
        normalizer: &DirectoryNormalizer,
    ) -> Result<()> {
        match &category.collect {
            Some(Collect::Flatten(into)) => {
                let dest = dir.join(into);
                for source_dir in bin_dirs(dir)? {
                    normalizer.flatten_grandchildren(&source_dir, &dest)?;
                }
            }
            Some(Collect::Move(into)) => {
                normalizer.collect_children(dir, &dir.join(into))?;
            }
            None => {}
        }
        Ok(())
    }

    fn normalize(&self, root: &Path, normalizer: &DirectoryNormalizer) -> Result<()> {
        self.sink
            .emit(RipEvent::StageStarted("normalize".to_string()));
        normalizer.prune(root, KEEP_SECTORS)?;
        normalizer.rename(root, SECTOR_MAPPING)?;
        normalizer.relocate(root, &self.config.final_dir)?;
        self.sink
            .emit(RipEvent::StageCompleted("normalize".to_string()));
        Ok(())
    }
}

// Per-source output directories an external pass unpacked (`<stem>_bin`).
fn bin_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir()
            && entry.file_name().to_string_lossy().ends_with("_bin")
        {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
