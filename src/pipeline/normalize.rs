use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::event::EventSink;
use crate::pipeline::fs_ops::move_dir;

/// Sector folders that survive pruning.
pub const KEEP_SECTORS: &[&str] = &["3921", "3938", "3380", "2925", "2617", "605", "426"];

pub const INDEX_FILES: &[&str] = &["toc.bin", "toc.txt"];

#[derive(Debug, Clone, Copy)]
pub enum MappingEntry {
    // old may be nested, `/`-separated
    Rename {
        old: &'static str,
        new: &'static str,
    },
    Remove { name: &'static str },
}

// Order matters: the two categories nested under 605 are hoisted out
// before 605 itself is dropped.
pub const SECTOR_MAPPING: &[MappingEntry] = &[
    MappingEntry::Rename {
        old: "426",
        new: "FieldPCSprites1",
    },
    MappingEntry::Rename {
        old: "605/FieldNPCSprites",
        new: "FieldNPCSprites",
    },
    MappingEntry::Rename {
        old: "605/MapTextures",
        new: "MapTextures",
    },
    MappingEntry::Remove { name: "605" },
    MappingEntry::Rename {
        old: "2617",
        new: "EnemyBattleSprites",
    },
    MappingEntry::Rename {
        old: "2925",
        new: "PCBattleSprites1",
    },
    MappingEntry::Rename {
        old: "3380",
        new: "PCBattleSprites2",
    },
    MappingEntry::Rename {
        old: "3921",
        new: "FieldPCSprites2",
    },
    MappingEntry::Rename {
        old: "3938",
        new: "FieldGearSprites",
    },
];

/// Prunes junk, renames sector folders to category names, and relocates
/// the finished tree.
pub struct DirectoryNormalizer {
    sink: EventSink,
}

impl DirectoryNormalizer {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    pub fn prune(&self, root: &Path, keep: &[&str]) -> Result<()> {
        for entry in fs::read_dir(root)
            .with_context(|| format!("Failed to read {}", root.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if keep.iter().any(|k| *k == name.to_string_lossy()) {
                continue;
            }
            self.sink.log(format!("Pruning {}", entry.path().display()));
            fs::remove_dir_all(entry.path())?;
        }

        for file in INDEX_FILES {
            let path = root.join(file);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    pub fn rename(&self, root: &Path, mapping: &[MappingEntry]) -> Result<()> {
        for entry in mapping {
            match entry {
                MappingEntry::Rename { old, new } => {
                    let src = root.join(old);
                    if !src.is_dir() {
                        // earlier stage produced nothing for this sector
                        continue;
                    }
                    self.sink.log(format!("Renaming {} -> {}", old, new));
                    move_dir(&src, &root.join(new))?;
                }
                MappingEntry::Remove { name } => {
                    let path = root.join(name);
                    if path.is_dir() {
                        fs::remove_dir_all(&path)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Hoist each grandchild directory into `dest`, renamed to the
    /// parent's numeric stem plus the grandchild's own name.
    pub fn flatten_grandchildren(&self, parent: &Path, dest: &Path) -> Result<()> {
        let stem = parent
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = stem.strip_suffix("_bin").unwrap_or(&stem).to_string();

        fs::create_dir_all(dest)?;
        for entry in fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let child_name = entry.file_name().to_string_lossy().into_owned();
            move_dir(&entry.path(), &dest.join(format!("{stem}{child_name}")))?;
        }
        fs::remove_dir_all(parent)?;
        Ok(())
    }

    /// Move each `*_bin` child of `from` into `dest`.
    pub fn collect_children(&self, from: &Path, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with("_bin") {
                continue;
            }
            move_dir(&entry.path(), &dest.join(&name))?;
        }
        Ok(())
    }

    pub fn relocate(&self, output: &Path, final_dir: &Path) -> Result<()> {
        self.sink.log(format!(
            "Relocating {} -> {}",
            output.display(),
            final_dir.display()
        ));
        move_dir(output, final_dir)
            .with_context(|| format!("Failed to relocate to {}", final_dir.display()))?;
        Ok(())
    }
}
