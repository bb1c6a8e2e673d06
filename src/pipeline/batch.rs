use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which part of a sector directory an enumeration pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    TopLevel,
    // subdirectory files only, at any depth
    Nested,
    Recursive,
}

/// Enumerate files with one of the given extensions (case-insensitive),
/// sorted so batch order is deterministic.
pub fn enumerate(dir: &Path, extensions: &[&str], scope: Scope) -> Vec<PathBuf> {
    if !dir.is_dir() {
        // absent output from an earlier stage is not an error here
        return Vec::new();
    }

    let mut walker = WalkDir::new(dir);
    walker = match scope {
        Scope::TopLevel => walker.max_depth(1),
        Scope::Nested => walker.min_depth(2),
        Scope::Recursive => walker,
    };

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    extensions.iter().any(|want| *want == ext)
                })
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}

/// Contiguous order-preserving partition: every group has `size` elements
/// except possibly the last.
pub fn batch(files: Vec<PathBuf>, size: usize) -> Vec<Vec<PathBuf>> {
    let size = size.max(1);
    let mut batches = Vec::with_capacity(files.len().div_ceil(size));
    let mut iter = files.into_iter();
    loop {
        let group: Vec<PathBuf> = iter.by_ref().take(size).collect();
        if group.is_empty() {
            break;
        }
        batches.push(group);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fake_paths(count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| PathBuf::from(format!("{:04}.bin", i)))
            .collect()
    }

    #[test]
    fn test_batch_sizes_and_coverage() {
        // 1050 files at batch size 500 -> 500, 500, 50.
        let files = fake_paths(1050);
        let batches = batch(files.clone(), 500);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 500);
        assert_eq!(batches[1].len(), 500);
        assert_eq!(batches[2].len(), 50);

        let rejoined: Vec<PathBuf> = batches.into_iter().flatten().collect();
        assert_eq!(rejoined, files);
    }

    #[test]
    fn test_batch_exact_multiple() {
        let batches = batch(fake_paths(400), 200);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 200));
    }

    #[test]
    fn test_batch_empty_and_zero_size() {
        assert!(batch(Vec::new(), 500).is_empty());
        // a zero batch size degrades to per-file batches
        assert_eq!(batch(fake_paths(3), 0).len(), 3);
    }

    #[test]
    fn test_enumerate_scopes() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("100_bin").join("inner");
        fs::create_dir_all(&sub).unwrap();

        fs::write(dir.path().join("b.bin"), b"x").unwrap();
        fs::write(dir.path().join("a.BIN"), b"x").unwrap();
        fs::write(dir.path().join("skip.txt"), b"x").unwrap();
        fs::write(sub.join("c.bin"), b"x").unwrap();

        let top = enumerate(dir.path(), &["bin"], Scope::TopLevel);
        assert_eq!(top.len(), 2);
        // sorted order
        assert!(top[0].ends_with("a.BIN"));
        assert!(top[1].ends_with("b.bin"));

        let nested = enumerate(dir.path(), &["bin"], Scope::Nested);
        assert_eq!(nested.len(), 1);
        assert!(nested[0].ends_with("c.bin"));

        let all = enumerate(dir.path(), &["bin"], Scope::Recursive);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_enumerate_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let ghost = dir.path().join("never-made");
        assert!(enumerate(&ghost, &["bin"], Scope::Recursive).is_empty());
    }

    #[test]
    fn test_enumerate_multiple_extensions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.clut"), b"x").unwrap();
        fs::write(dir.path().join("b.rgba"), b"x").unwrap();
        fs::write(dir.path().join("c.meta"), b"x").unwrap();

        let files = enumerate(dir.path(), &["clut", "rgba"], Scope::TopLevel);
        assert_eq!(files.len(), 2);
    }
}
