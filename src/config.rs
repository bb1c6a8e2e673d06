use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

// Name of the directory the ISO extraction scripts unpack into.
pub const EXTRACTED_DIR: &str = "XG_bin_iso";

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RipConfig {
    pub output_dir: PathBuf,
    /// Directory holding the external decode scripts.
    pub tools_dir: PathBuf,
    /// Final consumption path the normalized tree is relocated to.
    pub final_dir: PathBuf,
    pub interpreter: String,
    /// Worker threads; 0 means logical processors minus one.
    pub threads: usize,
    pub legacy_corner_key: bool,
    pub keep_bmp: bool,
}

impl Default for RipConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("Output"),
            tools_dir: PathBuf::from("Tools"),
            final_dir: PathBuf::from("XenoRip"),
            interpreter: "php".to_string(),
            threads: 0,
            legacy_corner_key: false,
            keep_bmp: false,
        }
    }
}

impl RipConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn extracted_root(&self) -> PathBuf {
        self.output_dir.join(EXTRACTED_DIR)
    }

    pub fn worker_threads(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4);
            cpus.saturating_sub(1).max(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RipConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("Output"));
        assert_eq!(config.interpreter, "php");
        assert_eq!(config.extracted_root(), PathBuf::from("Output/XG_bin_iso"));
    }

    #[test]
    fn test_worker_threads_floor() {
        let config = RipConfig {
            threads: 3,
            ..RipConfig::default()
        };
        assert_eq!(config.worker_threads(), 3);

        let auto = RipConfig::default();
        assert!(auto.worker_threads() >= 1);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xenorip.toml");
        fs::write(
            &path,
            "output_dir = \"out\"\ninterpreter = \"php8\"\nthreads = 2\nlegacy_corner_key = true\n",
        )
        .unwrap();

        let config = RipConfig::load(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.interpreter, "php8");
        assert_eq!(config.threads, 2);
        assert!(config.legacy_corner_key);
        // untouched fields keep their defaults
        assert_eq!(config.final_dir, PathBuf::from("XenoRip"));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xenorip.toml");
        fs::write(&path, "outptu_dir = \"typo\"\n").unwrap();
        assert!(RipConfig::load(&path).is_err());
    }
}
