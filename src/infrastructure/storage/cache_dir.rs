//! Cache directory path resolver

use std::path::{Path, PathBuf};

use crate::application::ports::PathResolver;
use crate::infrastructure::config::APP_DIR;

/// Resolves default recording paths under `$XDG_CACHE_HOME/recorder-bridge`
#[derive(Debug, Clone)]
pub struct CacheDirResolver {
    dir: PathBuf,
}

impl CacheDirResolver {
    pub fn new() -> Self {
        let dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR);
        Self { dir }
    }

    /// Create with custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for CacheDirResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PathResolver for CacheDirResolver {
    fn resolve_default_cache_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}
