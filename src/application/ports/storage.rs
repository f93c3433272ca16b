//! Storage path resolver port interface

use std::path::PathBuf;

/// Port for locating the cache directory recordings default to
pub trait PathResolver: Send + Sync {
    /// Location of `file_name` inside the cache directory.
    fn resolve_default_cache_path(&self, file_name: &str) -> PathBuf;
}
