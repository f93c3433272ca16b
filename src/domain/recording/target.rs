//! Recording destination value objects

use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::error::SessionError;

/// Sentinel a host passes to record into the default cache location
pub const DEFAULT_DESTINATION: &str = "DEFAULT";

/// Base name of the default recording file; the extension follows the output format
pub const DEFAULT_FILE_STEM: &str = "sound";

/// Where the host asked the recording to go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The default file in the cache directory
    Default,
    /// A `file://` URI
    FileUri(PathBuf),
    /// A remote URI, which a recorder cannot write to
    Remote(String),
    /// A path relative to the cache directory
    Relative(PathBuf),
    /// An absolute filesystem path
    Absolute(PathBuf),
}

impl Destination {
    /// Classify a host-supplied destination string
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == DEFAULT_DESTINATION {
            return Self::Default;
        }
        if let Some(path) = raw.strip_prefix("file://") {
            return Self::FileUri(PathBuf::from(path));
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Self::Remote(raw.to_string());
        }
        let path = PathBuf::from(raw);
        if path.is_absolute() {
            Self::Absolute(path)
        } else {
            Self::Relative(path)
        }
    }

    /// Resolve to a concrete output target.
    ///
    /// `cache_path` maps a file name to its location in the cache directory.
    pub fn resolve<F>(
        self,
        default_file_name: &str,
        cache_path: F,
    ) -> Result<OutputTarget, SessionError>
    where
        F: Fn(&str) -> PathBuf,
    {
        let path = match self {
            Self::Default => cache_path(default_file_name),
            Self::FileUri(path) | Self::Absolute(path) => path,
            Self::Relative(path) => cache_path(&path.to_string_lossy()),
            Self::Remote(uri) => {
                return Err(SessionError::RecorderInitError(format!(
                    "cannot record to remote destination {}",
                    uri
                )))
            }
        };
        Ok(OutputTarget::new(path))
    }
}

/// Destination sink owned by an active session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    path: PathBuf,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` URI reported to the host
    pub fn uri(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
