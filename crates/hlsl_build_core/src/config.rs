//! Build Configuration
//!
//! [`BuildConfig`] collects every knob of a build run. Values are layered:
//!
//! 1. Built-in defaults ([`BuildConfig::default`])
//! 2. An optional TOML file ([`BuildConfig::load`])
//! 3. Command-line overrides applied by the caller
//!
//! ```toml
//! # hlsl-build.toml
//! root = "nyla"
//! jobs = 8
//! timeout_secs = 120
//! compiler = "/opt/dxc/bin/dxc"
//! ```
//!
//! The compiler flag profile itself is not configurable; see
//! [`task::dxc_arguments`](crate::task::dxc_arguments).

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{BuildError, Result};

/// Default discovery root, relative to the working directory.
pub const DEFAULT_ROOT: &str = "nyla";
/// Directory name that marks a folder of shader sources.
pub const DEFAULT_SHADER_DIR: &str = "shaders";
/// Shader source extension.
pub const DEFAULT_EXTENSION: &str = "hlsl";
/// Output subdirectory created next to each source file.
pub const DEFAULT_OUTPUT_DIR: &str = "build";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "hlsl-build.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Root of the recursive source search.
    pub root: PathBuf,
    /// Sources must live directly inside a directory with this name.
    pub shader_dir: String,
    /// Source file extension, without the dot.
    pub extension: String,
    /// Name of the artifact directory sibling to each source.
    pub output_dir: String,
    /// Worker count override. `None` uses host parallelism.
    pub jobs: Option<usize>,
    /// Per-compiler-invocation deadline in seconds. `None` waits forever.
    pub timeout_secs: Option<u64>,
    /// Explicit compiler path or command. Takes priority over the environment.
    pub compiler: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            shader_dir: DEFAULT_SHADER_DIR.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            jobs: None,
            timeout_secs: None,
            compiler: None,
        }
    }
}

impl BuildConfig {
    /// Parses a config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|source| BuildError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text, path)
    }

    /// Loads `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists,
    /// else the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    log::debug!("Using config file {}", default_path.display());
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(BuildError::InvalidConfig(format!(
                "extension must be non-empty and without a leading dot, got {:?}",
                self.extension
            )));
        }
        if self.shader_dir.is_empty() || self.output_dir.is_empty() {
            return Err(BuildError::InvalidConfig(
                "shader_dir and output_dir must be non-empty".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(BuildError::InvalidConfig(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Worker pool size: the override or host parallelism, at least 1.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.jobs
            .unwrap_or_else(|| {
                std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
            })
            .max(1)
    }
}
