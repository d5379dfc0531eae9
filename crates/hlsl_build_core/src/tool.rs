//! Compiler Tool Resolution
//!
//! Locates the DXC executable. Resolution is a pure function of a
//! [`ToolEnv`] snapshot, so one build run resolves once and hands the same
//! [`ToolLocation`] to every task.
//!
//! Priority order:
//!
//! 1. `DXC` (or the config `compiler` key): used verbatim, never checked.
//! 2. `VULKAN_SDK`: the SDK's bundled binary, only if it exists on disk.
//! 3. Bare `dxc`, looked up on `PATH` when the process is launched.
//!
//! Resolution never fails. A missing tool surfaces later as a launch failure
//! of each compile task.

use std::fmt;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Explicit override variable.
pub const DXC_ENV: &str = "DXC";
/// Vulkan SDK root variable.
pub const VULKAN_SDK_ENV: &str = "VULKAN_SDK";
/// Command name used when nothing else resolves.
pub const FALLBACK_COMMAND: &str = "dxc";

/// Location of the SDK's DXC binary relative to the SDK root.
#[cfg(windows)]
const SDK_RELATIVE_PATH: &[&str] = &["Bin", "dxc.exe"];
#[cfg(not(windows))]
const SDK_RELATIVE_PATH: &[&str] = &["bin", "dxc"];

/// A resolved compiler path, or a bare command for `PATH` lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolLocation(PathBuf);

impl ToolLocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self(program.into())
    }

    #[inline]
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn as_os_str(&self) -> &OsStr {
        self.0.as_os_str()
    }
}

impl fmt::Display for ToolLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// How a [`ToolLocation`] was obtained (for logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    Override,
    VulkanSdk,
    SearchPath,
}

/// Snapshot of the environment inputs to tool resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnv {
    /// Value of `DXC`, or the config `compiler` key.
    pub dxc: Option<String>,
    /// Value of `VULKAN_SDK`.
    pub vulkan_sdk: Option<PathBuf>,
}

impl ToolEnv {
    /// Reads `DXC` and `VULKAN_SDK` from the current process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            dxc: std::env::var(DXC_ENV).ok(),
            vulkan_sdk: std::env::var_os(VULKAN_SDK_ENV).map(PathBuf::from),
        }
    }

    /// Replaces the override when `compiler` is `Some`.
    #[must_use]
    pub fn with_override(mut self, compiler: Option<String>) -> Self {
        if compiler.is_some() {
            self.dxc = compiler;
        }
        self
    }

    /// Resolves the compiler location. See the module docs for the order.
    #[must_use]
    pub fn resolve(&self) -> (ToolLocation, ToolSource) {
        if let Some(dxc) = self.dxc.as_deref().filter(|s| !s.is_empty()) {
            return (ToolLocation::new(dxc), ToolSource::Override);
        }

        if let Some(sdk) = self.vulkan_sdk.as_deref().filter(|p| !p.as_os_str().is_empty()) {
            let candidate = sdk_candidate(sdk);
            if candidate.is_file() {
                return (ToolLocation::new(candidate), ToolSource::VulkanSdk);
            }
            log::debug!(
                "{VULKAN_SDK_ENV} is set but {} does not exist",
                candidate.display()
            );
        }

        (ToolLocation::new(FALLBACK_COMMAND), ToolSource::SearchPath)
    }
}

/// The DXC path checked inside a Vulkan SDK root.
#[must_use]
pub fn sdk_candidate(sdk_root: &Path) -> PathBuf {
    SDK_RELATIVE_PATH
        .iter()
        .fold(sdk_root.to_path_buf(), |path, part| path.join(part))
}
