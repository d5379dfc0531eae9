//! Shader Stage Classification
//!
//! Maps a source file name to the pipeline stage it compiles for. The mapping
//! is a naming convention on the double suffix of the file:
//!
//! | Suffix      | Stage                  | DXC profile |
//! |-------------|------------------------|-------------|
//! | `.vs.hlsl`  | [`Stage::Vertex`]      | `vs_6_0`    |
//! | `.ps.hlsl`  | [`Stage::Pixel`]       | `ps_6_0`    |
//! | anything    | [`Stage::Unknown`]     | -           |
//!
//! Unknown is a deliberate skip, not an error.

use std::fmt;
use std::path::Path;

use crate::config::DEFAULT_EXTENSION;

/// Shader pipeline stage of a source file.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum Stage {
    /// Vertex shader (`*.vs.<ext>`).
    Vertex,
    /// Pixel / fragment shader (`*.ps.<ext>`).
    Pixel,
    /// Does not follow the naming convention; skipped by the build.
    Unknown,
}

impl Stage {
    /// Classifies a file name using the default `hlsl` extension.
    #[inline]
    #[must_use]
    pub fn classify(file_name: &str) -> Self {
        Self::classify_with_extension(file_name, DEFAULT_EXTENSION)
    }

    /// Classifies a file name against `*.vs.<extension>` / `*.ps.<extension>`.
    ///
    /// Matching is case-sensitive and total: every input yields exactly one
    /// stage.
    #[must_use]
    pub fn classify_with_extension(file_name: &str, extension: &str) -> Self {
        let Some(stem) = file_name
            .strip_suffix(extension)
            .and_then(|rest| rest.strip_suffix('.'))
        else {
            return Self::Unknown;
        };

        if stem.ends_with(".vs") {
            Self::Vertex
        } else if stem.ends_with(".ps") {
            Self::Pixel
        } else {
            Self::Unknown
        }
    }

    /// Classifies the final component of `path`.
    ///
    /// Paths without a UTF-8 file name are [`Stage::Unknown`].
    #[must_use]
    pub fn of_path(path: &Path, extension: &str) -> Self {
        path.file_name()
            .and_then(|name| name.to_str())
            .map_or(Self::Unknown, |name| {
                Self::classify_with_extension(name, extension)
            })
    }

    /// DXC target profile passed to `-T`.
    #[inline]
    #[must_use]
    pub const fn profile(self) -> Option<&'static str> {
        match self {
            Self::Vertex => Some("vs_6_0"),
            Self::Pixel => Some("ps_6_0"),
            Self::Unknown => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Stage name (for logging).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Pixel => "pixel",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
