//! Shared fixtures: a throwaway shader tree and a scripted stand-in for DXC.
//!
//! The fake compiler reads the `-Fo` argument and the trailing input path,
//! then behaves according to the source file name:
//!
//! - `*fail*`  prints to stdout and stderr, exits 3
//! - `*ghost*` prints to stdout and stderr, exits 0 without writing the output
//! - `*hang*`  sleeps far longer than any test timeout
//! - anything else writes the output and its argument list
//!
//! A sibling `<source>.delay` file holds seconds to sleep before acting.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct ShaderTree {
    dir: TempDir,
}

impl ShaderTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nyla")).unwrap();
        Self { dir }
    }

    /// Discovery root (`<tmp>/nyla`).
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("nyla")
    }

    /// Creates an empty source at `root/rel` and returns its path.
    pub fn add(&self, rel: &str) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "float4 main() : SV_Target { return 0; }\n").unwrap();
        path
    }

    pub fn set_delay(&self, source: &Path, millis: u64) {
        let mut delay = source.as_os_str().to_os_string();
        delay.push(".delay");
        fs::write(delay, format!("{}.{:03}", millis / 1000, millis % 1000)).unwrap();
    }
}

#[cfg(unix)]
const FAKE_DXC: &str = r#"#!/bin/sh
out=""
prev=""
src=""
for arg in "$@"; do
    if [ "$prev" = "-Fo" ]; then out="$arg"; fi
    prev="$arg"
    src="$arg"
done
if [ -f "$src.delay" ]; then sleep "$(cat "$src.delay")"; fi
case "$(basename "$src")" in
    *fail*)
        echo "stdout marker for $src"
        echo "error: $src:1:1: syntax error" >&2
        exit 3
        ;;
    *ghost*)
        echo "stdout marker for $src"
        echo "warning: $src: nothing emitted" >&2
        exit 0
        ;;
    *hang*)
        exec sleep 30
        ;;
esac
printf '%s\n' "$@" > "$out.args"
printf 'SPIRV' > "$out"
"#;

/// Path to the fake compiler script, written once per test binary.
#[cfg(unix)]
pub fn fake_compiler() -> &'static Path {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::OnceLock;

    static SCRIPT: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, script) = SCRIPT.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fake-dxc");
        fs::write(&script, FAKE_DXC).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        (dir, script)
    });
    script
}
