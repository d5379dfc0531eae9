//! Compile Task
//!
//! One unit of work: compile a single classified HLSL source to SPIR-V by
//! running DXC as a subprocess.
//!
//! A task never returns an error to its caller. Every failure path (launch
//! failure, non-zero exit, missing artifact, timeout) is caught here and
//! recorded in the returned [`CompileOutcome`], so one broken shader cannot
//! abort the batch.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::BuildConfig;
use crate::diagnostics::Diagnostics;
use crate::errors::CompileFailure;
use crate::stage::Stage;
use crate::tool::ToolLocation;

/// Entry point every shader must export.
pub const ENTRY_POINT: &str = "main";
/// Extension appended to the source file name to form the artifact name.
pub const OUTPUT_EXTENSION: &str = "spv";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Fixed DXC flag profile: SPIR-V for Vulkan 1.3 with DX memory layout,
/// embedded source-level debug info, optimizations off.
const DXC_FLAGS: &[&str] = &[
    "-spirv",
    "-fspv-target-env=vulkan1.3",
    "-fvk-use-dx-layout",
    "-Zi",
    "-Qembed_debug",
    "-fspv-debug=vulkan-with-source",
    "-Od",
];

/// Full DXC argument list (excluding the program itself).
#[must_use]
pub fn dxc_arguments(profile: &str, output: &Path, input: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = DXC_FLAGS.iter().map(|flag| OsString::from(*flag)).collect();
    args.extend([
        OsString::from("-T"),
        OsString::from(profile),
        OsString::from("-E"),
        OsString::from(ENTRY_POINT),
        OsString::from("-Fo"),
        output.as_os_str().to_os_string(),
        input.as_os_str().to_os_string(),
    ]);
    args
}

/// A source file paired with its stage and artifact path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileTask {
    source: PathBuf,
    stage: Stage,
    profile: &'static str,
    output: PathBuf,
}

impl CompileTask {
    /// Creates a task for `source`, or `None` when its stage is unknown.
    #[must_use]
    pub fn new(source: &Path, config: &BuildConfig) -> Option<Self> {
        let stage = Stage::of_path(source, &config.extension);
        let profile = stage.profile()?;

        let mut file_name = source.file_name()?.to_os_string();
        file_name.push(".");
        file_name.push(OUTPUT_EXTENSION);

        let output = source
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&config.output_dir)
            .join(file_name);

        Some(Self {
            source: source.to_path_buf(),
            stage,
            profile,
            output,
        })
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    #[must_use]
    pub fn profile(&self) -> &'static str {
        self.profile
    }

    /// Declared artifact path: `<dir>/<output_dir>/<file>.spv`.
    #[inline]
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.output.parent().unwrap_or_else(|| Path::new(""))
    }

    #[must_use]
    pub fn arguments(&self) -> Vec<OsString> {
        dxc_arguments(self.profile, &self.output, &self.source)
    }

    #[must_use]
    pub fn command(&self, tool: &ToolLocation) -> Command {
        let mut command = Command::new(tool.as_os_str());
        command.args(self.arguments());
        command
    }

    /// Printable command line, for dry runs.
    #[must_use]
    pub fn command_line(&self, tool: &ToolLocation) -> String {
        std::iter::once(tool.as_os_str().to_os_string())
            .chain(self.arguments())
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Creates the output directory if absent.
    ///
    /// Safe when several tasks target the same directory at once: an
    /// existing directory is success.
    pub fn ensure_output_dir(&self) -> Result<(), CompileFailure> {
        let dir = self.output_dir();
        match std::fs::create_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(_) if dir.is_dir() => Ok(()),
            Err(source) => Err(CompileFailure::OutputDir {
                path: dir.to_path_buf(),
                source,
            }),
        }
    }

    /// Runs the compiler and verifies the artifact.
    pub fn run(
        &self,
        tool: &ToolLocation,
        timeout: Option<Duration>,
        diagnostics: &Diagnostics,
    ) -> CompileOutcome {
        if let Err(failure) = self.ensure_output_dir() {
            diagnostics.message(&format!("[HLSL] {}: {failure}", self.source.display()));
            return self.outcome(0, None, Err(failure));
        }

        log::info!(
            "[HLSL] {} -> {} ({})",
            self.source.display(),
            self.output.display(),
            self.profile
        );

        let begin = Instant::now();
        let captured = capture(self.command(tool), tool, timeout);
        let elapsed_ms = u64::try_from(begin.elapsed().as_millis()).unwrap_or(u64::MAX);

        let captured = match captured {
            Ok(captured) => captured,
            Err(failure) => {
                log::info!("  [{}] {elapsed_ms}ms ({failure})", self.source.display());
                diagnostics.message(&format!("[HLSL] {}: {failure}", self.source.display()));
                return self.outcome(elapsed_ms, None, Err(failure));
            }
        };

        let exit_code = captured.status.and_then(|status| status.code());
        log::info!(
            "  [{}] {elapsed_ms}ms (exit code {})",
            self.source.display(),
            exit_code.map_or_else(|| "none".to_string(), |code| code.to_string())
        );

        let result = self.verify(&captured, timeout);
        if let Err(failure) = &result {
            let headline = match failure {
                CompileFailure::MissingOutput(path) => {
                    format!("[HLSL] dxc succeeded but output missing: {}", path.display())
                }
                failure => format!("[HLSL] {} failed: {failure}", self.source.display()),
            };
            diagnostics.compiler_output(&headline, &captured.stdout, &captured.stderr);
        }

        self.outcome(elapsed_ms, exit_code, result)
    }

    fn verify(&self, captured: &Captured, timeout: Option<Duration>) -> Result<(), CompileFailure> {
        if captured.timed_out {
            return Err(CompileFailure::TimedOut(timeout.unwrap_or_default()));
        }
        match captured.status {
            Some(status) if status.success() => {}
            status => {
                return Err(CompileFailure::ExitStatus {
                    code: status.and_then(|status| status.code()),
                });
            }
        }
        if !self.output.is_file() {
            return Err(CompileFailure::MissingOutput(self.output.clone()));
        }
        Ok(())
    }

    fn outcome(
        &self,
        elapsed_ms: u64,
        exit_code: Option<i32>,
        result: Result<(), CompileFailure>,
    ) -> CompileOutcome {
        CompileOutcome {
            source: self.source.clone(),
            stage: self.stage,
            elapsed_ms,
            exit_code,
            result,
        }
    }
}

/// The record of one finished compile task. Immutable once created.
#[derive(Debug)]
pub struct CompileOutcome {
    source: PathBuf,
    stage: Stage,
    elapsed_ms: u64,
    exit_code: Option<i32>,
    result: Result<(), CompileFailure>,
}

impl CompileOutcome {
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Wall-clock duration of the compiler process in whole milliseconds.
    #[inline]
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Compiler exit code; `None` if it never ran or died from a signal.
    #[inline]
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&CompileFailure> {
        self.result.as_ref().err()
    }

    #[inline]
    #[must_use]
    pub fn result(&self) -> &Result<(), CompileFailure> {
        &self.result
    }
}

struct Captured {
    /// `None` only when the process was killed and could not be reaped.
    status: Option<ExitStatus>,
    timed_out: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Runs `command` to completion with captured output.
///
/// Failures to start or to wait on the process become [`CompileFailure`]s.
fn capture(
    mut command: Command,
    tool: &ToolLocation,
    timeout: Option<Duration>,
) -> Result<Captured, CompileFailure> {
    let launch_failed = |source| CompileFailure::Launch {
        tool: tool.to_string(),
        source,
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let Some(timeout) = timeout else {
        let output = command.output().map_err(launch_failed)?;
        return Ok(Captured {
            status: Some(output.status),
            timed_out: false,
            stdout: output.stdout,
            stderr: output.stderr,
        });
    };

    let mut child = command.spawn().map_err(launch_failed)?;
    // Both pipes are drained concurrently so a chatty compiler cannot block
    // on a full pipe while we poll.
    let stdout = child.stdout.take().map(|pipe| thread::spawn(move || drain(pipe)));
    let stderr = child.stderr.take().map(|pipe| thread::spawn(move || drain(pipe)));

    let deadline = Instant::now() + timeout;
    let (status, timed_out) = loop {
        match child.try_wait() {
            Ok(Some(status)) => break (Some(status), false),
            Ok(None) if Instant::now() >= deadline => break (abandon(&mut child), true),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                abandon(&mut child);
                return Err(CompileFailure::Wait { source });
            }
        }
    };

    Ok(Captured {
        status,
        timed_out,
        stdout: stdout.map(|h| h.join().unwrap_or_default()).unwrap_or_default(),
        stderr: stderr.map(|h| h.join().unwrap_or_default()).unwrap_or_default(),
    })
}

/// Kills `child` and reaps it. Returns its status if it could be reaped.
fn abandon(child: &mut Child) -> Option<ExitStatus> {
    if let Err(err) = child.kill() {
        log::warn!("Failed to kill compiler process {}: {err}", child.id());
    }
    match child.wait() {
        Ok(status) => Some(status),
        Err(err) => {
            log::warn!("Failed to reap compiler process {}: {err}", child.id());
            None
        }
    }
}

fn drain(mut pipe: impl Read) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Err(err) = pipe.read_to_end(&mut buf) {
        log::warn!("Failed to read compiler output: {err}");
    }
    buf
}
