//! Build Orchestration
//!
//! Fans discovered sources out over a bounded worker pool, one
//! [`CompileTask`] per classified source, and folds every
//! [`CompileOutcome`] into a [`BuildResult`].
//!
//! # Scheduling
//!
//! Workers pull tasks from a shared queue and push outcomes onto a result
//! channel. All dispatched tasks run to completion even after a failure has
//! been observed, so one pass reports every broken shader. Aggregation only
//! counts and collects, which keeps the result independent of completion
//! order.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::BuildConfig;
use crate::diagnostics::Diagnostics;
use crate::discovery;
use crate::errors::Result;
use crate::task::{CompileOutcome, CompileTask};
use crate::tool::{ToolEnv, ToolLocation};

/// Aggregate result of one build run.
#[derive(Debug, Default)]
pub struct BuildResult {
    discovered: usize,
    skipped: Vec<PathBuf>,
    outcomes: Vec<CompileOutcome>,
    failure_count: usize,
}

impl BuildResult {
    fn new(discovered: usize) -> Self {
        Self {
            discovered,
            ..Default::default()
        }
    }

    fn record(&mut self, outcome: CompileOutcome) {
        if !outcome.success() {
            self.failure_count += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Number of source files discovered, classified or not.
    #[inline]
    #[must_use]
    pub fn discovered(&self) -> usize {
        self.discovered
    }

    /// Sources skipped because their stage is unknown.
    #[inline]
    #[must_use]
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Number of compile tasks that ran.
    #[inline]
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    #[inline]
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    #[inline]
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.len() - self.failure_count
    }

    /// Outcomes in completion order.
    #[inline]
    #[must_use]
    pub fn outcomes(&self) -> &[CompileOutcome] {
        &self.outcomes
    }

    /// Outcomes of failed tasks.
    pub fn failures(&self) -> impl Iterator<Item = &CompileOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success())
    }

    /// `true` when nothing was found at all, as opposed to everything skipped.
    #[inline]
    #[must_use]
    pub fn nothing_found(&self) -> bool {
        self.discovered == 0
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }

    /// Process exit status: 0 on success, 1 if any task failed.
    #[inline]
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.is_success())
    }

    /// Logs the final summary line.
    pub fn log_summary(&self) {
        if self.nothing_found() {
            return;
        }
        log::info!(
            "[HLSL] {} discovered, {} compiled, {} skipped, {} failed",
            self.discovered,
            self.success_count(),
            self.skipped.len(),
            self.failure_count
        );
        if self.is_success() {
            log::info!("[HLSL] All shaders compiled successfully");
        } else {
            log::error!("[HLSL] {} shader(s) failed to compile", self.failure_count);
        }
    }
}

/// Dispatches and joins compile tasks for already-discovered sources.
pub struct Orchestrator<'a> {
    config: &'a BuildConfig,
    tool: ToolLocation,
    diagnostics: &'a Diagnostics,
}

impl<'a> Orchestrator<'a> {
    /// `tool` is shared read-only by every task of the run.
    #[must_use]
    pub fn new(config: &'a BuildConfig, tool: ToolLocation, diagnostics: &'a Diagnostics) -> Self {
        Self {
            config,
            tool,
            diagnostics,
        }
    }

    /// Compiles every classified source and waits for all of them.
    #[must_use]
    pub fn build(&self, sources: &[PathBuf]) -> BuildResult {
        let mut result = BuildResult::new(sources.len());
        if sources.is_empty() {
            log::warn!(
                "No HLSL shaders found under {}/**/{}",
                self.config.root.display(),
                self.config.shader_dir
            );
            return result;
        }

        let (tasks, skipped) = plan(self.config, sources);
        result.skipped = skipped;
        if tasks.is_empty() {
            return result;
        }

        let workers = self.config.worker_count().min(tasks.len());
        log::info!(
            "Compiling {} shaders with up to {workers} workers...",
            tasks.len()
        );

        run_pool(
            tasks,
            workers,
            &self.tool,
            self.config.timeout(),
            self.diagnostics,
            |outcome| result.record(outcome),
        );
        result
    }
}

/// Splits sources into runnable tasks and skipped paths.
#[must_use]
pub fn plan(config: &BuildConfig, sources: &[PathBuf]) -> (Vec<CompileTask>, Vec<PathBuf>) {
    let mut tasks = Vec::with_capacity(sources.len());
    let mut skipped = Vec::new();
    for source in sources {
        match CompileTask::new(source, config) {
            Some(task) => tasks.push(task),
            None => {
                log::info!("[HLSL] skipping {} (unknown stage)", source.display());
                skipped.push(source.clone());
            }
        }
    }
    (tasks, skipped)
}

/// Runs `tasks` on `workers` threads, handing each outcome to `on_outcome`
/// on the calling thread as it arrives.
fn run_pool(
    tasks: Vec<CompileTask>,
    workers: usize,
    tool: &ToolLocation,
    timeout: Option<Duration>,
    diagnostics: &Diagnostics,
    mut on_outcome: impl FnMut(CompileOutcome),
) {
    let (task_tx, task_rx) = flume::bounded::<CompileTask>(tasks.len());
    let (outcome_tx, outcome_rx) = flume::unbounded::<CompileOutcome>();

    for task in tasks {
        task_tx.send(task).ok();
    }
    drop(task_tx);

    std::thread::scope(|scope| {
        for _ in 0..workers.max(1) {
            let task_rx = task_rx.clone();
            let outcome_tx = outcome_tx.clone();
            scope.spawn(move || {
                for task in task_rx.iter() {
                    if outcome_tx.send(task.run(tool, timeout, diagnostics)).is_err() {
                        break;
                    }
                }
            });
        }
        // The iterator ends once every worker has dropped its sender.
        drop(outcome_tx);
        for outcome in outcome_rx.iter() {
            on_outcome(outcome);
        }
    });
}

/// Full run: discover sources, resolve the compiler, build.
///
/// Only discovery failures are returned as errors; compile failures are
/// part of the [`BuildResult`].
pub fn run(config: &BuildConfig, env: &ToolEnv, diagnostics: &Diagnostics) -> Result<BuildResult> {
    let sources = discovery::discover(config)?;
    let (tool, source) = env.clone().with_override(config.compiler.clone()).resolve();
    log::debug!("Using compiler {tool} ({source:?})");

    let result = Orchestrator::new(config, tool, diagnostics).build(&sources);
    result.log_summary();
    Ok(result)
}

/// Discovers and classifies without compiling; returns the command lines
/// that a real run would execute.
pub fn dry_run(config: &BuildConfig, env: &ToolEnv) -> Result<Vec<String>> {
    let sources = discovery::discover(config)?;
    let (tool, _) = env.clone().with_override(config.compiler.clone()).resolve();
    let (tasks, _) = plan(config, &sources);
    Ok(tasks.iter().map(|task| task.command_line(&tool)).collect())
}
