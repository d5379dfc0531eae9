//! HLSL build driver core.
//!
//! Discovers HLSL sources, classifies each by stage, runs DXC for every
//! classified file on a bounded worker pool, and reduces the per-file
//! outcomes to a single pass/fail verdict.
//!
//! ```rust,ignore
//! use hlsl_build_core::{BuildConfig, Diagnostics, ToolEnv};
//!
//! let config = BuildConfig::default();
//! let result = hlsl_build_core::run(&config, &ToolEnv::from_process(), &Diagnostics::stderr())?;
//! std::process::exit(i32::from(result.exit_code()));
//! ```

pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod errors;
pub mod orchestrator;
pub mod stage;
pub mod task;
pub mod tool;

pub use config::BuildConfig;
pub use diagnostics::Diagnostics;
pub use discovery::discover;
pub use errors::{BuildError, CompileFailure, Result};
pub use orchestrator::{BuildResult, Orchestrator, dry_run, plan, run};
pub use stage::Stage;
pub use task::{CompileOutcome, CompileTask, dxc_arguments};
pub use tool::{ToolEnv, ToolLocation, ToolSource};
