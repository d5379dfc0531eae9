//! `hlsl-build`: compile every HLSL shader under the project tree to SPIR-V.
//!
//! Exit status is 0 when no shaders were found or all compiled, 1 otherwise.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Env};
use hlsl_build_core::{BuildConfig, Diagnostics, ToolEnv};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "hlsl-build")]
#[command(version)]
#[command(about = "Compile HLSL shaders to SPIR-V with DXC in parallel", long_about = None)]
struct Cli {
    /// Config file (defaults to ./hlsl-build.toml when present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Root directory searched for `**/shaders/*.hlsl`
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Maximum number of concurrent compiler processes
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Kill a compiler process after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Compiler executable, overriding DXC and VULKAN_SDK
    #[arg(long, value_name = "PATH")]
    compiler: Option<String>,

    /// Print the compiler command lines without running them
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(BuildConfig, bool)> {
        let mut config = BuildConfig::discover(self.config.as_deref())
            .context("failed to load build configuration")?;

        if let Some(root) = self.root {
            config.root = root;
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
        if self.compiler.is_some() {
            config.compiler = self.compiler;
        }
        config.validate()?;
        Ok((config, self.dry_run))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logger(Env::default().default_filter_or("info"), cli.verbose).init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` style filtering from `env`; `verbose` forces debug level
/// regardless of the environment.
fn logger(env: Env<'_>, verbose: bool) -> Builder {
    let mut builder = Builder::from_env(env);
    builder.format_timestamp(None).format_target(false);
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let (config, dry_run) = cli.into_config()?;
    let env = ToolEnv::from_process();

    if dry_run {
        for line in hlsl_build_core::dry_run(&config, &env)? {
            println!("{line}");
        }
        return Ok(0);
    }

    let result = hlsl_build_core::run(&config, &env, &Diagnostics::stderr())
        .context("shader build aborted")?;
    Ok(result.exit_code())
}
