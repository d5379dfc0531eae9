//! Orchestrator Tests
//!
//! Tests for:
//! - Empty and all-skipped builds succeed without dispatching
//! - Mixed success/failure aggregation under randomized completion order
//! - Run-everything policy (no early stop on failure)
//! - Full `run` entry point and dry runs

mod common;

use std::path::PathBuf;

use common::ShaderTree;
use hlsl_build_core::{BuildConfig, Diagnostics, Orchestrator, ToolEnv, ToolLocation};

fn config_for(tree: &ShaderTree) -> BuildConfig {
    BuildConfig {
        root: tree.root(),
        jobs: Some(4),
        ..Default::default()
    }
}

// ============================================================================
// No Work
// ============================================================================

#[test]
fn no_sources_is_success() {
    let config = BuildConfig::default();
    let (diagnostics, _) = Diagnostics::buffered();
    let orchestrator = Orchestrator::new(&config, ToolLocation::new("dxc"), &diagnostics);

    let result = orchestrator.build(&[]);

    assert!(result.is_success());
    assert!(result.nothing_found());
    assert_eq!(result.total_count(), 0);
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn all_unknown_stages_are_skipped_not_failed() {
    let config = BuildConfig::default();
    let (diagnostics, _) = Diagnostics::buffered();
    // A tool that cannot launch proves nothing was dispatched.
    let orchestrator = Orchestrator::new(
        &config,
        ToolLocation::new("/no/such/compiler"),
        &diagnostics,
    );
    let sources: Vec<PathBuf> = ["a.hlsl", "b.cs.hlsl", "common.hlsli"]
        .iter()
        .map(|name| PathBuf::from("nyla/shaders").join(name))
        .collect();

    let result = orchestrator.build(&sources);

    assert!(result.is_success());
    assert!(!result.nothing_found());
    assert_eq!(result.discovered(), 3);
    assert_eq!(result.skipped().len(), 3);
    assert_eq!(result.total_count(), 0);
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn plan_separates_skipped_sources() {
    let config = BuildConfig::default();
    let sources = vec![
        PathBuf::from("s/shaders/a.vs.hlsl"),
        PathBuf::from("s/shaders/b.hlsl"),
        PathBuf::from("s/shaders/c.ps.hlsl"),
    ];

    let (tasks, skipped) = hlsl_build_core::plan(&config, &sources);
    assert_eq!(tasks.len(), 2);
    assert_eq!(skipped, vec![PathBuf::from("s/shaders/b.hlsl")]);
}

// ============================================================================
// Aggregation
// ============================================================================

#[cfg(unix)]
mod compile {
    use super::*;
    use crate::common::fake_compiler;
    use hlsl_build_core::CompileFailure;

    fn mixed_tree(successes: usize, failures: usize) -> (ShaderTree, Vec<PathBuf>) {
        let tree = ShaderTree::new();
        let mut sources = Vec::new();
        for i in 0..successes {
            let dir = if i % 2 == 0 { "engine/shaders" } else { "apps/wm/shaders" };
            sources.push(tree.add(&format!("{dir}/ok{i}.vs.hlsl")));
        }
        for i in 0..failures {
            sources.push(tree.add(&format!("engine/shaders/fail{i}.ps.hlsl")));
        }
        sources.push(tree.add("engine/shaders/common.hlsl"));
        sources.sort();
        (tree, sources)
    }

    #[test]
    fn single_success() {
        let tree = ShaderTree::new();
        let source = tree.add("shaders/quad.vs.hlsl");
        let config = config_for(&tree);
        let (diagnostics, _) = Diagnostics::buffered();

        let result = Orchestrator::new(&config, ToolLocation::new(fake_compiler()), &diagnostics)
            .build(&[source]);

        assert!(result.is_success());
        assert_eq!(result.total_count(), 1);
        assert_eq!(result.success_count(), 1);
    }

    #[test]
    fn mixed_results_count_every_failure() {
        let (tree, sources) = mixed_tree(6, 3);
        let config = config_for(&tree);
        let (diagnostics, buffer) = Diagnostics::buffered();

        let result = Orchestrator::new(&config, ToolLocation::new(fake_compiler()), &diagnostics)
            .build(&sources);

        assert!(!result.is_success());
        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.discovered(), 10);
        assert_eq!(result.skipped().len(), 1);
        assert_eq!(result.total_count(), 9);
        assert_eq!(result.failure_count(), 3);
        assert_eq!(result.success_count(), 6);

        // Every failing shader reported, none cut short by an earlier failure.
        let text = buffer.contents();
        for i in 0..3 {
            assert!(text.contains(&format!("fail{i}.ps.hlsl:1:1: syntax error")));
        }
        assert!(result.failures().all(|outcome| matches!(
            outcome.failure(),
            Some(CompileFailure::ExitStatus { code: Some(3) })
        )));
    }

    #[test]
    fn aggregate_is_independent_of_completion_order() {
        let (tree, sources) = mixed_tree(8, 4);
        let config = config_for(&tree);

        let mut runs = Vec::new();
        for _ in 0..3 {
            for source in &sources {
                tree.set_delay(source, u64::from(rand::random::<u8>() % 60));
            }
            let (diagnostics, _) = Diagnostics::buffered();
            let result =
                Orchestrator::new(&config, ToolLocation::new(fake_compiler()), &diagnostics)
                    .build(&sources);

            let mut failed: Vec<PathBuf> =
                result.failures().map(|o| o.source().to_path_buf()).collect();
            failed.sort();
            let mut compiled: Vec<PathBuf> =
                result.outcomes().iter().map(|o| o.source().to_path_buf()).collect();
            compiled.sort();
            runs.push((result.failure_count(), result.total_count(), failed, compiled));
        }

        for run in &runs {
            assert_eq!(run.0, 4);
            assert_eq!(run.1, 12);
        }
        assert!(runs.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn single_worker_still_runs_everything() {
        let (tree, sources) = mixed_tree(2, 2);
        let config = BuildConfig {
            jobs: Some(1),
            ..config_for(&tree)
        };
        let (diagnostics, _) = Diagnostics::buffered();

        let result = Orchestrator::new(&config, ToolLocation::new(fake_compiler()), &diagnostics)
            .build(&sources);

        assert_eq!(result.total_count(), 4);
        assert_eq!(result.failure_count(), 2);
    }

    #[test]
    fn missing_compiler_fails_every_task_without_aborting() {
        let (tree, sources) = mixed_tree(3, 0);
        let config = config_for(&tree);
        let (diagnostics, _) = Diagnostics::buffered();

        let result = Orchestrator::new(
            &config,
            ToolLocation::new(tree.root().join("missing-dxc")),
            &diagnostics,
        )
        .build(&sources);

        assert_eq!(result.total_count(), 3);
        assert_eq!(result.failure_count(), 3);
    }

    // ========================================================================
    // Entry Points
    // ========================================================================

    #[test]
    fn run_discovers_and_builds_with_configured_compiler() {
        let tree = ShaderTree::new();
        tree.add("engine/shaders/quad.vs.hlsl");
        tree.add("engine/shaders/quad.ps.hlsl");
        tree.add("engine/shaders/shared.hlsl");
        let config = BuildConfig {
            compiler: Some(fake_compiler().to_string_lossy().into_owned()),
            ..config_for(&tree)
        };
        let (diagnostics, _) = Diagnostics::buffered();

        let result = hlsl_build_core::run(&config, &ToolEnv::default(), &diagnostics).unwrap();

        assert!(result.is_success());
        assert_eq!(result.discovered(), 3);
        assert_eq!(result.total_count(), 2);
        assert!(tree.root().join("engine/shaders/build/quad.ps.hlsl.spv").is_file());
        assert!(tree.root().join("engine/shaders/build/quad.vs.hlsl.spv").is_file());
    }
}

#[test]
fn run_on_missing_root_is_success() {
    let config = BuildConfig {
        root: PathBuf::from("/definitely/not/a/real/root/nyla"),
        ..Default::default()
    };
    let (diagnostics, _) = Diagnostics::buffered();

    let result = hlsl_build_core::run(&config, &ToolEnv::default(), &diagnostics).unwrap();
    assert!(result.nothing_found());
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn dry_run_lists_commands_without_compiling() {
    let tree = ShaderTree::new();
    tree.add("shaders/quad.vs.hlsl");
    tree.add("shaders/notes.hlsl");
    let config = config_for(&tree);
    let env = ToolEnv {
        dxc: Some("my-dxc".to_string()),
        vulkan_sdk: None,
    };

    let lines = hlsl_build_core::dry_run(&config, &env).unwrap();

    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("my-dxc -spirv"));
    assert!(lines[0].contains("-T vs_6_0"));
    assert!(!tree.root().join("shaders/build").exists());
}
