//! End-to-end runs of the development loop against a real git repository
//! and a scripted lint tool.

#![cfg(unix)]

mod common;

use lintloop::application::{Components, RunOptions};
use lintloop::domain::models::{CommitFrequencyMode, Config, LoopState};
use lintloop::domain::ports::CommitHistorySource;
use lintloop::infrastructure::history::GitHistorySource;
use lintloop::services::{CommitTemplate, CycleAnalyzer};

use common::{
    git, install_fake_linter, install_silent_fake_linter, log_subjects, setup_test_git_repo,
};

fn config_for(repo: &std::path::Path, program: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.tool.name = "fakelint".to_string();
    config.tool.program = program.display().to_string();
    config.tool.working_dir = repo.to_path_buf();
    config.convergence.max_iterations = Some(10);
    config.convergence.commit_mode = Some(CommitFrequencyMode::PerIteration);
    config
}

#[tokio::test]
async fn run_converges_and_commits_each_iteration() {
    common::setup_test_logging();
    let (_dir, repo) = setup_test_git_repo();
    let linter = install_fake_linter(&repo, 7, 3);
    let config = config_for(&repo, &linter);

    let outcome = Components::from_config(&config, true)
        .expect("components")
        .run(&config, RunOptions::default())
        .await
        .expect("run");
    let report = outcome.report;

    assert_eq!(report.final_state, LoopState::Converged);
    // 7 -> 4 -> 1 -> 0, plus the converged check.
    assert_eq!(report.iterations(), 4);
    assert_eq!(report.remaining_findings, Some(0));
    for o in &report.outcomes {
        assert!(o.corrected_count <= o.findings_count);
    }
    assert_eq!(report.commits, 4);

    let subjects = log_subjects(&repo);
    assert_eq!(
        subjects,
        vec![
            "fakelint development loop complete: converged after 4 iterations, 0 offenses remaining",
            "fakelint development loop iteration 3: 1 offenses, 1 corrected",
            "fakelint development loop iteration 2: 4 offenses, 3 corrected",
            "fakelint development loop iteration 1: 7 offenses, 3 corrected",
            "initial commit",
        ]
    );
}

#[tokio::test]
async fn run_writes_documentation_and_learning_store() {
    let (_dir, repo) = setup_test_git_repo();
    let linter = install_fake_linter(&repo, 2, 2);
    let config = config_for(&repo, &linter);

    Components::from_config(&config, true)
        .expect("components")
        .run(&config, RunOptions::default())
        .await
        .expect("run");

    let doc = std::fs::read_to_string(repo.join("DEVELOPMENT_LOOP.md")).expect("doc written");
    assert!(doc.contains("## Development Loop Status"));
    assert!(doc.contains("- State: converged"));
    assert!(doc.contains("- Remaining offenses: 0"));
    assert!(doc.contains("| 1 | 2 | 2 | 100% |"));

    let raw = std::fs::read_to_string(repo.join(".lintloop/learning.json")).expect("store written");
    let entries: Vec<serde_json::Value> = serde_json::from_str(&raw).expect("json array");
    // One working iteration plus the finalization entry.
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["findings_count"], 2);
    assert_eq!(entries[1]["iteration"], 2);
    assert_eq!(entries[1]["findings_count"], 0);
}

#[tokio::test]
async fn loop_state_alone_is_never_committed() {
    let (_dir, repo) = setup_test_git_repo();
    let linter = install_silent_fake_linter(&repo, 3, 1);
    let mut config = config_for(&repo, &linter);
    config.documentation.enabled = false;

    let report = Components::from_config(&config, true)
        .expect("components")
        .run(&config, RunOptions::default())
        .await
        .expect("run")
        .report;

    assert_eq!(report.final_state, LoopState::Converged);
    assert_eq!(report.iterations(), 4);
    assert!(report.outcomes.iter().all(|o| !o.committed));
    assert_eq!(report.commits, 1);
    assert_eq!(
        log_subjects(&repo),
        vec![
            "fakelint development loop complete: converged after 4 iterations, 0 offenses remaining",
            "initial commit",
        ]
    );

    let files = git(&repo, &["show", "--name-only", "--pretty=format:", "HEAD"]);
    assert!(!files.contains(".lintloop"), "state committed: {files}");
    assert!(repo.join(".lintloop/learning.json").exists());
}

#[tokio::test]
async fn run_maxes_out_with_a_static_budget() {
    let (_dir, repo) = setup_test_git_repo();
    // One fix per pass from 50 keeps efficiency low but headroom small.
    let linter = install_fake_linter(&repo, 50, 1);
    let mut config = config_for(&repo, &linter);
    config.convergence.max_iterations = Some(3);
    config.documentation.enabled = false;

    let report = Components::from_config(&config, true)
        .expect("components")
        .run(&config, RunOptions::default())
        .await
        .expect("run")
        .report;

    assert_eq!(report.final_state, LoopState::MaxedOut);
    assert_eq!(report.iterations(), 3);
    assert_eq!(report.final_config.max_iterations, 3);
    assert_eq!(report.remaining_findings, Some(47));
}

#[tokio::test]
async fn missing_tool_is_fatal() {
    let (_dir, repo) = setup_test_git_repo();
    let mut config = config_for(&repo, &repo.join("no-such-linter"));
    config.documentation.enabled = false;

    let result = Components::from_config(&config, true)
        .expect("components")
        .run(&config, RunOptions::default())
        .await;

    assert!(result.is_err());
    assert_eq!(log_subjects(&repo), vec!["initial commit"]);
}

#[tokio::test]
async fn loop_commits_are_read_back_as_a_closed_cycle() {
    let (_dir, repo) = setup_test_git_repo();
    let linter = install_fake_linter(&repo, 9, 3);
    let config = config_for(&repo, &linter);

    Components::from_config(&config, true)
        .expect("components")
        .run(&config, RunOptions::default())
        .await
        .expect("run");

    let template = CommitTemplate::new("fakelint");
    let commits = GitHistorySource::new(repo.clone())
        .list_commits_matching(&template.search_term(), 50)
        .await
        .expect("history");
    let stats = CycleAnalyzer::new(template).analyze(&commits);

    assert_eq!(stats.total_cycles, 1);
    assert_eq!(stats.closed_cycles, 1);
    assert_eq!(stats.average_iterations_per_cycle, 3);
    assert!((stats.offense_reduction_stats.average_initial_offenses - 9.0).abs() < 1e-9);
}

#[tokio::test]
async fn history_informed_plan_uses_past_cycles() {
    let (_dir, repo) = setup_test_git_repo();
    let linter = install_fake_linter(&repo, 9, 3);
    let mut config = config_for(&repo, &linter);
    config.convergence.max_iterations = None;

    Components::from_config(&config, true)
        .expect("components")
        .run(&config, RunOptions::default())
        .await
        .expect("first run");

    // Second run: history now contains one closed three-iteration cycle.
    let components = Components::from_config(&config, false).expect("components");
    let plan = components
        .plan(&config, lintloop::application::Overrides::default())
        .await;

    assert!(plan.insights.sufficient);
    assert_eq!(plan.insights.cycles.closed_cycles, 1);
    assert!(plan.predicted.max_iterations >= 5);
    assert!(plan.heuristics.runs >= 1);
}
