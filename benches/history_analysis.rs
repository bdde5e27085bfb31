use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lintloop::domain::models::CommitRecord;
use lintloop::services::{CommitTemplate, CycleAnalyzer, DateRange, PatternAnalyzer};

/// Mixed history: every fifth block is a three-iteration loop cycle.
fn synthetic_history(len: usize) -> Vec<CommitRecord> {
    let template = CommitTemplate::new("rubocop");
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let mut commits: Vec<CommitRecord> = (0..len)
        .map(|i| {
            let message = match i % 20 {
                0 => template.iteration_message(1, 40, 25),
                1 => template.iteration_message(2, 15, 12),
                2 => template.iteration_message(3, 3, 3),
                3 => template.terminal_message(
                    lintloop::domain::models::LoopState::Converged,
                    4,
                    Some(0),
                ),
                n if n % 3 == 0 => format!("Fix flaky test #{i}"),
                n if n % 3 == 1 => format!("Refactor module {i}"),
                _ => format!("Update doc for release {i}"),
            };
            CommitRecord::new(
                format!("{i:040x}"),
                message,
                start + Duration::minutes(i as i64 * 37),
            )
            .with_files(vec![format!("lib/mod_{}.rb", i % 50), "Gemfile.lock".into()])
        })
        .collect();
    commits.reverse();
    commits
}

fn bench_pattern_analysis(c: &mut Criterion) {
    let keywords = vec!["fix".to_string(), "refactor".to_string(), "doc".to_string()];
    let analyzer = PatternAnalyzer::new("rubocop", &keywords);
    let mut group = c.benchmark_group("pattern_analysis");
    for len in [200usize, 2_000] {
        let history = synthetic_history(len);
        let end = history[0].author_date.date_naive();
        group.bench_with_input(BenchmarkId::from_parameter(len), &history, |b, history| {
            b.iter(|| analyzer.analyze(black_box(history), Some(DateRange::ending_at(end, 30))));
        });
    }
    group.finish();
}

fn bench_cycle_analysis(c: &mut Criterion) {
    let analyzer = CycleAnalyzer::new(CommitTemplate::new("rubocop"));
    let mut group = c.benchmark_group("cycle_analysis");
    for len in [200usize, 2_000] {
        let history = synthetic_history(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &history, |b, history| {
            b.iter(|| analyzer.analyze(black_box(history)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pattern_analysis, bench_cycle_analysis);
criterion_main!(benches);
