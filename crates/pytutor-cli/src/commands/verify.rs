//! The `pytutor verify` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use pytutor_core::traits::CodeEvaluator;
use pytutor_core::verify::{
    verify_catalog, ChallengeVerification, VerificationReport, VerificationStatus, VerifyConfig,
    VerifyProgress,
};

use super::{load_catalog, local_runner, Globals};

/// Console progress reporter.
struct ConsoleProgress;

impl VerifyProgress for ConsoleProgress {
    fn on_start(&self, challenge_id: &str) {
        eprintln!("  Starting: {challenge_id}");
    }

    fn on_complete(&self, result: &ChallengeVerification) {
        let icon = match &result.status {
            VerificationStatus::Skipped => "SKIP",
            _ if result.passed() => "OK",
            _ => "FAIL",
        };
        eprintln!(
            "  Done: {} [{icon}] ({}ms)",
            result.challenge_id, result.duration_ms
        );
    }

    fn on_finish(&self, total: usize, passed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {passed}/{total} reference solutions earned full credit ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    globals: &Globals,
    catalog_path: Option<PathBuf>,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = globals.settings()?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let catalog = load_catalog(&config, catalog_path.as_deref())?;
    let runner = local_runner(&config);
    let version = runner.check_interpreter().await?;
    eprintln!(
        "pytutor v{}: verifying {} challenges with {version}",
        env!("CARGO_PKG_VERSION"),
        catalog.challenges.len()
    );
    eprintln!();

    let verify_config = VerifyConfig {
        parallelism,
        timeout_secs: config.timeout_secs,
    };
    let evaluator: Arc<dyn CodeEvaluator> = Arc::new(runner);
    let report = verify_catalog(&catalog, evaluator, &verify_config, &ConsoleProgress).await?;

    print_summary(&report);

    if let Some(path) = output {
        let path = if path.is_dir() {
            let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
            path.join(format!("verify-{timestamp}.json"))
        } else {
            path
        };
        report.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    let failed = report.failures().count();
    anyhow::ensure!(
        failed == 0,
        "{failed} reference solution(s) did not earn full credit"
    );
    Ok(())
}

fn print_summary(report: &VerificationReport) {
    let mut table = Table::new();
    table.set_header(vec!["Challenge", "Stage", "Result", "Points", "Time"]);

    for result in &report.results {
        let (outcome, points) = match &result.status {
            VerificationStatus::Graded { tier, points } => (tier.to_string(), points.to_string()),
            VerificationStatus::Skipped => ("skipped".to_string(), "-".to_string()),
            VerificationStatus::Error { message } => (format!("error: {message}"), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(&result.challenge_id),
            Cell::new(result.stage),
            Cell::new(outcome),
            Cell::new(points),
            Cell::new(format!("{}ms", result.duration_ms)),
        ]);
    }

    eprintln!("\n{table}");
    for failure in report.failures() {
        for line in &failure.feedback {
            eprintln!("  [{}] {line}", failure.challenge_id);
        }
    }
    eprintln!("Run: {} ({})", report.id, report.evaluator);
}
