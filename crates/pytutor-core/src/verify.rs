//! Catalog self-check.
//!
//! Runs every challenge's reference solution through an evaluator, in
//! parallel, and reports the tier each one earns. A gradable catalog has
//! every reference solution at full credit.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::model::{Catalog, Stage, Tier};
use crate::scoring::assess;
use crate::traits::{CodeEvaluator, EvaluateRequest};

/// Configuration for a verification run.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Maximum concurrent evaluations.
    pub parallelism: usize,
    /// Timeout for challenges that do not set their own.
    pub timeout_secs: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            timeout_secs: 10,
        }
    }
}

/// Progress reporting trait.
pub trait VerifyProgress: Send + Sync {
    fn on_start(&self, challenge_id: &str);
    fn on_complete(&self, result: &ChallengeVerification);
    fn on_finish(&self, total: usize, passed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopProgress;

impl VerifyProgress for NoopProgress {
    fn on_start(&self, _: &str) {}
    fn on_complete(&self, _: &ChallengeVerification) {}
    fn on_finish(&self, _: usize, _: usize, _: Duration) {}
}

/// How one reference solution fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationStatus {
    Graded { tier: Tier, points: u32 },
    /// No reference solution to run.
    Skipped,
    /// The evaluator itself failed.
    Error { message: String },
}

/// Result for one challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeVerification {
    pub challenge_id: String,
    pub stage: Stage,
    pub status: VerificationStatus,
    #[serde(default)]
    pub feedback: Vec<String>,
    pub duration_ms: u64,
}

impl ChallengeVerification {
    pub fn passed(&self) -> bool {
        matches!(
            self.status,
            VerificationStatus::Graded {
                tier: Tier::Full,
                ..
            }
        )
    }
}

/// A complete verification report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub catalog_id: String,
    pub evaluator: String,
    /// Results in catalog order.
    pub results: Vec<ChallengeVerification>,
    pub duration_ms: u64,
}

impl VerificationReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Challenges whose reference solution ran but missed full credit, or
    /// could not be evaluated.
    pub fn failures(&self) -> impl Iterator<Item = &ChallengeVerification> {
        self.results
            .iter()
            .filter(|r| !r.passed() && r.status != VerificationStatus::Skipped)
    }

    pub fn all_passed(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }
}

/// Run every reference solution in `catalog` and grade it.
pub async fn verify_catalog(
    catalog: &Catalog,
    evaluator: Arc<dyn CodeEvaluator>,
    config: &VerifyConfig,
    progress: &dyn VerifyProgress,
) -> Result<VerificationReport> {
    let start = Instant::now();
    let run_id = Uuid::new_v4();
    let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
    tracing::info!(%run_id, challenges = catalog.challenges.len(), "verifying catalog");

    let mut results: Vec<(usize, ChallengeVerification)> = Vec::new();
    let mut futures = FuturesUnordered::new();

    for (index, challenge) in catalog.challenges.iter().enumerate() {
        let Some(source) = challenge.reference_solution.clone() else {
            tracing::debug!(challenge = %challenge.id, "no reference solution, skipping");
            results.push((
                index,
                ChallengeVerification {
                    challenge_id: challenge.id.clone(),
                    stage: challenge.stage,
                    status: VerificationStatus::Skipped,
                    feedback: Vec::new(),
                    duration_ms: 0,
                },
            ));
            continue;
        };

        let evaluator = Arc::clone(&evaluator);
        let semaphore = Arc::clone(&semaphore);
        let challenge = challenge.clone();
        let timeout_secs = challenge.timeout_secs.unwrap_or(config.timeout_secs);
        progress.on_start(&challenge.id);

        futures.push(async move {
            let started = Instant::now();
            let request = EvaluateRequest::new(source)
                .with_probes(challenge.probes())
                .with_timeout(timeout_secs);

            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => evaluator.evaluate(&request).await,
                Err(_) => Err(anyhow::anyhow!("semaphore closed")),
            };

            let (status, feedback) = match outcome {
                Ok(evaluation) => {
                    let assessment = assess(&challenge, &evaluation);
                    (
                        VerificationStatus::Graded {
                            tier: assessment.tier,
                            points: assessment.points,
                        },
                        assessment.feedback,
                    )
                }
                Err(e) => {
                    tracing::error!("verification failed for {}: {e:#}", challenge.id);
                    (
                        VerificationStatus::Error {
                            message: format!("{e:#}"),
                        },
                        Vec::new(),
                    )
                }
            };

            (
                index,
                ChallengeVerification {
                    challenge_id: challenge.id,
                    stage: challenge.stage,
                    status,
                    feedback,
                    duration_ms: started.elapsed().as_millis() as u64,
                },
            )
        });
    }

    while let Some((index, result)) = futures.next().await {
        progress.on_complete(&result);
        results.push((index, result));
    }
    results.sort_by_key(|(index, _)| *index);
    let results: Vec<ChallengeVerification> = results.into_iter().map(|(_, r)| r).collect();

    let elapsed = start.elapsed();
    let passed = results.iter().filter(|r| r.passed()).count();
    progress.on_finish(results.len(), passed, elapsed);

    Ok(VerificationReport {
        id: run_id,
        created_at: Utc::now(),
        catalog_id: catalog.id.clone(),
        evaluator: evaluator.name().to_string(),
        results,
        duration_ms: elapsed.as_millis() as u64,
    })
}
