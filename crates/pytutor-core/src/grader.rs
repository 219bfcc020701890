//! Challenge grader.
//!
//! Drives one attempt through its phases:
//! Prompting -> Collecting -> Evaluating -> Scoring -> Recording -> Done.
//! A failed execution goes straight from Evaluating to Recording with the
//! consolation tier. Points are always recorded, full credit marks the
//! challenge complete, and mastery achievements are checked afterwards.

use std::fmt;
use std::io;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::achievements;
use crate::model::{Catalog, Challenge};
use crate::progress::{LevelChange, ProgressStore};
use crate::results::Evaluation;
use crate::scoring::{assess, Assessment};
use crate::traits::{CodeEvaluator, EvaluateRequest};

/// Line that ends code entry.
pub const DEFAULT_SENTINEL: &str = "RUN";

/// Execution timeout when neither the challenge nor the grader sets one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where an attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingPhase {
    Prompting,
    Collecting,
    Evaluating,
    Scoring,
    Recording,
    Done,
}

impl fmt::Display for GradingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GradingPhase::Prompting => "prompting",
            GradingPhase::Collecting => "collecting",
            GradingPhase::Evaluating => "evaluating",
            GradingPhase::Scoring => "scoring",
            GradingPhase::Recording => "recording",
            GradingPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything that happened during one graded attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub challenge_id: String,
    pub assessment: Assessment,
    pub evaluation: Evaluation,
    /// True only the first time the challenge reached full credit.
    pub newly_completed: bool,
    pub level_before: u32,
    pub level_after: u32,
    /// Achievements unlocked by this attempt, in unlock order.
    pub unlocked: Vec<String>,
}

impl AttemptReport {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Read learner source from `reader` until a line equal to `sentinel`.
///
/// Lines are joined with `\n` and the sentinel line is dropped. Returns
/// `None` when input ends before the sentinel arrives.
pub async fn collect_source<R>(reader: &mut R, sentinel: &str) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines: Vec<String> = Vec::new();
    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf).await? == 0 {
            return Ok(None);
        }
        let line = buf.trim_end_matches(['\n', '\r']);
        if line == sentinel {
            return Ok(Some(lines.join("\n")));
        }
        lines.push(line.to_string());
    }
}

/// Grades challenge attempts against a catalog with a given evaluator.
pub struct ChallengeGrader<'a> {
    evaluator: &'a dyn CodeEvaluator,
    catalog: &'a Catalog,
    sentinel: String,
    timeout_secs: u64,
    phase: GradingPhase,
}

impl<'a> ChallengeGrader<'a> {
    pub fn new(evaluator: &'a dyn CodeEvaluator, catalog: &'a Catalog) -> Self {
        Self {
            evaluator,
            catalog,
            sentinel: DEFAULT_SENTINEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            phase: GradingPhase::Done,
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn phase(&self) -> GradingPhase {
        self.phase
    }

    fn enter(&mut self, phase: GradingPhase, challenge: &Challenge) {
        tracing::debug!(challenge = %challenge.id, from = %self.phase, to = %phase, "grading phase");
        self.phase = phase;
    }

    /// Run `source` and assess it without touching any progress record.
    pub async fn evaluate(
        &mut self,
        challenge: &Challenge,
        source: &str,
    ) -> Result<(Evaluation, Assessment)> {
        self.enter(GradingPhase::Evaluating, challenge);
        let request = EvaluateRequest::new(source)
            .with_probes(challenge.probes())
            .with_timeout(challenge.timeout_secs.unwrap_or(self.timeout_secs));

        let evaluation = self
            .evaluator
            .evaluate(&request)
            .await
            .with_context(|| format!("{} could not evaluate the code", self.evaluator.name()))?;

        if evaluation.is_success() {
            self.enter(GradingPhase::Scoring, challenge);
        }
        let assessment = assess(challenge, &evaluation);
        tracing::info!(
            challenge = %challenge.id,
            tier = %assessment.tier,
            points = assessment.points,
            duration_ms = evaluation.duration_ms,
            "attempt assessed"
        );
        Ok((evaluation, assessment))
    }

    /// Evaluate, score and record one attempt.
    ///
    /// An `Err` means the evaluator could not run or the record could not
    /// be saved; learner mistakes are always an `Ok` report.
    pub async fn attempt(
        &mut self,
        challenge: &Challenge,
        source: &str,
        store: &mut ProgressStore,
    ) -> Result<AttemptReport> {
        let (evaluation, assessment) = self.evaluate(challenge, source).await?;

        self.enter(GradingPhase::Recording, challenge);
        let LevelChange { from, to } = store.add_points(assessment.points, challenge.stage)?;

        let mut newly_completed = false;
        let mut unlocked = Vec::new();
        if assessment.is_full_credit() {
            newly_completed = store.mark_challenge_complete(&challenge.id, challenge.stage)?;
            for label in
                achievements::due_after_challenge(store.record(), self.catalog, challenge.stage)
            {
                if store.unlock_achievement(&label)? {
                    tracing::info!(achievement = %label, "achievement unlocked");
                    unlocked.push(label);
                }
            }
        }

        self.enter(GradingPhase::Done, challenge);
        Ok(AttemptReport {
            challenge_id: challenge.id.clone(),
            assessment,
            evaluation,
            newly_completed,
            level_before: from,
            level_after: to,
            unlocked,
        })
    }

    /// Prompt for code on `writer`, collect it from `reader`, attempt and
    /// print the feedback. Returns `None` when input ends before the
    /// sentinel.
    pub async fn run_interactive<R, W>(
        &mut self,
        challenge: &Challenge,
        reader: &mut R,
        writer: &mut W,
        store: &mut ProgressStore,
    ) -> Result<Option<AttemptReport>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.enter(GradingPhase::Prompting, challenge);
        let banner = "=".repeat(60);
        let prompt = format!(
            "\n{banner}\n{}\n{banner}\n\n{}\n\nEnter your code (type '{}' on a new line when done):\n",
            challenge.title,
            challenge.prompt.trim_end(),
            self.sentinel
        );
        writer.write_all(prompt.as_bytes()).await?;
        writer.flush().await?;

        self.enter(GradingPhase::Collecting, challenge);
        let Some(source) = collect_source(reader, &self.sentinel).await? else {
            tracing::debug!(challenge = %challenge.id, "input ended before sentinel");
            return Ok(None);
        };

        let report = self.attempt(challenge, &source, store).await?;
        writer.write_all(render_feedback(&report).as_bytes()).await?;
        writer.flush().await?;
        Ok(Some(report))
    }
}

/// Learner-facing text for an attempt.
pub fn render_feedback(report: &AttemptReport) -> String {
    use crate::model::Tier;

    let assessment = &report.assessment;
    let mut out = String::new();
    if !report.evaluation.output.is_empty() {
        out.push_str("\nOutput:\n");
        out.push_str(report.evaluation.output.trim_end());
        out.push('\n');
    }

    match assessment.tier {
        Tier::Full => {
            out.push_str(&format!(
                "\nCorrect! You earned {} points!\n",
                assessment.points
            ));
        }
        Tier::Consolation => {
            for line in &assessment.feedback {
                out.push_str(&format!("\n{line}\n"));
            }
            out.push_str(&format!(
                "Try again! You earned {} points for trying.\n",
                assessment.points
            ));
        }
        Tier::Partial | Tier::Missing => {
            out.push_str("\nNot quite right:\n");
            for line in &assessment.feedback {
                out.push_str(&format!("  - {line}\n"));
            }
            out.push_str(&format!(
                "You earned {} points for trying.\n",
                assessment.points
            ));
        }
    }

    if report.leveled_up() {
        out.push_str(&format!(
            "\nLEVEL UP! You are now level {}!\n",
            report.level_after
        ));
    }
    for label in &report.unlocked {
        out.push_str(&format!("\nACHIEVEMENT UNLOCKED: {label}\n"));
    }
    out
}
