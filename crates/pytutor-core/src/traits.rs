//! The seam between the grader and whatever executes learner code.
//!
//! `pytutor-runner` implements [`CodeEvaluator`] with a sandboxed Python
//! subprocess; [`crate::mock::MockEvaluator`] implements it for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::results::Evaluation;

/// Executes learner source and reports output and bindings.
///
/// Learner mistakes (syntax errors, exceptions, timeouts) are reported as
/// a failed [`Evaluation`], never as `Err`. An `Err` means the evaluator
/// itself is unusable, e.g. the interpreter could not be started.
#[async_trait]
pub trait CodeEvaluator: Send + Sync {
    /// Human-readable evaluator name (e.g. "python3").
    fn name(&self) -> &str;

    /// Run `request.source` in a fresh namespace.
    async fn evaluate(&self, request: &EvaluateRequest) -> anyhow::Result<Evaluation>;
}

/// Request to evaluate one block of source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// The learner's source text.
    pub source: String,
    /// Expressions evaluated in the resulting namespace after the source ran.
    #[serde(default)]
    pub probes: Vec<String>,
    /// Execution timeout in seconds (0 = evaluator default).
    #[serde(default)]
    pub timeout_secs: u64,
}

impl EvaluateRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            probes: Vec::new(),
            timeout_secs: 0,
        }
    }

    pub fn with_probes(mut self, probes: Vec<String>) -> Self {
        self.probes = probes;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
