//! Result types produced by a code evaluator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The outcome of running one block of learner source.
///
/// Output may be present whether or not execution succeeded; bindings and
/// the failure description are mutually exclusive via [`Outcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Everything written to standard output, concatenated.
    pub output: String,
    /// Bindings on success, or the failure description.
    pub outcome: Outcome,
    /// Wall-clock execution time in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

/// Success with bindings, or failure with a description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Completed {
        /// Top-level names and their values after execution.
        bindings: BTreeMap<String, Value>,
        /// One result per requested probe, in request order.
        #[serde(default)]
        probes: Vec<ProbeResult>,
    },
    Failed {
        /// Human-readable cause, e.g. `NameError: name 'x' is not defined`.
        error: String,
    },
}

/// The result of evaluating one probe expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeResult {
    Value { value: Value },
    Error { error: String },
}

impl Evaluation {
    /// A successful evaluation.
    pub fn completed(
        output: impl Into<String>,
        bindings: BTreeMap<String, Value>,
        probes: Vec<ProbeResult>,
    ) -> Self {
        Self {
            output: output.into(),
            outcome: Outcome::Completed { bindings, probes },
            duration_ms: 0,
        }
    }

    /// A failed evaluation.
    pub fn failed(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            outcome: Outcome::Failed {
                error: error.into(),
            },
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Completed { .. })
    }

    /// Bindings when execution completed.
    pub fn bindings(&self) -> Option<&BTreeMap<String, Value>> {
        match &self.outcome {
            Outcome::Completed { bindings, .. } => Some(bindings),
            Outcome::Failed { .. } => None,
        }
    }

    /// Failure description when execution failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Completed { .. } => None,
            Outcome::Failed { error } => Some(error),
        }
    }

    /// Result for the probe at `index`.
    pub fn probe(&self, index: usize) -> Option<&ProbeResult> {
        match &self.outcome {
            Outcome::Completed { probes, .. } => probes.get(index),
            Outcome::Failed { .. } => None,
        }
    }
}
