//! pytutor-runner: Sandboxed Python execution.
//!
//! Each evaluation gets its own temporary directory and a fresh isolated
//! interpreter process. The harness script runs the learner's source in a
//! clean namespace and reports output, bindings and probe results as JSON.

pub mod interpreter;
pub mod sandbox;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use pytutor_core::results::Evaluation;
use pytutor_core::traits::{CodeEvaluator, EvaluateRequest};

/// Evaluates learner code with a local Python interpreter.
pub struct LocalRunner {
    /// Interpreter program, looked up on `PATH` unless absolute.
    interpreter: String,
    /// Timeout for requests that do not set their own.
    default_timeout: Duration,
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRunner {
    pub fn new() -> Self {
        Self {
            interpreter: "python3".to_string(),
            default_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Make sure the interpreter starts, returning its version string.
    pub async fn check_interpreter(&self) -> Result<String> {
        interpreter::version(&self.interpreter).await
    }

    fn create_sandbox(&self, timeout_secs: u64) -> Result<sandbox::Sandbox> {
        let timeout = if timeout_secs > 0 {
            Duration::from_secs(timeout_secs)
        } else {
            self.default_timeout
        };
        sandbox::Sandbox::new(timeout)
    }
}

#[async_trait]
impl CodeEvaluator for LocalRunner {
    fn name(&self) -> &str {
        &self.interpreter
    }

    async fn evaluate(&self, request: &EvaluateRequest) -> Result<Evaluation> {
        let sandbox = self.create_sandbox(request.timeout_secs)?;
        sandbox.write_request(request)?;
        tracing::debug!(
            dir = %sandbox.work_dir().display(),
            probes = request.probes.len(),
            "running learner code"
        );
        interpreter::execute(&sandbox, &self.interpreter).await
    }
}
