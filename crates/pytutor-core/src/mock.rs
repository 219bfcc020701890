//! Mock evaluator for testing the grader without a Python interpreter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::results::Evaluation;
use crate::traits::{CodeEvaluator, EvaluateRequest};

/// Returns scripted evaluations instead of running anything.
///
/// A response registered with [`MockEvaluator::respond_to`] is returned
/// whenever the source contains its key. Otherwise scripted responses are
/// consumed in order, and once they run out the fallback is returned for
/// every further call.
pub struct MockEvaluator {
    /// Source substring -> evaluation.
    responses: Vec<(String, Evaluation)>,
    scripted: Mutex<VecDeque<Evaluation>>,
    fallback: Result<Evaluation, String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<EvaluateRequest>>,
}

impl MockEvaluator {
    /// A mock that answers with `responses` in order, then with `fallback`.
    pub fn new(responses: Vec<Evaluation>, fallback: Evaluation) -> Self {
        Self {
            responses: Vec::new(),
            scripted: Mutex::new(responses.into()),
            fallback: Ok(fallback),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A mock that always returns the same evaluation.
    pub fn with_fixed(evaluation: Evaluation) -> Self {
        Self::new(Vec::new(), evaluation)
    }

    /// A mock whose every call fails as if the interpreter were missing.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Vec::new(),
            scripted: Mutex::new(VecDeque::new()),
            fallback: Err(message.to_string()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Answer with `evaluation` whenever the source contains `needle`.
    pub fn respond_to(mut self, needle: &str, evaluation: Evaluation) -> Self {
        self.responses.push((needle.to_string(), evaluation));
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<EvaluateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeEvaluator for MockEvaluator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn evaluate(&self, request: &EvaluateRequest) -> anyhow::Result<Evaluation> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some((_, evaluation)) = self
            .responses
            .iter()
            .find(|(needle, _)| request.source.contains(needle.as_str()))
        {
            return Ok(evaluation.clone());
        }
        if let Some(next) = self.scripted.lock().unwrap().pop_front() {
            return Ok(next);
        }
        match &self.fallback {
            Ok(evaluation) => Ok(evaluation.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}
