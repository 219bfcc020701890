//! Scratch directory for one evaluation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;

use pytutor_core::results::Evaluation;
use pytutor_core::traits::EvaluateRequest;

/// Harness script executed by the interpreter.
pub const HARNESS: &str = include_str!("harness.py");

const HARNESS_FILE: &str = "harness.py";
const REQUEST_FILE: &str = "request.json";
const REPORT_FILE: &str = "report.json";

/// A temporary directory holding the harness, the request and the report.
///
/// On drop, the temporary directory is automatically cleaned up.
pub struct Sandbox {
    work_dir: TempDir,
    timeout: Duration,
}

impl Sandbox {
    /// Create a sandbox with the harness script already in place.
    pub fn new(timeout: Duration) -> Result<Self> {
        let work_dir = tempfile::Builder::new()
            .prefix("pytutor-")
            .tempdir()
            .context("failed to create temp directory")?;

        std::fs::write(work_dir.path().join(HARNESS_FILE), HARNESS)
            .context("failed to write harness script")?;

        Ok(Self { work_dir, timeout })
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn harness_path(&self) -> PathBuf {
        self.work_dir.path().join(HARNESS_FILE)
    }

    pub fn request_path(&self) -> PathBuf {
        self.work_dir.path().join(REQUEST_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.work_dir.path().join(REPORT_FILE)
    }

    /// Write the source and probes for the harness to pick up.
    pub fn write_request(&self, request: &EvaluateRequest) -> Result<()> {
        let json = serde_json::to_string(request).context("failed to serialize request")?;
        std::fs::write(self.request_path(), json).context("failed to write request.json")?;
        Ok(())
    }

    /// Read the harness report, if the harness got far enough to write one.
    pub fn read_report(&self) -> Result<Option<Evaluation>> {
        let path = self.report_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("failed to read report.json"),
        };
        let evaluation = serde_json::from_str(&content)
            .with_context(|| format!("malformed harness report: {}", path.display()))?;
        Ok(Some(evaluation))
    }

    /// Build environment variables for the interpreter process.
    ///
    /// Points temp files at the sandbox and blanks sensitive env vars.
    pub fn build_env(&self) -> Vec<(String, String)> {
        let work_dir = self.work_dir.path().to_string_lossy().to_string();
        let mut env = vec![
            ("TMPDIR".to_string(), work_dir.clone()),
            ("HOME".to_string(), work_dir),
        ];

        for var in &[
            "SSH_AUTH_SOCK",
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "AWS_SESSION_TOKEN",
            "GITHUB_TOKEN",
            "GH_TOKEN",
            "ANTHROPIC_API_KEY",
            "OPENAI_API_KEY",
            "DOCKER_HOST",
            "DOCKER_CONFIG",
            "KUBECONFIG",
            "DATABASE_URL",
            "NPM_TOKEN",
            "PYPI_TOKEN",
        ] {
            env.push((var.to_string(), String::new()));
        }

        env
    }
}
