//! Interpreter subprocess for a prepared sandbox.

use std::process::Stdio;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::process::Command;

use pytutor_core::results::Evaluation;

use crate::sandbox::Sandbox;

/// Run the harness in `sandbox` with `program` and collect its report.
///
/// Timeouts and crashes are learner-visible failures, so they come back
/// as a failed [`Evaluation`]. Only a failure to start `program` at all
/// is an `Err`.
pub async fn execute(sandbox: &Sandbox, program: &str) -> Result<Evaluation> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.arg("-I")
        .arg("-B")
        .arg(sandbox.harness_path())
        .arg(sandbox.request_path())
        .arg(sandbox.report_path())
        .current_dir(sandbox.work_dir())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, val) in sandbox.build_env() {
        cmd.env(&key, &val);
    }

    let child = cmd
        .spawn()
        .with_context(|| format!("failed to start interpreter '{program}'"))?;

    let output = match tokio::time::timeout(sandbox.timeout(), child.wait_with_output()).await {
        Ok(result) => result.context("failed to wait for interpreter")?,
        Err(_) => {
            tracing::warn!(
                timeout_secs = sandbox.timeout().as_secs(),
                "execution timed out, interpreter killed"
            );
            return Ok(Evaluation {
                duration_ms: start.elapsed().as_millis() as u64,
                ..Evaluation::failed(
                    "",
                    format!(
                        "TimeoutError: execution exceeded {} seconds",
                        sandbox.timeout().as_secs()
                    ),
                )
            });
        }
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    match sandbox.read_report() {
        Ok(Some(mut evaluation)) => {
            evaluation.duration_ms = duration_ms;
            return Ok(evaluation);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("unreadable harness report: {e:#}");
            return Ok(Evaluation {
                duration_ms,
                ..Evaluation::failed("", format!("InterpreterError: {e:#}"))
            });
        }
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("no diagnostic output");
    tracing::warn!(status = %output.status, "interpreter exited without a report");
    Ok(Evaluation {
        duration_ms,
        ..Evaluation::failed(
            "",
            format!("InterpreterError: exited with {} ({detail})", output.status),
        )
    })
}

/// Version string reported by `program --version`.
pub async fn version(program: &str) -> Result<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("failed to start interpreter '{program}'"))?;

    if !output.status.success() {
        anyhow::bail!("'{program} --version' exited with {}", output.status);
    }

    // Python 2 printed the version to stderr.
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    Ok(String::from_utf8_lossy(&text).trim().to_string())
}
