//! Worker mode: one job in on stdin, one result out on stdout.
//!
//! # Usage
//!
//! ```bash
//! echo '{"input": {"text": "Hola como esta?", "language_id": "es"}}' | tts-worker run
//! ```
//!
//! Logs go to stderr so stdout only ever carries the JSON result.

pub mod protocol;

use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use log::{error, info};
use protocol::{JobOutput, SynthesisJob};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Read one job document from `input` and execute it.
///
/// A read failure is reported as a `{error}` result like any other bad job.
pub async fn run_job<R>(pipeline: &Pipeline, mut input: R) -> JobOutput
where
    R: AsyncRead + Unpin,
{
    let mut raw = Vec::new();
    if let Err(e) = input.read_to_end(&mut raw).await {
        error!("Failed to read job: {}", e);
        return JobOutput::failure(format!("Failed to read job: {}", e));
    }
    execute_job(pipeline, &raw).await
}

/// Execute one raw job document and build its result.
///
/// Every failure, including invalid UTF-8 and malformed JSON, becomes a
/// `{error}` result.
pub async fn execute_job(pipeline: &Pipeline, raw: &[u8]) -> JobOutput {
    let job: SynthesisJob = match serde_json::from_slice(raw) {
        Ok(job) => job,
        Err(e) => {
            error!("Rejected malformed job: {}", e);
            return JobOutput::failure(format!("Invalid job: {}", e));
        }
    };

    let job_id = job.id.as_deref().unwrap_or("-");
    info!("Job {} started", job_id);

    let outcome = match pipeline.run(&job.input).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Job {} failed ({:?}): {}", job_id, e.kind(), e);
            return JobOutput::failure(e);
        }
    };

    match JobOutput::success(&outcome) {
        Ok(output) => {
            info!(
                "Job {} completed: {} chunk(s), {:.2}s",
                job_id,
                outcome.chunks_processed,
                outcome.duration_seconds()
            );
            output
        }
        Err(e) => {
            error!("Job {} failed to encode audio: {:#}", job_id, e);
            JobOutput::failure(format!("{:#}", e))
        }
    }
}

/// Write a job result to stdout as a single JSON line.
pub async fn write_output(output: &JobOutput) -> Result<()> {
    let mut json = serde_json::to_string(output).context("Failed to serialize result")?;
    json.push('\n');

    let mut stdout = tokio::io::stdout();
    stdout.write_all(json.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
