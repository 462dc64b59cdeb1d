//! Poll a job until it reaches a wanted status.
//!
//! Re-reads `GET /zosmf/restjobs/jobs/<jobname>/<jobid>` on a fixed
//! interval. A job that has already moved past the wanted status
//! satisfies the wait immediately, since JES never moves a job
//! backwards through INPUT, ACTIVE, OUTPUT.

use crate::get;
use crate::types::{Job, JobStatus};
use std::time::Duration;
use zosmf_sdk::{Result, ZosmfError, ZosmfSession};

/// Interval between status polls when none is configured.
pub const DEFAULT_WATCH_DELAY: Duration = Duration::from_millis(3000);

/// Controls for a status wait.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    /// Status that ends the wait.
    pub status: JobStatus,
    /// Maximum number of polls; unset keeps polling until the status
    /// is observed.
    pub attempts: Option<u32>,
    /// Pause between polls.
    pub watch_delay: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            status: JobStatus::Output,
            attempts: None,
            watch_delay: DEFAULT_WATCH_DELAY,
        }
    }
}

/// Wait for a job to reach OUTPUT, polling every three seconds.
pub async fn wait_for_output_status(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
) -> Result<Job> {
    wait_for_status(session, jobname, jobid, &MonitorOptions::default()).await
}

/// Wait for a job to reach ACTIVE (or beyond), polling every three
/// seconds.
pub async fn wait_for_active_status(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
) -> Result<Job> {
    wait_for_status(
        session,
        jobname,
        jobid,
        &MonitorOptions {
            status: JobStatus::Active,
            ..Default::default()
        },
    )
    .await
}

/// Wait for a previously fetched job to reach OUTPUT.
pub async fn wait_for_job_output_status(session: &ZosmfSession, job: &Job) -> Result<Job> {
    wait_for_output_status(session, &job.jobname, &job.jobid).await
}

/// Wait for a job to reach the configured status, returning the final
/// job document. Runs out of attempts with a timeout error; a status
/// string outside INPUT, ACTIVE, OUTPUT fails the wait.
pub async fn wait_for_status(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
    options: &MonitorOptions,
) -> Result<Job> {
    if jobname.trim().is_empty() || jobid.trim().is_empty() {
        return Err(ZosmfError::validation("jobname and jobid are required"));
    }
    if options.attempts == Some(0) {
        return Err(ZosmfError::validation("attempts must be a positive integer"));
    }

    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        tracing::debug!(
            %jobname,
            %jobid,
            wanted = %options.status,
            attempt,
            "polling job status"
        );
        let job = get::get_status(session, jobname, jobid).await.map_err(|err| {
            tracing::error!(%jobname, %jobid, error = %err, "status poll failed");
            err
        })?;
        let current = match &job.status {
            Some(status) => JobStatus::parse(status)?,
            None => {
                return Err(ZosmfError::invalid_response(format!(
                    "job {jobname} ({jobid}) returned no status"
                )))
            }
        };
        if current >= options.status {
            tracing::debug!(%jobname, %jobid, status = %current, attempt, "wanted status reached");
            return Ok(job);
        }
        if let Some(max) = options.attempts {
            if attempt >= max {
                return Err(ZosmfError::timeout(format!(
                    "reached max poll attempts of {max} waiting for job {jobname} ({jobid}) to reach {}",
                    options.status
                )));
            }
        }
        tokio::time::sleep(options.watch_delay).await;
    }
}
