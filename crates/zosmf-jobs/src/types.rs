//! Job documents returned by the jobs REST service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use zosmf_sdk::{Result, ZosmfError};

/// One batch job as reported by z/OSMF. Execution-data fields are only
/// present when the list query asked for them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Job {
    pub jobid: String,
    pub jobname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub job_type: String,
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retcode: Option<String>,
    #[serde(rename = "job-correlator", skip_serializing_if = "Option::is_none")]
    pub job_correlator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<i64>,
    #[serde(rename = "phase-name", skip_serializing_if = "Option::is_none")]
    pub phase_name: Option<String>,
    pub url: String,
    #[serde(rename = "files-url")]
    pub files_url: String,
    #[serde(rename = "exec-system", skip_serializing_if = "Option::is_none")]
    pub exec_system: Option<String>,
    #[serde(rename = "exec-member", skip_serializing_if = "Option::is_none")]
    pub exec_member: Option<String>,
    #[serde(rename = "exec-submitted", skip_serializing_if = "Option::is_none")]
    pub exec_submitted: Option<String>,
    #[serde(rename = "exec-started", skip_serializing_if = "Option::is_none")]
    pub exec_started: Option<String>,
    #[serde(rename = "exec-ended", skip_serializing_if = "Option::is_none")]
    pub exec_ended: Option<String>,
    #[serde(rename = "reason-not-running", skip_serializing_if = "Option::is_none")]
    pub reason_not_running: Option<String>,
}

/// One spool file belonging to a job. Content is fetched separately by
/// the numeric `id`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobFile {
    pub jobid: String,
    pub jobname: String,
    pub id: i64,
    pub recfm: String,
    pub lrecl: i64,
    #[serde(rename = "byte-count")]
    pub byte_count: i64,
    #[serde(rename = "record-count")]
    pub record_count: i64,
    #[serde(rename = "job-correlator", skip_serializing_if = "Option::is_none")]
    pub job_correlator: Option<String>,
    pub class: String,
    pub ddname: String,
    #[serde(rename = "records-url")]
    pub records_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stepname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procstep: Option<String>,
}

/// Job phases in the order JES moves jobs through them. The derived
/// ordering makes `Input < Active < Output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobStatus {
    Input,
    Active,
    Output,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Active => "ACTIVE",
            Self::Output => "OUTPUT",
        }
    }

    /// Parse a status string from the server, case-insensitively.
    /// Anything outside the three known phases is an error.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_uppercase().as_str() {
            "INPUT" => Ok(Self::Input),
            "ACTIVE" => Ok(Self::Active),
            "OUTPUT" => Ok(Self::Output),
            _ => Err(ZosmfError::invalid_response(format!(
                "an unknown job status \"{value}\" was received"
            ))),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the JCL to submit comes from. Chosen once at the submit
/// boundary; everything downstream matches on it exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum JclSource {
    /// A cataloged data set or member holding the JCL.
    Dataset(String),
    /// A USS file holding the JCL.
    UssFile(String),
    /// A file on the local machine; read and submitted as inline text.
    LocalFile(PathBuf),
    /// Inline JCL text.
    Jcl(String),
}

/// Spool file content collected after a job finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpoolFile {
    pub id: i64,
    pub ddname: String,
    pub stepname: Option<String>,
    pub procstep: Option<String>,
    pub data: String,
}

/// Response document of the synchronous (version 2.0) job modify
/// interface.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobFeedback {
    pub jobid: String,
    pub jobname: String,
    #[serde(rename = "original-jobid")]
    pub original_jobid: String,
    pub owner: String,
    pub member: String,
    pub sysname: String,
    #[serde(rename = "job-correlator")]
    pub job_correlator: String,
    pub status: String,
    #[serde(rename = "internal-code")]
    pub internal_code: String,
    pub message: String,
}
