//! Cancel, purge, hold, release, and reclass jobs.
//!
//! - `PUT    /zosmf/restjobs/jobs/<jobname>/<jobid>` with a request body
//! - `DELETE /zosmf/restjobs/jobs/<jobname>/<jobid>`
//!
//! Synchronous processing (version 2.0) returns a feedback document;
//! asynchronous processing (version 1.0) returns nothing.

use crate::get::RESOURCE;
use crate::types::JobFeedback;
use reqwest::Method;
use serde_json::json;
use zosmf_sdk::headers::X_IBM_JOB_MODIFY_VERSION;
use zosmf_sdk::{encode_uri_component, Result, ZosmfError, ZosmfSession};

/// Job modify protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifyVersion {
    /// Asynchronous. The request is accepted and no feedback is
    /// returned.
    #[default]
    V1,
    /// Synchronous. z/OSMF waits for the action and returns a
    /// feedback document.
    V2,
}

impl ModifyVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "1.0",
            Self::V2 => "2.0",
        }
    }
}

/// Requested changes for [`modify_job`]. At least one field must be
/// set, and `hold` and `release` are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifyJobOptions {
    /// New single-character job class.
    pub job_class: Option<String>,
    pub hold: bool,
    pub release: bool,
}

fn job_resource(jobname: &str, jobid: &str) -> Result<String> {
    if jobname.trim().is_empty() {
        return Err(ZosmfError::validation("job name is required"));
    }
    if jobid.trim().is_empty() {
        return Err(ZosmfError::validation("job id is required"));
    }
    Ok(format!(
        "{}/{}/{}",
        RESOURCE,
        encode_uri_component(jobname),
        encode_uri_component(jobid)
    ))
}

fn parse_feedback(text: &str) -> Result<Option<JobFeedback>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let feedback = serde_json::from_str(text)
        .map_err(|err| ZosmfError::invalid_response(format!("malformed job feedback: {err}")))?;
    Ok(Some(feedback))
}

/// Cancel a job. Version 2.0 waits for the cancel and returns the
/// feedback document; version 1.0 returns `None`.
pub async fn cancel_job(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
    version: ModifyVersion,
) -> Result<Option<JobFeedback>> {
    let resource = job_resource(jobname, jobid)?;
    tracing::debug!(%jobname, %jobid, version = version.as_str(), "cancelling job");
    let request = session
        .request(Method::PUT, &resource)?
        .json(&json!({ "request": "cancel", "version": version.as_str() }));
    let text = session.send_text(request).await?;
    parse_feedback(&text)
}

/// Cancel a job and purge its output. Version 2.0 returns the
/// feedback document; version 1.0 returns `None`.
pub async fn delete_job(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
    version: ModifyVersion,
) -> Result<Option<JobFeedback>> {
    let resource = job_resource(jobname, jobid)?;
    tracing::debug!(%jobname, %jobid, version = version.as_str(), "purging job");
    let request = session
        .request(Method::DELETE, &resource)?
        .header(X_IBM_JOB_MODIFY_VERSION, version.as_str());
    let text = session.send_text(request).await?;
    parse_feedback(&text)
}

/// Hold, release, or change the class of a job. When both a hold or
/// release and a class change are requested, the hold or release is
/// applied first. Returns the feedback from the last request that
/// produced one.
pub async fn modify_job(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
    options: &ModifyJobOptions,
) -> Result<Option<JobFeedback>> {
    let resource = job_resource(jobname, jobid)?;
    if options.hold && options.release {
        return Err(ZosmfError::validation(
            "hold and release are mutually exclusive",
        ));
    }
    if !options.hold && !options.release && options.job_class.is_none() {
        return Err(ZosmfError::validation(
            "at least one modification is required: hold, release, or a job class",
        ));
    }
    if let Some(class) = &options.job_class {
        if class.trim().is_empty() {
            return Err(ZosmfError::validation("job class must not be blank"));
        }
    }

    let mut feedback = None;
    if options.hold || options.release {
        let request = if options.hold { "hold" } else { "release" };
        tracing::debug!(%jobname, %jobid, %request, "modifying job");
        let text = session
            .send_text(
                session
                    .request(Method::PUT, &resource)?
                    .json(&json!({ "request": request, "version": "2.0" })),
            )
            .await?;
        feedback = parse_feedback(&text)?;
    }
    if let Some(class) = &options.job_class {
        tracing::debug!(%jobname, %jobid, %class, "changing job class");
        let text = session
            .send_text(
                session
                    .request(Method::PUT, &resource)?
                    .json(&json!({ "class": class, "version": "2.0" })),
            )
            .await?;
        if let Some(parsed) = parse_feedback(&text)? {
            feedback = Some(parsed);
        }
    }
    Ok(feedback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use zosmf_sdk::{ZosmfAuth, ZosmfConnection};

    fn session_for(server: &MockServer) -> ZosmfSession {
        ZosmfSession::new(
            ZosmfConnection::from_url(&server.base_url()).unwrap(),
            ZosmfAuth::None,
        )
        .unwrap()
    }

    fn feedback_body() -> serde_json::Value {
        json!({
            "job-correlator": "J0000123SVSCJES2",
            "jobname": "IEFBR14A",
            "jobid": "JOB00123",
            "message": "Request was successful.",
            "owner": "IBMUSER",
            "status": "0",
            "member": "JES2",
            "sysname": "SVSC",
            "internal-code": "0",
            "original-jobid": "JOB00123"
        })
    }

    #[tokio::test]
    async fn test_cancel_v1_sends_request_and_returns_no_feedback() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restjobs/jobs/IEFBR14A/JOB00123")
                .json_body(json!({ "request": "cancel", "version": "1.0" }));
            then.status(202);
        });

        let feedback = cancel_job(&session_for(&server), "IEFBR14A", "JOB00123", ModifyVersion::V1)
            .await
            .unwrap();
        mock.assert();
        assert!(feedback.is_none());
    }

    #[tokio::test]
    async fn test_cancel_v2_parses_feedback() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restjobs/jobs/IEFBR14A/JOB00123")
                .json_body(json!({ "request": "cancel", "version": "2.0" }));
            then.status(200).json_body(feedback_body());
        });

        let feedback = cancel_job(&session_for(&server), "IEFBR14A", "JOB00123", ModifyVersion::V2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(feedback.jobid, "JOB00123");
        assert_eq!(feedback.message, "Request was successful.");
        assert_eq!(feedback.original_jobid, "JOB00123");
    }

    #[tokio::test]
    async fn test_delete_sets_modify_version_header() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/zosmf/restjobs/jobs/IEFBR14A/JOB00123")
                .header("X-IBM-Job-Modify-Version", "2.0");
            then.status(200).json_body(feedback_body());
        });

        let feedback = delete_job(&session_for(&server), "IEFBR14A", "JOB00123", ModifyVersion::V2)
            .await
            .unwrap();
        mock.assert();
        assert!(feedback.is_some());
    }

    #[tokio::test]
    async fn test_modify_hold_then_class_change() {
        let server = MockServer::start_async().await;
        let hold = server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restjobs/jobs/IEFBR14A/JOB00123")
                .json_body(json!({ "request": "hold", "version": "2.0" }));
            then.status(200).json_body(feedback_body());
        });
        let class = server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restjobs/jobs/IEFBR14A/JOB00123")
                .json_body(json!({ "class": "B", "version": "2.0" }));
            then.status(200).json_body(feedback_body());
        });

        let feedback = modify_job(
            &session_for(&server),
            "IEFBR14A",
            "JOB00123",
            &ModifyJobOptions {
                job_class: Some("B".to_string()),
                hold: true,
                release: false,
            },
        )
        .await
        .unwrap();
        hold.assert();
        class.assert();
        assert!(feedback.is_some());
    }

    #[tokio::test]
    async fn test_modify_rejects_conflicting_and_empty_requests() {
        let server = MockServer::start_async().await;
        let session = session_for(&server);
        let conflicting = modify_job(
            &session,
            "IEFBR14A",
            "JOB00123",
            &ModifyJobOptions {
                job_class: None,
                hold: true,
                release: true,
            },
        )
        .await
        .unwrap_err();
        assert!(conflicting.to_string().contains("mutually exclusive"));

        let empty = modify_job(&session, "IEFBR14A", "JOB00123", &ModifyJobOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(empty, ZosmfError::Validation { .. }));
    }
}
