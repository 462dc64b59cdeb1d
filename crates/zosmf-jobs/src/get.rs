//! Queries for jobs, job status, spool file lists, and spool content.
//!
//! * `GET /zosmf/restjobs/jobs?owner=&prefix=&max-jobs=&jobid=&status=`
//! * `GET /zosmf/restjobs/jobs/<jobname>/<jobid>` for one job's status
//! * `GET /zosmf/restjobs/jobs/<jobname>/<jobid>/files` for spool lists
//! * `GET .../files/<id>/records` for spool content, `.../files/JCL/records`
//!   for the submitted JCL

use crate::types::{Job, JobFile};
use reqwest::Method;
use zosmf_sdk::{encode_uri_component, Result, ZosmfError, ZosmfSession};

pub(crate) const RESOURCE: &str = "/zosmf/restjobs/jobs";

/// Prefix value the server already assumes, never sent on the wire.
const DEFAULT_PREFIX: &str = "*";
/// Server-side default row cap, never sent on the wire.
const DEFAULT_MAX_JOBS: u32 = 1000;

/// Filters for a job list query. Unset fields fall back to the server
/// defaults (owner is the authenticated user, prefix `*`, 1000 rows).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetJobsOptions {
    pub owner: Option<String>,
    pub prefix: Option<String>,
    pub max_jobs: Option<u32>,
    pub jobid: Option<String>,
    /// Ask for the exec-data fields (system, member, timestamps).
    pub exec_data: bool,
    pub status: Option<String>,
}

/// List jobs owned by the authenticated user.
pub async fn get_jobs(session: &ZosmfSession) -> Result<Vec<Job>> {
    get_jobs_common(session, &GetJobsOptions::default()).await
}

/// List jobs matching a job name prefix, wildcards allowed.
pub async fn get_jobs_by_prefix(session: &ZosmfSession, prefix: &str) -> Result<Vec<Job>> {
    if prefix.trim().is_empty() {
        return Err(ZosmfError::validation("job name prefix is required"));
    }
    get_jobs_common(
        session,
        &GetJobsOptions {
            prefix: Some(prefix.to_string()),
            ..Default::default()
        },
    )
    .await
}

/// List jobs owned by a user or user pattern.
pub async fn get_jobs_by_owner(session: &ZosmfSession, owner: &str) -> Result<Vec<Job>> {
    if owner.trim().is_empty() {
        return Err(ZosmfError::validation("job owner is required"));
    }
    get_jobs_common(
        session,
        &GetJobsOptions {
            owner: Some(owner.to_string()),
            ..Default::default()
        },
    )
    .await
}

/// List jobs matching both an owner and a job name prefix.
pub async fn get_jobs_by_owner_and_prefix(
    session: &ZosmfSession,
    owner: &str,
    prefix: &str,
) -> Result<Vec<Job>> {
    if owner.trim().is_empty() {
        return Err(ZosmfError::validation("job owner is required"));
    }
    if prefix.trim().is_empty() {
        return Err(ZosmfError::validation("job name prefix is required"));
    }
    get_jobs_common(
        session,
        &GetJobsOptions {
            owner: Some(owner.to_string()),
            prefix: Some(prefix.to_string()),
            ..Default::default()
        },
    )
    .await
}

/// List jobs matching arbitrary filters.
///
/// The JES2 list service ignores the status filter for finished jobs,
/// so any status other than `ACTIVE` (or `*`) is also applied to the
/// returned rows here.
pub async fn get_jobs_common(session: &ZosmfSession, options: &GetJobsOptions) -> Result<Vec<Job>> {
    let mut query = Vec::new();
    if let Some(owner) = &options.owner {
        query.push(format!("owner={}", encode_uri_component(owner)));
    }
    if let Some(prefix) = &options.prefix {
        if prefix != DEFAULT_PREFIX {
            query.push(format!("prefix={}", encode_uri_component(prefix)));
        }
    }
    if let Some(max_jobs) = options.max_jobs {
        if max_jobs != DEFAULT_MAX_JOBS {
            query.push(format!("max-jobs={max_jobs}"));
        }
    }
    if let Some(jobid) = &options.jobid {
        query.push(format!("jobid={}", encode_uri_component(jobid)));
    }
    if options.exec_data {
        query.push("exec-data=Y".to_string());
    }
    if let Some(status) = &options.status {
        query.push(format!("status={}", encode_uri_component(status)));
    }
    let mut resource = RESOURCE.to_string();
    if !query.is_empty() {
        resource.push('?');
        resource.push_str(&query.join("&"));
    }
    tracing::debug!(%resource, "listing jobs");
    let jobs: Vec<Job> = session
        .send_json(session.request(Method::GET, &resource)?)
        .await?;
    Ok(filter_by_status(jobs, options))
}

fn filter_by_status(jobs: Vec<Job>, options: &GetJobsOptions) -> Vec<Job> {
    match &options.status {
        Some(wanted) if !wanted.eq_ignore_ascii_case("active") && wanted != "*" => jobs
            .into_iter()
            .filter(|job| {
                job.status
                    .as_deref()
                    .is_some_and(|status| status.eq_ignore_ascii_case(wanted))
            })
            .collect(),
        _ => jobs,
    }
}

/// Look up a single job by job ID. Exactly one match is required.
pub async fn get_job(session: &ZosmfSession, jobid: &str) -> Result<Job> {
    if jobid.trim().is_empty() {
        return Err(ZosmfError::validation("job id is required"));
    }
    let mut jobs = get_jobs_common(
        session,
        &GetJobsOptions {
            jobid: Some(jobid.to_string()),
            owner: Some("*".to_string()),
            ..Default::default()
        },
    )
    .await?;
    match jobs.len() {
        0 => Err(ZosmfError::invalid_response(format!(
            "job not found for job id {jobid}"
        ))),
        1 => Ok(jobs.remove(0)),
        found => Err(ZosmfError::invalid_response(format!(
            "expected 1 job returned for job id {jobid} but received {found}"
        ))),
    }
}

/// Fetch the current status document for a job.
pub async fn get_status(session: &ZosmfSession, jobname: &str, jobid: &str) -> Result<Job> {
    if jobname.trim().is_empty() || jobid.trim().is_empty() {
        return Err(ZosmfError::validation("jobname and jobid are required"));
    }
    let resource = format!(
        "{RESOURCE}/{}/{}",
        encode_uri_component(jobname),
        encode_uri_component(jobid)
    );
    tracing::debug!(%resource, "fetching job status");
    session
        .send_json(session.request(Method::GET, &resource)?)
        .await
}

/// Refresh the status of a previously fetched job.
pub async fn get_status_for_job(session: &ZosmfSession, job: &Job) -> Result<Job> {
    get_status(session, &job.jobname, &job.jobid).await
}

/// List the spool files of a job.
pub async fn get_spool_files(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
) -> Result<Vec<JobFile>> {
    if jobname.trim().is_empty() || jobid.trim().is_empty() {
        return Err(ZosmfError::validation("jobname and jobid are required"));
    }
    let resource = format!(
        "{RESOURCE}/{}/{}/files",
        encode_uri_component(jobname),
        encode_uri_component(jobid)
    );
    tracing::debug!(%resource, "listing spool files");
    session
        .send_json(session.request(Method::GET, &resource)?)
        .await
}

/// List the spool files of a previously fetched job.
pub async fn get_spool_files_for_job(session: &ZosmfSession, job: &Job) -> Result<Vec<JobFile>> {
    get_spool_files(session, &job.jobname, &job.jobid).await
}

/// Fetch the content of one spool file by its numeric ID.
pub async fn get_spool_content_by_id(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
    spool_id: i64,
) -> Result<String> {
    if jobname.trim().is_empty() || jobid.trim().is_empty() {
        return Err(ZosmfError::validation("jobname and jobid are required"));
    }
    let resource = format!(
        "{RESOURCE}/{}/{}/files/{spool_id}/records",
        encode_uri_component(jobname),
        encode_uri_component(jobid)
    );
    tracing::debug!(%resource, "fetching spool content");
    session
        .send_text(session.request(Method::GET, &resource)?)
        .await
}

/// Fetch the content of a spool file from its list entry.
pub async fn get_spool_content(session: &ZosmfSession, file: &JobFile) -> Result<String> {
    get_spool_content_by_id(session, &file.jobname, &file.jobid, file.id).await
}

/// Fetch the JCL a job was submitted with.
pub async fn get_jcl(session: &ZosmfSession, jobname: &str, jobid: &str) -> Result<String> {
    if jobname.trim().is_empty() || jobid.trim().is_empty() {
        return Err(ZosmfError::validation("jobname and jobid are required"));
    }
    let resource = format!(
        "{RESOURCE}/{}/{}/files/JCL/records",
        encode_uri_component(jobname),
        encode_uri_component(jobid)
    );
    tracing::debug!(%resource, "fetching job JCL");
    session
        .send_text(session.request(Method::GET, &resource)?)
        .await
}

/// Fetch the JCL of a previously fetched job.
pub async fn get_jcl_for_job(session: &ZosmfSession, job: &Job) -> Result<String> {
    get_jcl(session, &job.jobname, &job.jobid).await
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

    fn job_json(jobid: &str, jobname: &str, status: &str) -> serde_json::Value {
        json!({
            "jobid": jobid,
            "jobname": jobname,
            "owner": "IBMUSER",
            "status": status,
            "type": "JOB",
            "class": "A",
            "url": format!("https://host/zosmf/restjobs/jobs/{jobid}"),
            "files-url": format!("https://host/zosmf/restjobs/jobs/{jobid}/files")
        })
    }

    #[tokio::test]
    async fn test_get_jobs_common_builds_query_in_order() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs")
                .query_param("owner", "IBMU*")
                .query_param("prefix", "PAY*")
                .query_param("max-jobs", "5")
                .query_param("exec-data", "Y");
            then.status(200)
                .json_body(json!([job_json("JOB00001", "PAYROLL", "OUTPUT")]));
        });

        let jobs = get_jobs_common(
            &session_for(&server),
            &GetJobsOptions {
                owner: Some("IBMU*".to_string()),
                prefix: Some("PAY*".to_string()),
                max_jobs: Some(5),
                exec_data: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].jobname, "PAYROLL");
    }

    #[tokio::test]
    async fn test_get_jobs_skips_default_prefix_and_max() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs")
                .query_param("owner", "IBMUSER")
                .query_param_missing("prefix")
                .query_param_missing("max-jobs");
            then.status(200).json_body(json!([]));
        });

        get_jobs_common(
            &session_for(&server),
            &GetJobsOptions {
                owner: Some("IBMUSER".to_string()),
                prefix: Some("*".to_string()),
                max_jobs: Some(1000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_get_jobs_filters_finished_statuses_client_side() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restjobs/jobs");
            then.status(200).json_body(json!([
                job_json("JOB00001", "A", "OUTPUT"),
                job_json("JOB00002", "B", "INPUT"),
            ]));
        });

        let jobs = get_jobs_common(
            &session_for(&server),
            &GetJobsOptions {
                status: Some("output".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].jobid, "JOB00001");
    }

    #[tokio::test]
    async fn test_get_job_requires_exactly_one_match() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs")
                .query_param("jobid", "JOB00001")
                .query_param("owner", "*");
            then.status(200).json_body(json!([
                job_json("JOB00001", "A", "OUTPUT"),
                job_json("JOB00001", "B", "OUTPUT"),
            ]));
        });

        let err = get_job(&session_for(&server), "JOB00001").await.unwrap_err();
        assert!(err.to_string().contains("expected 1 job"));
    }

    #[tokio::test]
    async fn test_get_spool_content_by_id_returns_text() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/MYJOB1/JOB00001/files/2/records");
            then.status(200).body("HELLO FROM SYSOUT");
        });

        let content = get_spool_content_by_id(&session_for(&server), "MYJOB1", "JOB00001", 2)
            .await
            .unwrap();
        mock.assert();
        assert_eq!(content, "HELLO FROM SYSOUT");
    }

    #[tokio::test]
    async fn test_get_jcl_targets_the_jcl_pseudo_file() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/MYJOB1/JOB00001/files/JCL/records");
            then.status(200).body("//MYJOB1 JOB\n//STEP1 EXEC PGM=IEFBR14\n");
        });

        let jcl = get_jcl(&session_for(&server), "MYJOB1", "JOB00001")
            .await
            .unwrap();
        mock.assert();
        assert!(jcl.contains("IEFBR14"));
    }
}
