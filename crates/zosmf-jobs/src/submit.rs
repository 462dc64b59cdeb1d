//! Submit JCL and optionally wait for the job to run.
//!
//! `PUT /zosmf/restjobs/jobs` accepts either a JSON reference to JCL
//! already on the host (`{"file": "//'DSN'"}` or a USS path) or inline
//! JCL text routed through the internal reader. JCL symbols ride along
//! as one `X-IBM-JCL-Symbol-<NAME>` header per symbol.

use crate::download::{self, DownloadSpoolOptions};
use crate::get;
use crate::monitor::{self, MonitorOptions, DEFAULT_WATCH_DELAY};
use crate::types::{JclSource, Job, JobStatus, SpoolFile};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zosmf_sdk::{headers, Result, ZosmfError, ZosmfSession};

const MAX_SYMBOL_NAME_LEN: usize = 8;
const DEFAULT_INTRDR_LRECL: &str = "80";
const DEFAULT_INTRDR_RECFM: &str = "F";

/// Options accepted by every submit entry point. The wait and spool
/// fields only take effect through [`submit_common`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitOptions {
    /// JCL symbol definitions, `NAME=value` pairs separated by blanks.
    /// Single-quoted values may contain blanks; `''` escapes a quote.
    pub jcl_symbols: Option<String>,
    /// Internal reader record length for inline JCL, default 80.
    pub internal_reader_lrecl: Option<String>,
    /// Internal reader record format for inline JCL, `F` or `V`,
    /// default `F`.
    pub internal_reader_recfm: Option<String>,
    /// Wait until the job is ACTIVE before returning.
    pub wait_for_active: bool,
    /// Wait until the job is OUTPUT before returning.
    pub wait_for_output: bool,
    /// Wait for OUTPUT, then collect every spool file's content into
    /// the outcome.
    pub view_all_spool_content: bool,
    /// Wait for OUTPUT, then download all spool content under this
    /// directory.
    pub spool_download_dir: Option<PathBuf>,
    /// File extension for downloaded spool files.
    pub spool_extension: Option<String>,
    /// Status poll interval for the wait options.
    pub watch_delay: Option<Duration>,
}

/// What a submit produced: the last observed job document and, when
/// spool collection was requested, the spool content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub job: Job,
    pub spool: Option<Vec<SpoolFile>>,
}

/// Submit JCL held in a cataloged data set or member.
pub async fn submit_job(session: &ZosmfSession, job_data_set: &str) -> Result<Job> {
    submit_source(
        session,
        &JclSource::Dataset(job_data_set.to_string()),
        &SubmitOptions::default(),
    )
    .await
}

/// Submit JCL held in a USS file.
pub async fn submit_uss_file(session: &ZosmfSession, uss_file: &str) -> Result<Job> {
    submit_source(
        session,
        &JclSource::UssFile(uss_file.to_string()),
        &SubmitOptions::default(),
    )
    .await
}

/// Submit inline JCL text.
pub async fn submit_jcl(session: &ZosmfSession, jcl: &str, options: &SubmitOptions) -> Result<Job> {
    submit_source(session, &JclSource::Jcl(jcl.to_string()), options).await
}

/// Read a local file and submit its content as inline JCL.
pub async fn submit_local_file(
    session: &ZosmfSession,
    local_file: &Path,
    options: &SubmitOptions,
) -> Result<Job> {
    submit_source(session, &JclSource::LocalFile(local_file.to_path_buf()), options).await
}

/// Submit from any source, then apply the wait and spool options.
/// This is the one place the source kind is matched.
pub async fn submit_common(
    session: &ZosmfSession,
    source: &JclSource,
    options: &SubmitOptions,
) -> Result<SubmitOutcome> {
    let job = submit_source(session, source, options).await?;
    tracing::info!(jobname = %job.jobname, jobid = %job.jobid, "job submitted");

    let delay = options.watch_delay.unwrap_or(DEFAULT_WATCH_DELAY);
    if options.wait_for_active {
        let job = monitor::wait_for_status(
            session,
            &job.jobname,
            &job.jobid,
            &MonitorOptions {
                status: JobStatus::Active,
                watch_delay: delay,
                ..Default::default()
            },
        )
        .await?;
        return Ok(SubmitOutcome { job, spool: None });
    }

    if options.view_all_spool_content || options.wait_for_output {
        let job = wait_for_output(session, &job, delay).await?;
        if !options.view_all_spool_content {
            return Ok(SubmitOutcome { job, spool: None });
        }
        let files = get::get_spool_files_for_job(session, &job).await?;
        let mut spool = Vec::with_capacity(files.len());
        for file in files {
            let data = get::get_spool_content(session, &file).await?;
            spool.push(SpoolFile {
                id: file.id,
                ddname: file.ddname,
                stepname: file.stepname,
                procstep: file.procstep,
                data,
            });
        }
        return Ok(SubmitOutcome {
            job,
            spool: Some(spool),
        });
    }

    if let Some(directory) = &options.spool_download_dir {
        let job = wait_for_output(session, &job, delay).await?;
        download::download_all_spool_content(
            session,
            &job.jobname,
            &job.jobid,
            &DownloadSpoolOptions {
                out_dir: Some(directory.clone()),
                extension: options.spool_extension.clone(),
                ..Default::default()
            },
        )
        .await?;
        return Ok(SubmitOutcome { job, spool: None });
    }

    Ok(SubmitOutcome { job, spool: None })
}

async fn wait_for_output(session: &ZosmfSession, job: &Job, delay: Duration) -> Result<Job> {
    monitor::wait_for_status(
        session,
        &job.jobname,
        &job.jobid,
        &MonitorOptions {
            watch_delay: delay,
            ..Default::default()
        },
    )
    .await
}

async fn submit_source(
    session: &ZosmfSession,
    source: &JclSource,
    options: &SubmitOptions,
) -> Result<Job> {
    let symbol_headers = match &options.jcl_symbols {
        Some(symbols) => jcl_symbol_headers(symbols)?,
        None => Vec::new(),
    };
    let mut builder = match source {
        JclSource::Dataset(data_set) => {
            if data_set.trim().is_empty() {
                return Err(ZosmfError::validation("data set containing JCL is required"));
            }
            tracing::debug!(%data_set, "submitting JCL from data set");
            session
                .request(Method::PUT, get::RESOURCE)?
                .json(&serde_json::json!({ "file": format!("//'{data_set}'") }))
        }
        JclSource::UssFile(uss_file) => {
            if uss_file.trim().is_empty() {
                return Err(ZosmfError::validation("USS file containing JCL is required"));
            }
            tracing::debug!(%uss_file, "submitting JCL from USS file");
            session
                .request(Method::PUT, get::RESOURCE)?
                .json(&serde_json::json!({ "file": uss_file }))
        }
        JclSource::LocalFile(local_file) => {
            let jcl = std::fs::read_to_string(local_file).map_err(|err| {
                ZosmfError::io(format!("could not read {}", local_file.display()), err)
            })?;
            inline_jcl_request(session, &jcl, options)?
        }
        JclSource::Jcl(jcl) => inline_jcl_request(session, jcl, options)?,
    };
    for (name, value) in symbol_headers {
        builder = builder.header(name, value);
    }
    session.send_json(builder).await
}

fn inline_jcl_request(
    session: &ZosmfSession,
    jcl: &str,
    options: &SubmitOptions,
) -> Result<reqwest::RequestBuilder> {
    if jcl.trim().is_empty() {
        return Err(ZosmfError::validation("JCL text is required"));
    }
    tracing::debug!(bytes = jcl.len(), "submitting inline JCL");
    Ok(session
        .request(Method::PUT, get::RESOURCE)?
        .header(CONTENT_TYPE, "text/plain; charset=UTF-8")
        .header(headers::X_IBM_INTRDR_MODE, "TEXT")
        .header(
            headers::X_IBM_INTRDR_LRECL,
            options
                .internal_reader_lrecl
                .as_deref()
                .unwrap_or(DEFAULT_INTRDR_LRECL),
        )
        .header(
            headers::X_IBM_INTRDR_RECFM,
            options
                .internal_reader_recfm
                .as_deref()
                .unwrap_or(DEFAULT_INTRDR_RECFM),
        )
        .body(jcl.to_string()))
}

/// Parse `NAME=value` symbol definitions into substitution headers.
/// Values delimited by blanks, or by single quotes when they contain
/// blanks; `''` inside a quoted value stands for one quote.
pub(crate) fn jcl_symbol_headers(symbols: &str) -> Result<Vec<(String, String)>> {
    let chars: Vec<char> = symbols.chars().collect();
    let mut parsed = Vec::new();
    let mut cursor = 0usize;

    while cursor < chars.len() {
        while cursor < chars.len() && chars[cursor] == ' ' {
            cursor += 1;
        }
        if cursor >= chars.len() {
            break;
        }

        let name_start = cursor;
        while cursor < chars.len() && chars[cursor] != '=' {
            cursor += 1;
        }
        if cursor >= chars.len() {
            return Err(ZosmfError::validation(
                "no equals '=' character was specified to define a symbol name",
            ));
        }
        let name: String = chars[name_start..cursor].iter().collect();
        if name.is_empty() {
            return Err(ZosmfError::validation(
                "no symbol name specified before the equals '=' character",
            ));
        }
        if name.len() > MAX_SYMBOL_NAME_LEN {
            return Err(ZosmfError::validation(format!(
                "the symbol name '{name}' is too long, it must be 1 to {MAX_SYMBOL_NAME_LEN} characters"
            )));
        }

        let mut value_start = cursor + 1;
        if value_start >= chars.len() {
            return Err(ZosmfError::validation(format!(
                "no value specified for symbol name '{name}'"
            )));
        }

        // A leading quote opens a quoted value unless it is itself an
        // escaped quote, in which case the value is blank-delimited and
        // starts at the first quote.
        let mut delimiter = ' ';
        if chars[value_start] == '\'' {
            value_start += 1;
            if value_start >= chars.len() {
                return Err(missing_quote(&name));
            }
            if chars[value_start] == '\'' {
                value_start -= 1;
            } else {
                delimiter = '\'';
            }
        }

        let mut value_end = value_start;
        let mut delimited = false;
        while value_end < chars.len() {
            if chars[value_end] == delimiter {
                if delimiter == '\''
                    && value_end + 1 < chars.len()
                    && chars[value_end + 1] == '\''
                {
                    value_end += 2;
                    continue;
                }
                delimited = true;
                break;
            }
            value_end += 1;
        }
        if !delimited {
            if delimiter == '\'' {
                return Err(missing_quote(&name));
            }
            value_end = chars.len();
        }

        let value: String = chars[value_start..value_end].iter().collect();
        parsed.push((
            format!("{}{}", headers::X_IBM_JCL_SYMBOL_PREFIX, name.to_uppercase()),
            value.replace("''", "'"),
        ));
        cursor = value_end + 1;
    }

    Ok(parsed)
}

fn missing_quote(name: &str) -> ZosmfError {
    ZosmfError::validation(format!(
        "the value for symbol '{name}' is missing a terminating quote (')"
    ))
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

    fn submitted_job() -> serde_json::Value {
        json!({
            "jobid": "JOB00023",
            "jobname": "IEFBR14A",
            "owner": "IBMUSER",
            "status": "INPUT",
            "type": "JOB",
            "class": "A",
            "url": "https://host/zosmf/restjobs/jobs/JOB00023",
            "files-url": "https://host/zosmf/restjobs/jobs/JOB00023/files"
        })
    }

    #[test]
    fn test_symbols_blank_delimited_pairs() {
        let headers = jcl_symbol_headers("dept=a41 team='our team'").unwrap();
        assert_eq!(
            headers,
            vec![
                ("X-IBM-JCL-Symbol-DEPT".to_string(), "a41".to_string()),
                ("X-IBM-JCL-Symbol-TEAM".to_string(), "our team".to_string()),
            ]
        );
    }

    #[test]
    fn test_symbols_doubled_quote_collapses() {
        let headers = jcl_symbol_headers("msg='it''s done'").unwrap();
        assert_eq!(headers[0].1, "it's done");
    }

    #[test]
    fn test_symbols_unterminated_quote_rejected() {
        let err = jcl_symbol_headers("msg='oops").unwrap_err();
        assert!(err.to_string().contains("terminating quote"));
    }

    #[test]
    fn test_symbols_name_too_long_rejected() {
        let err = jcl_symbol_headers("overlong1=x").unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_symbols_missing_equals_rejected() {
        let err = jcl_symbol_headers("dept").unwrap_err();
        assert!(err.to_string().contains("equals"));
    }

    #[tokio::test]
    async fn test_submit_job_wraps_data_set_reference() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restjobs/jobs")
                .json_body(json!({"file": "//'IBMUSER.CNTL(IEFBR14)'"}));
            then.status(201).json_body(submitted_job());
        });

        let job = submit_job(&session_for(&server), "IBMUSER.CNTL(IEFBR14)")
            .await
            .unwrap();
        mock.assert();
        assert_eq!(job.jobid, "JOB00023");
    }

    #[tokio::test]
    async fn test_submit_jcl_sets_internal_reader_headers() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restjobs/jobs")
                .header("content-type", "text/plain; charset=UTF-8")
                .header(headers::X_IBM_INTRDR_MODE, "TEXT")
                .header(headers::X_IBM_INTRDR_LRECL, "80")
                .header(headers::X_IBM_INTRDR_RECFM, "F")
                .body_includes("IEFBR14");
            then.status(201).json_body(submitted_job());
        });

        submit_jcl(
            &session_for(&server),
            "//IEFBR14A JOB\n//STEP1 EXEC PGM=IEFBR14\n",
            &SubmitOptions::default(),
        )
        .await
        .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_submit_jcl_carries_symbol_headers() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restjobs/jobs")
                .header("X-IBM-JCL-Symbol-DSN", "IBMUSER.WORK");
            then.status(201).json_body(submitted_job());
        });

        submit_jcl(
            &session_for(&server),
            "//COPY JOB\n",
            &SubmitOptions {
                jcl_symbols: Some("dsn=IBMUSER.WORK".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_submit_local_file_reads_and_submits_text() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/zosmf/restjobs/jobs")
                .header(headers::X_IBM_INTRDR_MODE, "TEXT")
                .body_includes("PGM=IEFBR14");
            then.status(201).json_body(submitted_job());
        });

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("job.jcl");
        std::fs::write(&file, "//MYJOB JOB\n//S1 EXEC PGM=IEFBR14\n").unwrap();
        submit_local_file(&session_for(&server), &file, &SubmitOptions::default())
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_submit_common_collects_spool_after_output() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(PUT).path("/zosmf/restjobs/jobs");
            then.status(201).json_body(submitted_job());
        });
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restjobs/jobs/IEFBR14A/JOB00023");
            then.status(200).json_body(json!({
                "jobid": "JOB00023",
                "jobname": "IEFBR14A",
                "owner": "IBMUSER",
                "status": "OUTPUT",
                "retcode": "CC 0000",
                "type": "JOB",
                "class": "A",
                "url": "https://host/zosmf/restjobs/jobs/JOB00023",
                "files-url": "https://host/zosmf/restjobs/jobs/JOB00023/files"
            }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/IEFBR14A/JOB00023/files");
            then.status(200).json_body(json!([{
                "jobid": "JOB00023",
                "jobname": "IEFBR14A",
                "id": 2,
                "recfm": "UA",
                "lrecl": 133,
                "byte-count": 17,
                "record-count": 1,
                "class": "K",
                "ddname": "JESMSGLG",
                "records-url": "https://host/zosmf/restjobs/jobs/JOB00023/files/2/records",
                "stepname": "JES2"
            }]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/IEFBR14A/JOB00023/files/2/records");
            then.status(200).body("HELLO FROM SYSOUT");
        });

        let outcome = submit_common(
            &session_for(&server),
            &JclSource::Dataset("IBMUSER.CNTL(IEFBR14)".to_string()),
            &SubmitOptions {
                view_all_spool_content: true,
                watch_delay: Some(Duration::from_millis(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.job.retcode.as_deref(), Some("CC 0000"));
        let spool = outcome.spool.unwrap();
        assert_eq!(spool.len(), 1);
        assert_eq!(spool[0].ddname, "JESMSGLG");
        assert_eq!(spool[0].data, "HELLO FROM SYSOUT");
    }
}
