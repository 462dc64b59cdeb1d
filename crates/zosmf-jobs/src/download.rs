//! Download spool output to local files.
//!
//! Content comes from `GET .../files/<id>/records`, optionally with
//! `?mode=binary`, `?mode=record`, or `?fileEncoding=<codepage>`, and
//! an `X-IBM-Record-Range: x-y` header for a record subrange.
//!
//! Local layout is `<out dir>/<jobid>/<procstep>/<stepname>/<ddname><ext>`
//! with the jobid level optional and the step levels present only when
//! the spool file reports them.

use crate::get;
use crate::types::JobFile;
use reqwest::Method;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use zosmf_sdk::{encode_uri_component, headers, Result, ZosmfError, ZosmfSession};

/// Directory spool files land in when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "./output";
/// Extension given to downloaded spool files when none is configured.
pub const DEFAULT_SPOOL_EXTENSION: &str = ".txt";

/// Options for spool downloads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSpoolOptions {
    /// Local directory to download into, default `./output`.
    pub out_dir: Option<PathBuf>,
    /// Skip the per-jobid directory level.
    pub omit_jobid_directory: bool,
    /// Extension for the downloaded files, default `.txt`.
    pub extension: Option<String>,
    /// Transfer the content as raw bytes.
    pub binary: bool,
    /// Transfer the content in record mode.
    pub record: bool,
    /// Remote codepage for text transfers.
    pub encoding: Option<String>,
    /// Record subrange to fetch, formatted `x-y`.
    pub record_range: Option<String>,
}

/// Local path a spool file downloads to under the given options.
pub fn spool_download_path(file: &JobFile, options: &DownloadSpoolOptions) -> PathBuf {
    let mut path = options
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    if !options.omit_jobid_directory {
        path.push(&file.jobid);
    }
    if let Some(procstep) = &file.procstep {
        path.push(procstep);
    }
    if let Some(stepname) = &file.stepname {
        path.push(stepname);
    }
    let extension = match &options.extension {
        Some(extension) if extension.starts_with('.') => extension.clone(),
        Some(extension) => format!(".{extension}"),
        None => DEFAULT_SPOOL_EXTENSION.to_string(),
    };
    path.push(format!("{}{extension}", file.ddname));
    path
}

pub(crate) fn parse_record_range(range: &str) -> Result<(u64, u64)> {
    let parsed = range.split_once('-').and_then(|(start, end)| {
        let start = start.trim().parse::<u64>().ok()?;
        let end = end.trim().parse::<u64>().ok()?;
        Some((start, end))
    });
    match parsed {
        None => Err(ZosmfError::validation(format!(
            "invalid record range format: {range}, expected format is x-y"
        ))),
        Some((start, end)) if end <= start => Err(ZosmfError::validation(format!(
            "invalid record range specified: {range}, ensure the format is x-y with x < y"
        ))),
        Some(span) => Ok(span),
    }
}

/// Download one spool file, returning the path it was written to.
pub async fn download_spool_content(
    session: &ZosmfSession,
    file: &JobFile,
    options: &DownloadSpoolOptions,
) -> Result<PathBuf> {
    let mut resource = format!(
        "{}/{}/{}/files/{}/records",
        get::RESOURCE,
        encode_uri_component(&file.jobname),
        encode_uri_component(&file.jobid),
        file.id
    );
    if options.binary {
        resource.push_str("?mode=binary");
    } else if options.record {
        resource.push_str("?mode=record");
    } else if let Some(encoding) = options.encoding.as_deref().filter(|enc| !enc.trim().is_empty()) {
        resource.push_str(&format!("?fileEncoding={}", encode_uri_component(encoding)));
    }

    let mut builder = session.request(Method::GET, &resource)?;
    if let Some(range) = &options.record_range {
        let (start, end) = parse_record_range(range)?;
        builder = builder.header(headers::X_IBM_RECORD_RANGE, format!("{start}-{end}"));
    }

    let destination = spool_download_path(file, options);
    tracing::debug!(
        ddname = %file.ddname,
        jobid = %file.jobid,
        destination = %destination.display(),
        "downloading spool file"
    );
    let response = session.send(builder).await?;
    let content = response
        .bytes()
        .await
        .map_err(|source| ZosmfError::Transport { source })?;
    if let Some(parent) = destination.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            ZosmfError::io(format!("could not create {}", parent.display()), err)
        })?;
    }
    write_all(&destination, &content)?;
    Ok(destination)
}

fn write_all(destination: &Path, content: &[u8]) -> Result<()> {
    if let Err(err) = std::fs::write(destination, content) {
        // Do not leave a truncated file behind.
        let _ = std::fs::remove_file(destination);
        return Err(ZosmfError::io(
            format!("could not write {}", destination.display()),
            err,
        ));
    }
    Ok(())
}

/// Download every spool file of a job, returning the paths written.
/// A ddname that repeats within a step gets a `(1)`, `(2)` suffix so
/// no file overwrites another.
pub async fn download_all_spool_content(
    session: &ZosmfSession,
    jobname: &str,
    jobid: &str,
    options: &DownloadSpoolOptions,
) -> Result<Vec<PathBuf>> {
    if jobname.trim().is_empty() || jobid.trim().is_empty() {
        return Err(ZosmfError::validation("jobname and jobid are required"));
    }
    let files = get::get_spool_files(session, jobname, jobid).await?;
    tracing::info!(%jobname, %jobid, files = files.len(), "downloading all spool content");

    let mut used_per_step: HashMap<String, Vec<String>> = HashMap::new();
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let step_key = file.stepname.clone().unwrap_or_default();
        let mut unique_ddname = file.ddname.clone();
        if let Some(taken) = used_per_step.get(&step_key) {
            let mut index = 1;
            while taken.contains(&unique_ddname) {
                unique_ddname = format!("{}({index})", file.ddname);
                index += 1;
            }
        }
        let renamed = JobFile {
            ddname: unique_ddname.clone(),
            ..file
        };
        written.push(download_spool_content(session, &renamed, options).await?);
        used_per_step.entry(step_key).or_default().push(unique_ddname);
    }
    Ok(written)
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

    fn spool_file(id: i64, ddname: &str, stepname: Option<&str>, procstep: Option<&str>) -> JobFile {
        JobFile {
            jobid: "JOB00001".to_string(),
            jobname: "MYJOB1".to_string(),
            id,
            recfm: "FB".to_string(),
            lrecl: 80,
            byte_count: 20,
            record_count: 1,
            class: "A".to_string(),
            ddname: ddname.to_string(),
            records_url: String::new(),
            stepname: stepname.map(str::to_string),
            procstep: procstep.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_spool_path_includes_jobid_and_steps() {
        let file = spool_file(4, "SYSPRINT", Some("STEP1"), Some("PROC1"));
        let path = spool_download_path(&file, &DownloadSpoolOptions::default());
        assert_eq!(
            path,
            PathBuf::from("./output/JOB00001/PROC1/STEP1/SYSPRINT.txt")
        );
    }

    #[test]
    fn test_spool_path_omits_jobid_and_normalizes_extension() {
        let file = spool_file(4, "SYSPRINT", None, None);
        let path = spool_download_path(
            &file,
            &DownloadSpoolOptions {
                out_dir: Some(PathBuf::from("/tmp/spool")),
                omit_jobid_directory: true,
                extension: Some("log".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(path, PathBuf::from("/tmp/spool/SYSPRINT.log"));
    }

    #[test]
    fn test_record_range_validation() {
        assert_eq!(parse_record_range("0-10").unwrap(), (0, 10));
        assert!(parse_record_range("10-5")
            .unwrap_err()
            .to_string()
            .contains("x < y"));
        assert!(parse_record_range("two-ten")
            .unwrap_err()
            .to_string()
            .contains("expected format"));
    }

    #[tokio::test]
    async fn test_download_spool_content_writes_file() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/MYJOB1/JOB00001/files/4/records");
            then.status(200).body("ALLOCATION MESSAGES");
        });

        let dir = tempfile::tempdir().unwrap();
        let destination = download_spool_content(
            &session_for(&server),
            &spool_file(4, "SYSPRINT", Some("STEP1"), None),
            &DownloadSpoolOptions {
                out_dir: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(
            destination,
            dir.path().join("JOB00001/STEP1/SYSPRINT.txt")
        );
        assert_eq!(
            std::fs::read_to_string(destination).unwrap(),
            "ALLOCATION MESSAGES"
        );
    }

    #[tokio::test]
    async fn test_download_spool_content_binary_mode_and_range() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/MYJOB1/JOB00001/files/4/records")
                .query_param("mode", "binary")
                .header(headers::X_IBM_RECORD_RANGE, "0-50");
            then.status(200).body(&[0u8, 1, 2][..]);
        });

        let dir = tempfile::tempdir().unwrap();
        download_spool_content(
            &session_for(&server),
            &spool_file(4, "SYSUT2", None, None),
            &DownloadSpoolOptions {
                out_dir: Some(dir.path().to_path_buf()),
                binary: true,
                record_range: Some("0-50".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_download_all_suffixes_duplicate_ddnames() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/MYJOB1/JOB00001/files");
            then.status(200).json_body(json!([
                {
                    "jobid": "JOB00001", "jobname": "MYJOB1", "id": 1,
                    "recfm": "FB", "lrecl": 80, "byte-count": 5, "record-count": 1,
                    "class": "A", "ddname": "SYSPRINT", "records-url": "",
                    "stepname": "STEP1"
                },
                {
                    "jobid": "JOB00001", "jobname": "MYJOB1", "id": 2,
                    "recfm": "FB", "lrecl": 80, "byte-count": 5, "record-count": 1,
                    "class": "A", "ddname": "SYSPRINT", "records-url": "",
                    "stepname": "STEP1"
                }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/MYJOB1/JOB00001/files/1/records");
            then.status(200).body("first");
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restjobs/jobs/MYJOB1/JOB00001/files/2/records");
            then.status(200).body("second");
        });

        let dir = tempfile::tempdir().unwrap();
        let written = download_all_spool_content(
            &session_for(&server),
            "MYJOB1",
            "JOB00001",
            &DownloadSpoolOptions {
                out_dir: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("JOB00001/STEP1/SYSPRINT.txt"));
        assert!(written[1].ends_with("JOB00001/STEP1/SYSPRINT(1).txt"));
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "second");
    }
}
