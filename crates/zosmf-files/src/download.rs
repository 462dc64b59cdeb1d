//! Clients for downloading data set and USS content to local files.
//!
//! * `GET /zosmf/restfiles/ds[/-(vol)]/<dsn>` retrieves data set or
//!   member content
//! * `GET /zosmf/restfiles/fs/<path>` retrieves USS file content
//!
//! Member downloads of a whole PDS run through a bounded pool of
//! concurrent requests.

use crate::list::{list_all_members, ListOptions};
use crate::util::{
    data_type_headers, dataset_resource, dirs_from_data_set, normalize_extension, uss_resource,
    DEFAULT_FILE_EXTENSION,
};
use reqwest::header::{CONTENT_TYPE, ETAG};
use reqwest::Method;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use zosmf_sdk::{headers, Result, ZosmfError, ZosmfSession};

/// Options for a single data set or USS file download.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadOptions {
    /// Local destination; derived from the remote name when unset.
    pub file: Option<PathBuf>,
    /// Extension for derived destinations, `txt` when unset.
    pub extension: Option<String>,
    pub binary: bool,
    pub record: bool,
    /// Remote codepage for text transfers, sent as
    /// `X-IBM-Data-Type: text;fileEncoding=<encoding>`.
    pub encoding: Option<String>,
    /// Content type announced for text transfers, `text/plain` when unset.
    pub local_encoding: Option<String>,
    pub volume: Option<String>,
    /// Keep the remote name's uppercase in derived destinations.
    pub preserve_original_letter_case: bool,
    /// Ask for and capture the content Etag.
    pub return_etag: bool,
    pub response_timeout: Option<u32>,
}

/// Where a download landed and the Etag it carried, if one was requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadedFile {
    pub destination: PathBuf,
    pub etag: Option<String>,
}

fn derived_data_set_destination(data_set_name: &str, options: &DownloadOptions) -> PathBuf {
    let mut local = dirs_from_data_set(data_set_name);
    if options.preserve_original_letter_case {
        local = local.to_uppercase();
    }
    let extension = normalize_extension(options.extension.as_deref().unwrap_or(DEFAULT_FILE_EXTENSION));
    PathBuf::from(format!("{local}{extension}"))
}

async fn transfer_to_file(
    session: &ZosmfSession,
    resource: &str,
    destination: PathBuf,
    options: &DownloadOptions,
) -> Result<DownloadedFile> {
    let mut builder = session.request(Method::GET, resource)?;
    for (name, value) in data_type_headers(options.binary, options.record, options.encoding.as_deref()) {
        builder = builder.header(name, value);
    }
    if !options.binary && !options.record {
        builder = builder.header(
            CONTENT_TYPE,
            options.local_encoding.as_deref().unwrap_or("text/plain"),
        );
    }
    if options.return_etag {
        builder = builder.header(headers::X_IBM_RETURN_ETAG, "true");
    }
    if let Some(timeout) = options.response_timeout {
        builder = builder.header(headers::X_IBM_RESPONSE_TIMEOUT, timeout.to_string());
    }

    let response = session.send(builder).await?;
    let etag = if options.return_etag {
        response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    } else {
        None
    };
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ZosmfError::Transport { source })?;

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| {
                ZosmfError::io(format!("could not create {}", parent.display()), err)
            })?;
        }
    }
    if let Err(err) = std::fs::write(&destination, &bytes) {
        // Do not leave a truncated file behind.
        let _ = std::fs::remove_file(&destination);
        return Err(ZosmfError::io(
            format!("could not write {}", destination.display()),
            err,
        ));
    }
    tracing::debug!(%resource, destination = %destination.display(), bytes = bytes.len(), "downloaded");
    Ok(DownloadedFile { destination, etag })
}

/// Download a data set or member. The destination defaults to the
/// lowercased data set name with dots as directory separators, the
/// member as the file name, and a `txt` extension.
pub async fn download_data_set(
    session: &ZosmfSession,
    data_set_name: &str,
    options: &DownloadOptions,
) -> Result<DownloadedFile> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let resource = dataset_resource(data_set_name, options.volume.as_deref());
    let destination = match &options.file {
        Some(file) => file.clone(),
        None => derived_data_set_destination(data_set_name, options),
    };
    transfer_to_file(session, &resource, destination, options).await
}

/// Options for downloading every member of a PDS.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadAllMembersOptions {
    /// Local directory; derived from the data set name when unset.
    pub directory: Option<PathBuf>,
    pub extension: Option<String>,
    pub binary: bool,
    pub record: bool,
    pub encoding: Option<String>,
    pub local_encoding: Option<String>,
    pub volume: Option<String>,
    pub preserve_original_letter_case: bool,
    /// Stop on the first failed member instead of finishing the rest.
    /// Defaults to true.
    pub fail_fast: Option<bool>,
    /// Concurrent member downloads; 1 when unset, 0 means unbounded.
    pub max_concurrent_requests: Option<usize>,
    pub response_timeout: Option<u32>,
}

/// Outcome of a whole-PDS download. `downloaded` is empty when the data
/// set has no members, which is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllMembersDownload {
    pub destination: PathBuf,
    pub downloaded: Vec<String>,
}

/// Download every member of a partitioned data set into a directory,
/// one file per member.
pub async fn download_all_members(
    session: &ZosmfSession,
    data_set_name: &str,
    options: &DownloadAllMembersOptions,
) -> Result<AllMembersDownload> {
    if data_set_name.trim().is_empty() {
        return Err(ZosmfError::validation("data set name is required"));
    }
    let list = list_all_members(session, data_set_name, &ListOptions::default()).await?;
    let directory = options
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from(dirs_from_data_set(data_set_name)));
    if list.items.is_empty() {
        tracing::info!(data_set = %data_set_name, "data set has no members");
        return Ok(AllMembersDownload {
            destination: directory,
            downloaded: Vec::new(),
        });
    }

    let total = list.items.len();
    let fail_fast = options.fail_fast.unwrap_or(true);
    let permits = match options.max_concurrent_requests.unwrap_or(1) {
        0 => Semaphore::MAX_PERMITS,
        bounded => bounded,
    };
    let semaphore = Arc::new(Semaphore::new(permits));
    let extension = normalize_extension(options.extension.as_deref().unwrap_or(DEFAULT_FILE_EXTENSION));

    let mut tasks: JoinSet<std::result::Result<String, (String, ZosmfError)>> = JoinSet::new();
    for entry in &list.items {
        let member = entry.member.clone();
        let member_path = format!("{data_set_name}({member})");
        let file_name = if options.preserve_original_letter_case {
            member.clone()
        } else {
            member.to_lowercase()
        };
        let per_member = DownloadOptions {
            file: Some(directory.join(format!("{file_name}{extension}"))),
            binary: options.binary,
            record: options.record,
            encoding: options.encoding.clone(),
            local_encoding: options.local_encoding.clone(),
            volume: options.volume.clone(),
            response_timeout: options.response_timeout,
            ..DownloadOptions::default()
        };
        let session = session.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return Err((
                        member,
                        ZosmfError::invalid_response("download pool closed unexpectedly"),
                    ))
                }
            };
            match download_data_set(&session, &member_path, &per_member).await {
                Ok(_) => Ok(member),
                Err(err) => Err((member, err)),
            }
        });
    }

    let mut downloaded = Vec::new();
    let mut failures: Vec<(String, ZosmfError)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(member)) => downloaded.push(member),
            Ok(Err(failure)) => {
                failures.push(failure);
                if fail_fast {
                    tasks.abort_all();
                }
            }
            Err(join_err) if join_err.is_cancelled() => {}
            Err(join_err) => {
                failures.push((
                    "unknown member".to_string(),
                    ZosmfError::invalid_response(format!("download task failed: {join_err}")),
                ));
            }
        }
    }

    if !failures.is_empty() {
        let detail: Vec<String> = failures
            .iter()
            .map(|(member, err)| format!("{member}: {err}"))
            .collect();
        return Err(ZosmfError::transfer(format!(
            "failed to download {} of {total} members from {data_set_name}: {}",
            failures.len(),
            detail.join("; ")
        )));
    }
    downloaded.sort();
    tracing::info!(data_set = %data_set_name, members = downloaded.len(), "all members downloaded");
    Ok(AllMembersDownload {
        destination: directory,
        downloaded,
    })
}

/// Download a USS file. The destination defaults to the file's base
/// name. Record mode does not apply to USS content.
pub async fn download_uss_file(
    session: &ZosmfSession,
    uss_path: &str,
    options: &DownloadOptions,
) -> Result<DownloadedFile> {
    if uss_path.trim().is_empty() {
        return Err(ZosmfError::validation("USS path is required"));
    }
    if options.record {
        return Err(ZosmfError::validation(
            "record transfers are not supported for USS files",
        ));
    }
    let destination = match &options.file {
        Some(file) => file.clone(),
        None => Path::new(uss_path)
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| {
                ZosmfError::validation(format!("cannot derive a file name from '{uss_path}'"))
            })?,
    };
    let resource = uss_resource(uss_path);
    transfer_to_file(session, &resource, destination, options).await
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

    #[test]
    fn test_derived_destination_from_data_set_name() {
        assert_eq!(
            derived_data_set_destination("IBMUSER.PDS(MEM)", &DownloadOptions::default()),
            PathBuf::from("ibmuser/pds/mem.txt")
        );
        assert_eq!(
            derived_data_set_destination(
                "IBMUSER.SEQ",
                &DownloadOptions {
                    extension: Some("jcl".to_string()),
                    preserve_original_letter_case: true,
                    ..Default::default()
                }
            ),
            PathBuf::from("IBMUSER/SEQ.jcl")
        );
    }

    #[tokio::test]
    async fn test_download_data_set_text_with_etag() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restfiles/ds/IBMUSER.SEQ")
                .header(headers::X_IBM_RETURN_ETAG, "true")
                .header("content-type", "text/plain");
            then.status(200).header("Etag", "0F1E2D").body("HELLO\n");
        });

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("seq.txt");
        let result = download_data_set(
            &session_for(&server),
            "IBMUSER.SEQ",
            &DownloadOptions {
                file: Some(destination.clone()),
                return_etag: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(result.etag.as_deref(), Some("0F1E2D"));
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "HELLO\n");
    }

    #[tokio::test]
    async fn test_download_binary_sets_data_type_header() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restfiles/ds/-(VOL001)/IBMUSER.LOAD")
                .header(headers::X_IBM_DATA_TYPE, "binary");
            then.status(200).body(&[0u8, 1, 2, 3][..]);
        });

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("load.bin");
        download_data_set(
            &session_for(&server),
            "IBMUSER.LOAD",
            &DownloadOptions {
                file: Some(destination.clone()),
                binary: true,
                volume: Some("VOL001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(std::fs::read(&destination).unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_download_all_members_writes_one_file_each() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restfiles/ds/IBMUSER.PDS/member");
            then.status(200).json_body(json!({
                "items": [{"member": "ONE"}, {"member": "TWO"}],
                "returnedRows": 2,
                "JSONversion": 1
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restfiles/ds/IBMUSER.PDS(ONE)");
            then.status(200).body("first");
        });
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restfiles/ds/IBMUSER.PDS(TWO)");
            then.status(200).body("second");
        });

        let dir = tempfile::tempdir().unwrap();
        let result = download_all_members(
            &session_for(&server),
            "IBMUSER.PDS",
            &DownloadAllMembersOptions {
                directory: Some(dir.path().to_path_buf()),
                max_concurrent_requests: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(result.downloaded, vec!["ONE", "TWO"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("one.txt")).unwrap(),
            "first"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("two.txt")).unwrap(),
            "second"
        );
    }

    #[tokio::test]
    async fn test_download_all_members_with_no_members_is_not_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restfiles/ds/IBMUSER.EMPTY/member");
            then.status(200)
                .json_body(json!({"items": [], "returnedRows": 0, "JSONversion": 1}));
        });

        let dir = tempfile::tempdir().unwrap();
        let result = download_all_members(
            &session_for(&server),
            "IBMUSER.EMPTY",
            &DownloadAllMembersOptions {
                directory: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(result.downloaded.is_empty());
    }

    #[tokio::test]
    async fn test_download_all_members_aggregates_failures() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restfiles/ds/IBMUSER.PDS/member");
            then.status(200).json_body(json!({
                "items": [{"member": "GOOD"}, {"member": "BAD"}],
                "returnedRows": 2,
                "JSONversion": 1
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restfiles/ds/IBMUSER.PDS(GOOD)");
            then.status(200).body("fine");
        });
        server.mock(|when, then| {
            when.method(GET).path("/zosmf/restfiles/ds/IBMUSER.PDS(BAD)");
            then.status(500)
                .json_body(json!({"category": 4, "rc": 16, "reason": 0, "message": "member locked"}));
        });

        let dir = tempfile::tempdir().unwrap();
        let err = download_all_members(
            &session_for(&server),
            "IBMUSER.PDS",
            &DownloadAllMembersOptions {
                directory: Some(dir.path().to_path_buf()),
                fail_fast: Some(false),
                max_concurrent_requests: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("BAD"));
        assert!(message.contains("member locked"));
        assert!(!message.contains("GOOD:"));
    }

    #[tokio::test]
    async fn test_download_uss_file_rejects_record_mode() {
        let server = MockServer::start_async().await;
        let err = download_uss_file(
            &session_for(&server),
            "/u/ibmuser/file.txt",
            &DownloadOptions {
                record: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ZosmfError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_download_uss_file_with_encoding() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/zosmf/restfiles/fs/u%2Fibmuser%2Fnotes.txt")
                .header(headers::X_IBM_DATA_TYPE, "text;fileEncoding=IBM-1047");
            then.status(200).body("hi");
        });

        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("notes.txt");
        download_uss_file(
            &session_for(&server),
            "/u/ibmuser/notes.txt",
            &DownloadOptions {
                file: Some(destination.clone()),
                encoding: Some("IBM-1047".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        mock.assert();
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "hi");
    }
}
